use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static OPEN_PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\s*").unwrap());
static CLOSE_PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\)\s*").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}{2,}").unwrap());
static ROMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^M{0,3}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$").unwrap()
});

/// Normalizes extracted text: newlines become spaces, whitespace runs collapse,
/// non-breaking and zero-width spaces are cleaned up, `.`, `,`, `;`, `:` are
/// followed by a space, `(` is preceded and `)` followed by one.
pub fn normalize_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let text = input
        .replace('\n', " ")
        .replace('\u{00A0}', " ")
        .replace('\u{200B}', "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = space_after_punctuation(&text);
    let text = OPEN_PAREN_RE.replace_all(&text, " (");
    let text = CLOSE_PAREN_RE.replace_all(&text, ") ");
    text.trim().to_string()
}

fn space_after_punctuation(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        output.push(c);
        if matches!(c, '.' | ',' | ';' | ':')
            && chars.peek().is_some_and(|next| !next.is_whitespace())
        {
            output.push(' ');
        }
    }
    output
}

/// Words of two or more letters; markers, digits and punctuation are not counted.
pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

pub fn is_roman_numeral(value: &str) -> bool {
    !value.is_empty() && ROMAN_RE.is_match(value)
}

pub fn roman_to_int(value: &str) -> Option<u32> {
    if !is_roman_numeral(value) {
        return None;
    }
    let digits = value
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => 0,
        })
        .collect::<Vec<u32>>();

    let mut total = 0;
    for (index, digit) in digits.iter().enumerate() {
        match digits.get(index + 1) {
            Some(next) if next > digit => total -= *digit as i64,
            _ => total += *digit as i64,
        }
    }
    u32::try_from(total).ok().filter(|value| *value > 0)
}

pub fn int_to_roman(mut value: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut output = String::new();
    for &(amount, numeral) in TABLE {
        while value >= amount {
            output.push_str(numeral);
            value -= amount;
        }
    }
    output
}

/// Parses a designator that is either arabic ("4") or roman ("IV").
pub fn parse_designator_number(value: &str) -> Option<u32> {
    let value = value.trim().trim_end_matches('.');
    value.parse::<u32>().ok().or_else(|| roman_to_int(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_special_spaces() {
        assert_eq!(normalize_text("  a\n\n b\u{00A0}\u{00A0}c\u{200B}d  "), "a b cd");
    }

    #[test]
    fn spaces_punctuation_and_parentheses() {
        assert_eq!(normalize_text("one,two;three:four.five"), "one, two; three: four. five");
        assert_eq!(normalize_text("Article 6( 1 )of"), "Article 6 (1) of");
        assert_eq!(normalize_text("(a) the data"), "(a) the data");
    }

    #[test]
    fn splits_hierarchical_numbers() {
        assert_eq!(normalize_text("1.1. Nested clause"), "1. 1. Nested clause");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\u{00A0} "), "");
    }

    #[test]
    fn converts_roman_numerals() {
        assert_eq!(roman_to_int("IV"), Some(4));
        assert_eq!(roman_to_int("xi"), Some(11));
        assert_eq!(roman_to_int("IIII"), None);
        assert_eq!(roman_to_int(""), None);
        assert_eq!(int_to_roman(14), "XIV");
        assert_eq!(parse_designator_number("XI"), Some(11));
        assert_eq!(parse_designator_number("3"), Some(3));
    }

    #[test]
    fn counts_letter_words_only() {
        assert_eq!(word_count("1. (a) the controller — shall"), 3);
    }
}
