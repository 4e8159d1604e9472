use eurlex_ingest::parser::dom::parse_document_tree;
use eurlex_ingest::{parse_document, ParseConfig};
use std::time::Instant;

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: bench_parser <html_file>");
    let html = std::fs::read_to_string(&path).expect("Failed to read HTML file");
    let config = ParseConfig::new("bench");

    let iterations = 5;

    // Baseline: DOM construction only
    let _ = parse_document_tree(&html);
    let mut baseline_durations = Vec::new();
    for i in 0..iterations {
        let start = Instant::now();
        let root = parse_document_tree(&html).expect("Failed to parse HTML");
        let elapsed = start.elapsed();
        baseline_durations.push(elapsed);
        println!(
            "Baseline {}: {:.3}s ({} top-level nodes)",
            i + 1,
            elapsed.as_secs_f64(),
            root.children.len(),
        );
    }
    let baseline_avg =
        baseline_durations.iter().map(|d| d.as_secs_f64()).sum::<f64>() / iterations as f64;
    println!("Baseline avg: {:.3}s\n", baseline_avg);

    let _ = parse_document(&html, &config);
    let mut durations = Vec::new();
    for i in 0..iterations {
        let start = Instant::now();
        let document = parse_document(&html, &config).expect("Failed to parse document");
        let elapsed = start.elapsed();
        durations.push(elapsed);
        println!(
            "Iteration {}: {:.3}s ({} articles, {} annexes)",
            i + 1,
            elapsed.as_secs_f64(),
            document.articles.len(),
            document.annexes.len(),
        );
    }

    let avg = durations.iter().map(|d| d.as_secs_f64()).sum::<f64>() / iterations as f64;
    let min = durations.iter().map(|d| d.as_secs_f64()).fold(f64::INFINITY, f64::min);
    println!("\nParser avg: {:.3}s, min: {:.3}s", avg, min);
    println!("Overhead vs DOM build: {:.1}x", avg / baseline_avg);
}
