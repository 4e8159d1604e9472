pub mod config;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod runtime;
pub mod types;

pub use config::ParseConfig;
pub use error::ParseError;
pub use parser::parse_document;
