pub mod growth;
pub mod report;
pub mod serve;

use clap::ValueEnum;

// Re-export command functions for convenience
pub use growth::growth;
pub use report::report;
pub use serve::serve;

/// Output format for report-style commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}
