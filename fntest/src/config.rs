//! Verbosity levels and report configuration for the testers

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::FnTestError;

/// Amount of report output a tester streams out
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum Verbosity {
    /// Streams out nothing
    Silent = 0,
    /// Streams out standard info for each test
    #[default]
    Normal = 1,
    /// Streams out failure details and error cases as well
    Verbose = 2,
}

impl Verbosity {
    /// Whether a message of `message_level` passes this threshold
    pub fn allows(self, message_level: Verbosity) -> bool {
        self >= message_level
    }
}

/// Report settings shared by both testers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Parser)]
#[command(name = "fntest")]
#[command(about = "Function test report settings")]
pub struct ReportConfig {
    /// Verbosity threshold of the report stream
    #[arg(long, value_enum, default_value_t = Verbosity::Normal)]
    pub verbosity: Verbosity,

    /// Width used for label padding and progress dots (tester default if unset)
    #[arg(long)]
    pub output_line_length: Option<usize>,

    /// Style status tokens with ANSI colors
    #[arg(long)]
    #[serde(default)]
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { verbosity: Verbosity::Normal, output_line_length: None, color: false }
    }
}

impl ReportConfig {
    /// Create a configuration with the given verbosity and tester-default width
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity, ..Self::default() }
    }

    /// The configured line length, or `fallback` when none was given
    pub fn line_length_or(&self, fallback: usize) -> usize {
        self.output_line_length.unwrap_or(fallback)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), FnTestError> {
        if self.output_line_length == Some(0) {
            return Err(FnTestError::Config("Output line length must be greater than 0".to_string()));
        }

        Ok(())
    }
}
