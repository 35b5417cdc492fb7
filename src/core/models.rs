//! Output configuration shared by all writers.

use serde::{Deserialize, Serialize};

/// Configuration for output writers.
///
/// Controls optional columns and CSV dialect details.
///
/// # Example
///
/// ```rust
/// use kakaopack::core::models::OutputConfig;
///
/// let config = OutputConfig::new().with_length().with_bom();
/// assert!(config.include_length);
/// assert_eq!(config.delimiter, b',');
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Add a `length` column with the character count of each message
    pub include_length: bool,
    /// Prefix CSV output with a UTF-8 BOM so spreadsheet tools pick the right encoding
    pub write_bom: bool,
    /// CSV field delimiter (default: `,`)
    pub delimiter: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_length: false,
            write_bom: false,
            delimiter: b',',
        }
    }
}

impl OutputConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the `length` column.
    #[must_use]
    pub fn with_length(mut self) -> Self {
        self.include_length = true;
        self
    }

    /// Enables the UTF-8 BOM prefix for CSV output.
    #[must_use]
    pub fn with_bom(mut self) -> Self {
        self.write_bom = true;
        self
    }

    /// Sets the CSV delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
