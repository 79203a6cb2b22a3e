use std::env;
use std::path::PathBuf;

use crate::services::upload_service::{UploadMode, DEFAULT_BATCH_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub prices_table: String,
    pub rents_table: String,
    pub source_file: PathBuf,
    pub batch_size: usize,
    /// 0 disables test mode
    pub test_rows: usize,
}

// The key is a credential; keep it out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("prices_table", &self.prices_table)
            .field("rents_table", &self.rents_table)
            .field("source_file", &self.source_file)
            .field("batch_size", &self.batch_size)
            .field("test_rows", &self.test_rows)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
            prices_table: env::var("PRICES_TABLE")
                .unwrap_or_else(|_| "flagship_HK_private_domestic_prices".to_string()),
            rents_table: env::var("RENTS_TABLE")
                .unwrap_or_else(|_| "flagship_HK_private_domestic_rents".to_string()),
            source_file: env::var("SOURCE_FILE")
                .unwrap_or_else(|_| "./data/His Data.xls".to_string())
                .into(),
            batch_size: parse_or("UPLOAD_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            test_rows: parse_or("UPLOAD_TEST_ROWS", 0)?,
        })
    }

    /// Test rows take precedence over batching when both are configured
    pub fn upload_mode(&self) -> UploadMode {
        if self.test_rows > 0 {
            UploadMode::TestRows(self.test_rows)
        } else {
            UploadMode::Batched {
                batch_size: self.batch_size,
            }
        }
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn parse_or(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { var, value }),
        },
        Err(_) => Ok(default),
    }
}
