//! Discovery error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Registry source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
