//! Top-level error for running a concurrency report.

use crate::config::ConfigError;
use crate::records::RecordError;
use crate::stats::StatsError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Interrupted: user cancelled the scan before any of {total} records was counted")]
    Interrupted { total: usize },
}

impl CommandError {
    /// True when the run stopped because the user cancelled it.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Interrupted { .. } | Self::Record(RecordError::Interrupted { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
