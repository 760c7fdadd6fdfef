use std::str::FromStr;

use rentfold_core::AppError;
use serde::{Deserialize, Serialize};

/// Severity tag carried by a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    /// Terminal workflow success.
    Success,
    /// Terminal workflow failure.
    Error,
}

impl NotificationSeverity {
    /// Returns a stable storage value for this severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl FromStr for NotificationSeverity {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(AppError::Validation(format!(
                "unknown notification severity '{value}'"
            ))),
        }
    }
}
