use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Kind of tracked operation against a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageOperation {
    /// Paid per token and per second of compute. Requires a subscription.
    Inference,
    /// Flat fee.
    Download,
    /// Free.
    View,
}

impl UsageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageOperation::Inference => "inference",
            UsageOperation::Download => "download",
            UsageOperation::View => "view",
        }
    }

    pub fn requires_subscription(&self) -> bool {
        matches!(self, UsageOperation::Inference)
    }
}

impl fmt::Display for UsageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UsageOperation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inference" => Ok(UsageOperation::Inference),
            "download" => Ok(UsageOperation::Download),
            "view" => Ok(UsageOperation::View),
            other => Err(ValidationError::invalid_format(
                "operation",
                format!("expected inference, download or view, got '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_inference_requires_subscription() {
        assert!(UsageOperation::Inference.requires_subscription());
        assert!(!UsageOperation::Download.requires_subscription());
        assert!(!UsageOperation::View.requires_subscription());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Inference".parse(), Ok(UsageOperation::Inference));
        assert!("train".parse::<UsageOperation>().is_err());
    }
}
