use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ClientError, EvaluationError};

mod fixed;
mod http;

pub use self::fixed::StaticEvaluator;
pub use self::http::{EvaluateRequest, EvaluateResponse, FlagState, HttpEvaluator};

/// Name of a feature flag. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagName(String);

impl FlagName {
    pub fn new(name: impl Into<String>) -> Result<Self, ClientError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "flag name cannot be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// User context forwarded to the evaluator
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct EvaluationContext {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    #[serde(default)]
    pub custom_attributes: HashMap<String, String>,
}

/// The authority that decides whether a flag is on.
///
/// Implementations carry whatever ambient context they need; the client only
/// hands over the flag name.
#[async_trait]
pub trait FlagEvaluator: Send + Sync {
    async fn evaluate_flag(&self, flag: &FlagName) -> Result<bool, EvaluationError>;
}
