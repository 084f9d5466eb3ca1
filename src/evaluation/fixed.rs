use async_trait::async_trait;
use std::collections::HashMap;

use super::{FlagEvaluator, FlagName};
use crate::error::EvaluationError;

/// In-memory flag table, for local overrides and offline development.
#[derive(Debug, Default, Clone)]
pub struct StaticEvaluator {
    flags: HashMap<String, bool>,
}

impl StaticEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.flags.insert(name.into(), enabled);
        self
    }
}

impl FromIterator<(String, bool)> for StaticEvaluator {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl FlagEvaluator for StaticEvaluator {
    async fn evaluate_flag(&self, flag: &FlagName) -> Result<bool, EvaluationError> {
        self.flags
            .get(flag.as_str())
            .copied()
            .ok_or_else(|| EvaluationError::FlagNotFound(flag.to_string()))
    }
}
