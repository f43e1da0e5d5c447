//! Model selection per session role.

use serde::{Deserialize, Serialize};
use storytime_domain::Model;

/// Which model drives each session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionModels {
    pub author: Model,
    pub evaluator: Model,
}

impl SessionModels {
    pub fn with_author(mut self, model: Model) -> Self {
        self.author = model;
        self
    }

    pub fn with_evaluator(mut self, model: Model) -> Self {
        self.evaluator = model;
        self
    }
}
