use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{DealId, TagId};
use crate::stage::Stage;

/// A tracked opportunity as served by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    /// Monetary value in minor currency units.
    pub value_cents: u64,
    pub stage: Stage,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
}

impl Deal {
    pub fn new(title: impl Into<String>, value_cents: u64, stage: Stage, created_at: i64) -> Self {
        Self {
            id: DealId::new(),
            title: title.into(),
            value_cents,
            stage,
            created_at,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_id(mut self, id: DealId) -> Self {
        self.id = id;
        self
    }

    /// Deterministic append order used when a deal first enters a stage.
    pub(crate) fn creation_key(&self) -> (i64, DealId) {
        (self.created_at, self.id)
    }
}
