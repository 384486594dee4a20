use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ─── Template ───────────────────────────────────────────────────────────────

/// Current state of a registered template, folded from its events.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub key: String,
    pub template: String,
    /// Only known once an `UpdatedTemplate` event has been seen.
    pub owner: Option<String>,
    pub price: String,
    pub deleted: bool,
    pub added_at_block: i64,
    pub updated_at_block: i64,
}

/// Kind of template lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateEventKind {
    Added,
    Updated,
    Deleted,
}

impl TemplateEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// Insert-ready template event.
#[derive(Debug, Clone)]
pub struct NewTemplateEvent {
    pub key: String,
    pub kind: TemplateEventKind,
    pub template: Option<String>,
    pub owner: Option<String>,
    pub price: Option<String>,
    pub transaction_hash: String,
    pub block_number: i64,
    pub log_index: i32,
}

// ─── Deployment ─────────────────────────────────────────────────────────────

/// An instance deployed through the factory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deployment {
    pub id: i64,
    pub deployed: String,
    pub deployer: String,
    pub transaction_hash: String,
    pub block_number: i64,
    pub log_index: i32,
    pub created_at: NaiveDateTime,
}

/// Insert-ready deployment (no `id` or `created_at`).
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub deployed: String,
    pub deployer: String,
    pub transaction_hash: String,
    pub block_number: i64,
    pub log_index: i32,
}

// ─── Fee Change ─────────────────────────────────────────────────────────────

/// A change of the clone fee (`kind = "fee"`) or its recipient (`kind = "fee_to"`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeeChange {
    pub id: i64,
    pub kind: String,
    pub previous: String,
    pub current: String,
    pub transaction_hash: String,
    pub block_number: i64,
    pub log_index: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFeeChange {
    pub kind: String,
    pub previous: String,
    pub current: String,
    pub transaction_hash: String,
    pub block_number: i64,
    pub log_index: i32,
}

// ─── IndexedBlock ───────────────────────────────────────────────────────────

/// A block that has been processed by the indexer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IndexedBlock {
    pub block_number: i64,
    pub block_hash: String,
    pub parent_hash: String,
    pub timestamp: i64,
}

/// Everything decoded from one batch of blocks, written in a single transaction.
#[derive(Debug, Clone, Default)]
pub struct BatchWrite {
    pub template_events: Vec<NewTemplateEvent>,
    pub deployments: Vec<NewDeployment>,
    pub fee_changes: Vec<NewFeeChange>,
}

impl BatchWrite {
    pub fn is_empty(&self) -> bool {
        self.template_events.is_empty() && self.deployments.is_empty() && self.fee_changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.template_events.len() + self.deployments.len() + self.fee_changes.len()
    }
}
