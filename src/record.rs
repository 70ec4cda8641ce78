//! The generalized record shared by notes and todos.
//!
//! A record is an immutable id plus a variant payload. On disk both live in
//! one flat JSON object, e.g. `{"id": "...", "title": "...", ...}`.
use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::Result;

/// Where new records enter a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newest first
    Head,
    /// Oldest first
    Tail,
}

/// Variant-specific content of a record.
pub trait Payload:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Well-known backend key the whole collection is stored under.
    const STORAGE_KEY: &'static str;

    /// Insertion point for newly added records.
    const PLACEMENT: Placement;

    /// Human readable label used in logs.
    const KIND: &'static str;

    /// Fails with `ValidationFailed` when the required content is empty.
    fn validate(&self) -> Result<()>;
}

/// A single entry of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<P> {
    id: String,
    #[serde(flatten)]
    payload: P,
}

impl<P> Record<P> {
    pub(crate) fn new(id: String, payload: P) -> Self {
        Self { id, payload }
    }

    /// Unique identifier, fixed at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Replaces the payload wholesale, keeping the id.
    pub(crate) fn replace_payload(&mut self, payload: P) {
        self.payload = payload;
    }
}
