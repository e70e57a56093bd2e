//! Local persistence of signed off-chain attestations.
//!
//! # Design Decisions
//! - One pretty-printed JSON array per store file
//! - Records are write-once: a duplicate UID is reported, never overwritten
//! - Writes go to a sibling temp file which is then renamed over the store

pub mod json_store;

pub use json_store::{InsertOutcome, JsonStore, StorageError, StorageResult, StoredRecord};
