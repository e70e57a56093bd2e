//! Ethereum Attestation Service toolkit.
//!
//! Registers schemas, creates, reads and revokes on-chain attestations,
//! signs and stores off-chain attestations, and commits to private data
//! with Merkle roots. Every command is a one-shot run driven by a YAML
//! configuration file.

// Core subsystems
pub mod blockchain;
pub mod config;
pub mod eas;
pub mod storage;

// Surfaces
pub mod cli;
pub mod commands;
pub mod report;

// Cross-cutting concerns
pub mod observability;

pub use config::ToolkitConfig;
pub use eas::{EasClient, SchemaRegistryClient};
