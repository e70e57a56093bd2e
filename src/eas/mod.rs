//! Ethereum Attestation Service integration.
//!
//! # Data Flow
//! ```text
//! SchemaConfig      → schema.rs (parse, encode, UID)  → registry.rs (register / getSchema)
//! AttestationConfig → attestation.rs (attest, revoke, read back)
//!                   → offchain.rs (EIP-712 sign, UID, verify) → storage (JSON store)
//! PrivateDataConfig → private_data.rs (Merkle root, disclosure proofs)
//! ```

pub mod attestation;
pub mod contracts;
pub mod offchain;
pub mod private_data;
pub mod registry;
pub mod schema;
pub mod types;

pub use attestation::{AttestParams, EasClient, TxOutcome};
pub use offchain::{EasDomain, OffchainAttestationParams, SignedOffchainAttestation};
pub use private_data::{DisclosureProof, PrivateData, PrivateField};
pub use registry::{Registration, SchemaRegistryClient};
pub use schema::{schema_uid, SchemaDefinition};
pub use types::{EasError, EasResult};
