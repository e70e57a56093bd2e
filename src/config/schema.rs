//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the toolkit.
//! All types derive Serde traits for deserialization from YAML files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default environment variable holding the signer's private key.
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "EAS_PRIVATE_KEY";

/// Root configuration for the toolkit.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Chain connection settings.
    pub network: NetworkConfig,

    /// Deployed EAS contract addresses.
    pub contracts: ContractsConfig,

    /// Signer acquisition.
    pub wallet: WalletConfig,

    /// Schema to register or attest against.
    pub schema: SchemaConfig,

    /// Attestation parameters.
    pub attestation: AttestationConfig,

    /// Merkle-committed private data.
    pub private_data: PrivateDataConfig,

    /// Local JSON storage.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// End-to-end workflow settings.
    pub workflow: WorkflowConfig,
}

/// JSON-RPC and transaction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs (reads only).
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 11155111 for Sepolia, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a transaction counts.
    pub confirmation_blocks: u32,

    /// How long to wait for those confirmations.
    pub confirmation_timeout_secs: u64,

    /// Gas price multiplier (1.0 = node price, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Gas limit multiplier applied to the node's estimate.
    pub gas_limit_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            gas_price_multiplier: 1.2,
            gas_limit_multiplier: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

/// Addresses of the EAS deployment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    /// EAS contract address.
    pub eas: String,

    /// SchemaRegistry contract address.
    pub schema_registry: String,

    /// EAS contract version for the EIP-712 domain. Queried when absent.
    pub eas_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key.
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: DEFAULT_PRIVATE_KEY_ENV.to_string(),
        }
    }
}

/// Schema definition and registration options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Field layout, e.g. `"uint256 eventId, uint8 voteIndex"`.
    pub definition: String,

    /// Resolver contract address (zero address for none).
    pub resolver: String,

    /// Whether attestations under this schema may be revoked.
    pub revocable: bool,

    /// Registered schema UID. Computed from the definition when absent.
    pub uid: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            definition: String::new(),
            resolver: ZERO_ADDRESS.to_string(),
            revocable: true,
            uid: None,
        }
    }
}

pub(crate) const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub(crate) const ZERO_BYTES32: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Attestation request parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AttestationConfig {
    /// Recipients; more than one triggers a multi-attestation.
    pub recipients: Vec<String>,

    /// Unix timestamp after which the attestation expires (0 = never).
    pub expiration_time: u64,

    /// Whether the attestation may be revoked.
    pub revocable: bool,

    /// UID of a referenced attestation.
    pub ref_uid: String,

    /// ETH value sent to the resolver, in wei.
    pub value: String,

    /// Schema field values keyed by field name.
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            expiration_time: 0,
            revocable: true,
            ref_uid: ZERO_BYTES32.to_string(),
            value: "0".to_string(),
            data: BTreeMap::new(),
        }
    }
}

/// Merkle-committed private data.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PrivateDataConfig {
    /// Schema UID with the single field `bytes32 privateData`.
    pub schema_uid: Option<String>,

    /// Fields committed into the tree, in leaf order.
    pub fields: Vec<PrivateFieldConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrivateFieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding signed off-chain attestations.
    pub path: String,

    /// Directory for disclosure proof files.
    pub proofs_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "offchain-attestations.json".to_string(),
            proofs_dir: "proofs".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Simulated review delay between attesting and verifying, in seconds.
    pub delay_secs: u64,

    /// Revoke the attestation at the end of the workflow.
    pub revoke_after: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            delay_secs: 3,
            revoke_after: false,
        }
    }
}
