//! Command implementations behind the CLI.
//!
//! # Data Flow
//! ```text
//! Cli (clap) → run() → per-command handler
//!     → Context (config, wallet, clients, store)
//!     → eas::* contract calls / local signing
//!     → report::* text on stdout
//! ```
//!
//! Each invocation is independent. The JSON store is the only state shared
//! between runs.

pub mod attest;
pub mod offchain;
pub mod private_data;
pub mod schema;
pub mod workflow;

use std::path::PathBuf;

use alloy::primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::blockchain::{BlockchainClient, BlockchainError, Wallet};
use crate::cli::{Cli, Command};
use crate::config::validation::{parse_address, parse_bytes32, parse_wei};
use crate::config::{validate_for, ConfigError, Operation, ToolkitConfig, ValidationError};
use crate::eas::attestation::AttestParams;
use crate::eas::schema::{DecodedField, SchemaDefinition};
use crate::eas::{EasClient, EasDomain, EasError, SchemaRegistryClient, SignedOffchainAttestation};
use crate::report;
use crate::storage::{JsonStore, StorageError};

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", report::validation_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Eas(#[from] EasError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Off-chain attestation {0} is not in the local store")]
    NotStored(B256),
}

impl From<ValidationError> for CommandError {
    fn from(error: ValidationError) -> Self {
        CommandError::Validation(vec![error])
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Everything a command needs, derived from the loaded config.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ToolkitConfig,
}

impl Context {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }

    /// Fail with every missing field `op` depends on.
    pub fn require(&self, op: Operation) -> CommandResult<()> {
        validate_for(&self.config, op).map_err(CommandError::Validation)
    }

    pub fn wallet(&self) -> CommandResult<Wallet> {
        Ok(Wallet::from_env(
            &self.config.wallet.private_key_env,
            self.config.network.chain_id,
        )?)
    }

    pub fn read_client(&self) -> CommandResult<BlockchainClient> {
        Ok(BlockchainClient::new(self.config.network.clone())?)
    }

    /// A client able to send transactions, checked against the node's chain id.
    pub async fn signing_client(&self) -> CommandResult<BlockchainClient> {
        let wallet = self.wallet()?;
        let client = BlockchainClient::with_wallet(self.config.network.clone(), &wallet)?;
        client.verify_chain_id().await?;
        tracing::info!(signer = %wallet.address(), chain_id = self.config.network.chain_id, "Wallet ready");
        Ok(client)
    }

    pub fn registry(&self, client: BlockchainClient) -> CommandResult<SchemaRegistryClient> {
        let address = parse_address("contracts.schema_registry", &self.config.contracts.schema_registry)?;
        Ok(SchemaRegistryClient::new(client, address))
    }

    pub fn eas(&self, client: BlockchainClient) -> CommandResult<EasClient> {
        let address = parse_address("contracts.eas", &self.config.contracts.eas)?;
        Ok(EasClient::new(client, address))
    }

    pub fn schema_definition(&self) -> CommandResult<SchemaDefinition> {
        Ok(SchemaDefinition::parse(&self.config.schema.definition)?)
    }

    pub fn resolver(&self) -> CommandResult<Address> {
        Ok(parse_address("schema.resolver", &self.config.schema.resolver)?)
    }

    /// Configured schema UID, or the UID the configured definition registers as.
    pub fn schema_uid(&self) -> CommandResult<B256> {
        match &self.config.schema.uid {
            Some(uid) => Ok(parse_bytes32("schema.uid", uid)?),
            None => Ok(self
                .schema_definition()?
                .uid(self.resolver()?, self.config.schema.revocable)),
        }
    }

    /// One set of attestation parameters per configured recipient.
    pub fn attest_params(&self, schema: B256, data: Bytes) -> CommandResult<Vec<AttestParams>> {
        let att = &self.config.attestation;
        let ref_uid = parse_bytes32("attestation.ref_uid", &att.ref_uid)?;
        let value = parse_wei("attestation.value", &att.value)?;
        att.recipients
            .iter()
            .enumerate()
            .map(|(i, recipient)| {
                Ok(AttestParams {
                    schema,
                    recipient: parse_address(&format!("attestation.recipients[{}]", i), recipient)?,
                    expiration_time: att.expiration_time,
                    revocable: att.revocable,
                    ref_uid,
                    data: data.clone(),
                    value,
                })
            })
            .collect()
    }

    /// Encode the configured attestation data under the configured schema.
    pub fn encoded_data(&self) -> CommandResult<Bytes> {
        Ok(self.schema_definition()?.encode(&self.config.attestation.data)?)
    }

    pub fn store(&self) -> JsonStore<SignedOffchainAttestation> {
        JsonStore::new(&self.config.storage.path)
    }

    /// EIP-712 domain of the configured EAS contract.
    pub async fn domain(&self, eas: &EasClient) -> CommandResult<EasDomain> {
        let version = match &self.config.contracts.eas_version {
            Some(version) => version.clone(),
            None => eas.version().await?,
        };
        Ok(EasDomain::new(version, self.config.network.chain_id, eas.address()))
    }

    /// Decode attestation data when it belongs to the configured schema.
    pub fn decode_if_configured(&self, schema: B256, data: &[u8]) -> Vec<DecodedField> {
        let configured = self.schema_uid().ok() == Some(schema);
        if !configured {
            return Vec::new();
        }
        match self.schema_definition().and_then(|d| Ok(d.decode(data)?)) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(error = %e, "Could not decode attestation data");
                Vec::new()
            }
        }
    }

    /// Decode attestation data, looking the schema up on chain when it is not
    /// the configured one.
    pub async fn decode_data(&self, schema: B256, data: &[u8]) -> Vec<DecodedField> {
        let decoded = self.decode_if_configured(schema, data);
        if !decoded.is_empty() || self.config.contracts.schema_registry.trim().is_empty() {
            return decoded;
        }
        let lookup = async {
            let registry = self.registry(self.read_client()?)?;
            let record = registry.get_schema(schema).await?;
            let definition = SchemaDefinition::parse(&record.schema)?;
            Ok::<_, CommandError>(definition.decode(data)?)
        };
        lookup.await.unwrap_or_else(|e| {
            tracing::warn!(schema = %schema, error = %e, "Could not decode attestation data");
            Vec::new()
        })
    }
}

/// Parse a UID given on the command line.
pub fn parse_uid(value: &str) -> CommandResult<B256> {
    Ok(parse_bytes32("uid", value)?)
}

/// Sum of the `value` fields, for reporting.
pub fn total_value(params: &[AttestParams]) -> U256 {
    params.iter().fold(U256::ZERO, |acc, p| acc + p.value)
}

/// Run a parsed command against a loaded configuration.
pub async fn run(cli: Cli, config: ToolkitConfig) -> CommandResult<()> {
    let ctx = Context::new(config);
    match cli.command {
        Command::Validate => {
            println!("{}", schema::validate_report(&ctx)?);
            Ok(())
        }
        Command::Schema { action } => schema::run(&ctx, action).await,
        Command::Attest { estimate } => attest::attest(&ctx, estimate).await,
        Command::Get { uid } => attest::get(&ctx, parse_uid(&uid)?).await,
        Command::Revoke { uid, estimate } => attest::revoke(&ctx, parse_uid(&uid)?, estimate).await,
        Command::Offchain { action } => offchain::run(&ctx, action).await,
        Command::PrivateData { action } => private_data::run(&ctx, action).await,
        Command::Workflow => workflow::run(&ctx).await,
    }
}
