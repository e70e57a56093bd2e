//! SchemaRegistry contract client.

use alloy::primitives::{Address, TxHash, B256};

use crate::blockchain::transaction::{estimate_call, send_call};
use crate::blockchain::{BlockchainClient, BlockchainError, GasPlan};
use crate::eas::contracts::ISchemaRegistry::{self, SchemaRecord};
use crate::eas::schema::SchemaDefinition;
use crate::eas::types::{decode_events, EasError, EasResult};

/// Result of a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The schema was already on chain; nothing was sent.
    Existing(SchemaRecord),
    /// A `register` transaction was confirmed.
    Registered {
        uid: B256,
        tx_hash: TxHash,
        block_number: Option<u64>,
        gas_used: u64,
    },
}

impl Registration {
    pub fn uid(&self) -> B256 {
        match self {
            Registration::Existing(record) => record.uid,
            Registration::Registered { uid, .. } => *uid,
        }
    }
}

/// Client for the SchemaRegistry at a fixed address.
#[derive(Debug, Clone)]
pub struct SchemaRegistryClient {
    client: BlockchainClient,
    address: Address,
}

impl SchemaRegistryClient {
    pub fn new(client: BlockchainClient, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Register `schema`, unless a record with the same UID already exists.
    pub async fn register(
        &self,
        schema: &SchemaDefinition,
        resolver: Address,
        revocable: bool,
    ) -> EasResult<Registration> {
        let uid = schema.uid(resolver, revocable);
        match self.get_schema(uid).await {
            Ok(record) => {
                tracing::info!(uid = %uid, "Schema already registered, skipping");
                return Ok(Registration::Existing(record));
            }
            Err(EasError::SchemaNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let signer = self.signer()?;
        let registry = ISchemaRegistry::new(self.address, self.client.signing_provider()?.clone());
        let call = registry
            .register(schema.as_str().to_string(), resolver, revocable)
            .from(signer);

        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;
        tracing::info!(
            uid = %uid,
            schema = %schema,
            gas_limit = plan.gas_limit,
            "Registering schema"
        );

        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        let event = decode_events::<ISchemaRegistry::Registered>(&receipt, self.address)
            .into_iter()
            .next()
            .ok_or(EasError::MissingEvent {
                tx_hash,
                event: "Registered",
            })?;

        if event.uid != uid {
            tracing::warn!(expected = %uid, actual = %event.uid, "Registered UID differs from computed UID");
        }

        Ok(Registration::Registered {
            uid: event.uid,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    /// Gas plan for registering `schema`, without sending anything.
    pub async fn estimate_register(
        &self,
        schema: &SchemaDefinition,
        resolver: Address,
        revocable: bool,
    ) -> EasResult<GasPlan> {
        let registry = ISchemaRegistry::new(self.address, self.client.signing_provider()?.clone());
        let call = registry
            .register(schema.as_str().to_string(), resolver, revocable)
            .from(self.signer()?);
        let estimate = estimate_call(&call).await?;
        Ok(self.client.plan_gas(estimate).await?)
    }

    /// Fetch a schema record. An all-zero record means it was never registered.
    pub async fn get_schema(&self, uid: B256) -> EasResult<SchemaRecord> {
        let address = self.address;
        let record = self
            .client
            .read("get schema", |p| async move {
                ISchemaRegistry::new(address, p).getSchema(uid).call().await
            })
            .await?;

        if record.uid.is_zero() {
            return Err(EasError::SchemaNotFound(uid));
        }
        Ok(record)
    }

    fn signer(&self) -> EasResult<Address> {
        self.client.signer().ok_or_else(|| {
            EasError::Blockchain(BlockchainError::NotAvailable(
                "registering a schema needs a wallet".to_string(),
            ))
        })
    }
}
