//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Format checks on addresses, UIDs, URLs and amounts
//! - Per-operation existence checks before any call is made
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ToolkitConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::str::FromStr;

use alloy::dyn_abi::DynSolType;
use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::config::schema::ToolkitConfig;
use crate::eas::schema::SchemaDefinition;

/// A single failed check, tagged with the offending config field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Operations with their own configuration requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterSchema,
    ReadSchema,
    Attest,
    ReadAttestation,
    Revoke,
    OffchainSign,
    OffchainAnchor,
    PrivateDataCommit,
    PrivateDataProve,
    Workflow,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::RegisterSchema => "schema registration",
            Operation::ReadSchema => "schema lookup",
            Operation::Attest => "attestation",
            Operation::ReadAttestation => "attestation lookup",
            Operation::Revoke => "revocation",
            Operation::OffchainSign => "off-chain signing",
            Operation::OffchainAnchor => "off-chain timestamp/revocation",
            Operation::PrivateDataCommit => "private data commitment",
            Operation::PrivateDataProve => "private data disclosure",
            Operation::Workflow => "workflow",
        };
        f.write_str(name)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Parse an address field.
pub fn parse_address(field: &str, value: &str) -> Result<Address, ValidationError> {
    Address::from_str(value.trim())
        .map_err(|e| ValidationError::new(field, format!("invalid address '{}': {}", value, e)))
}

/// Parse a 32-byte UID field.
pub fn parse_bytes32(field: &str, value: &str) -> Result<B256, ValidationError> {
    B256::from_str(value.trim())
        .map_err(|e| ValidationError::new(field, format!("invalid bytes32 '{}': {}", value, e)))
}

/// Parse a decimal wei amount.
pub fn parse_wei(field: &str, value: &str) -> Result<U256, ValidationError> {
    U256::from_str_radix(value.trim(), 10)
        .map_err(|e| ValidationError::new(field, format!("invalid amount '{}': {}", value, e)))
}

/// Validate the whole configuration, independent of the operation.
pub fn validate_config(config: &ToolkitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let network = &config.network;
    if let Err(e) = url::Url::parse(&network.rpc_url) {
        errors.push(ValidationError::new("network.rpc_url", format!("invalid URL: {}", e)));
    }
    for (i, failover) in network.failover_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(
                format!("network.failover_urls[{}]", i),
                format!("invalid URL: {}", e),
            ));
        }
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be non-zero"));
    }
    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be non-zero",
        ));
    }
    for (field, value) in [
        ("network.gas_price_multiplier", network.gas_price_multiplier),
        ("network.gas_limit_multiplier", network.gas_limit_multiplier),
    ] {
        if !value.is_finite() || value < 1.0 {
            errors.push(ValidationError::new(field, "must be a number >= 1.0"));
        }
    }

    if !config.contracts.eas.is_empty() {
        push_err(&mut errors, parse_address("contracts.eas", &config.contracts.eas));
    }
    if !config.contracts.schema_registry.is_empty() {
        push_err(
            &mut errors,
            parse_address("contracts.schema_registry", &config.contracts.schema_registry),
        );
    }

    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("wallet.private_key_env", "must not be empty"));
    }

    push_err(&mut errors, parse_address("schema.resolver", &config.schema.resolver));
    if let Some(uid) = &config.schema.uid {
        push_err(&mut errors, parse_bytes32("schema.uid", uid));
    }
    if !config.schema.definition.trim().is_empty() {
        if let Err(e) = SchemaDefinition::parse(&config.schema.definition) {
            errors.push(ValidationError::new("schema.definition", e.to_string()));
        }
    }

    let attestation = &config.attestation;
    for (i, recipient) in attestation.recipients.iter().enumerate() {
        push_err(
            &mut errors,
            parse_address(&format!("attestation.recipients[{}]", i), recipient),
        );
    }
    push_err(&mut errors, parse_bytes32("attestation.ref_uid", &attestation.ref_uid));
    push_err(&mut errors, parse_wei("attestation.value", &attestation.value));

    if let Some(uid) = &config.private_data.schema_uid {
        push_err(&mut errors, parse_bytes32("private_data.schema_uid", uid));
    }
    for (i, field) in config.private_data.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("private_data.fields[{}].name", i),
                "must not be empty",
            ));
        }
        if let Err(e) = DynSolType::parse(&field.type_name) {
            errors.push(ValidationError::new(
                format!("private_data.fields[{}].type", i),
                format!("invalid type '{}': {}", field.type_name, e),
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that every field `op` needs is present before a call is made.
pub fn validate_for(config: &ToolkitConfig, op: Operation) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let needs_registry = matches!(
        op,
        Operation::RegisterSchema | Operation::ReadSchema | Operation::Workflow
    );
    let needs_eas = !matches!(
        op,
        Operation::RegisterSchema | Operation::ReadSchema | Operation::PrivateDataProve
    );
    let needs_definition = matches!(
        op,
        Operation::RegisterSchema | Operation::Attest | Operation::OffchainSign | Operation::Workflow
    );
    let needs_data = matches!(
        op,
        Operation::Attest | Operation::OffchainSign | Operation::Workflow
    );

    if needs_registry && config.contracts.schema_registry.trim().is_empty() {
        errors.push(ValidationError::new(
            "contracts.schema_registry",
            format!("required for {}", op),
        ));
    }
    if needs_eas && config.contracts.eas.trim().is_empty() {
        errors.push(ValidationError::new("contracts.eas", format!("required for {}", op)));
    }
    if needs_definition && config.schema.definition.trim().is_empty() {
        errors.push(ValidationError::new(
            "schema.definition",
            format!("required for {}", op),
        ));
    }

    if needs_data {
        if config.attestation.recipients.is_empty() {
            errors.push(ValidationError::new(
                "attestation.recipients",
                format!("at least one recipient is required for {}", op),
            ));
        }
        if let Ok(definition) = SchemaDefinition::parse(&config.schema.definition) {
            for field in definition.fields() {
                if !config.attestation.data.contains_key(&field.name) {
                    errors.push(ValidationError::new(
                        format!("attestation.data.{}", field.name),
                        "missing value for schema field",
                    ));
                }
            }
        }
    }

    // `revoke <UID>` may target any schema; the contract record decides there
    let revokes = matches!(op, Operation::Workflow) && config.workflow.revoke_after;
    if revokes && !config.schema.revocable {
        errors.push(ValidationError::new(
            "schema.revocable",
            format!("schema must be revocable for {}", op),
        ));
    }

    if matches!(op, Operation::PrivateDataCommit) && config.private_data.schema_uid.is_none() {
        errors.push(ValidationError::new(
            "private_data.schema_uid",
            format!("required for {}", op),
        ));
    }
    if matches!(op, Operation::PrivateDataCommit | Operation::PrivateDataProve)
        && config.private_data.fields.is_empty()
    {
        errors.push(ValidationError::new(
            "private_data.fields",
            format!("at least one field is required for {}", op),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push_err<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attest_config() -> ToolkitConfig {
        let mut config = ToolkitConfig::default();
        config.contracts.eas = "0xC2679fBD37d54388Ce493F1DB75320D236e1815e".to_string();
        config.contracts.schema_registry =
            "0x0a7E2Ff54e76B8E6659aedc9103FB21c038050D0".to_string();
        config.schema.definition = "uint256 eventId, uint8 voteIndex".to_string();
        config.attestation.recipients =
            vec!["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()];
        config.attestation.data.insert("eventId".into(), serde_json::json!(1));
        config.attestation.data.insert("voteIndex".into(), serde_json::json!(3));
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ToolkitConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ToolkitConfig::default();
        config.network.rpc_url = "not a url".to_string();
        config.network.gas_price_multiplier = 0.5;
        config.contracts.eas = "0x1234".to_string();
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "network.rpc_url",
                "network.gas_price_multiplier",
                "contracts.eas",
                "observability.log_level"
            ]
        );
    }

    #[test]
    fn test_bad_schema_definition_rejected() {
        let mut config = ToolkitConfig::default();
        config.schema.definition = "uint257 score".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "schema.definition");
    }

    #[test]
    fn test_attest_requirements_met() {
        assert!(validate_for(&attest_config(), Operation::Attest).is_ok());
    }

    #[test]
    fn test_attest_missing_field_value() {
        let mut config = attest_config();
        config.attestation.data.remove("voteIndex");
        let errors = validate_for(&config, Operation::Attest).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "attestation.data.voteIndex");
    }

    #[test]
    fn test_register_needs_registry_not_eas() {
        let mut config = attest_config();
        config.contracts.eas.clear();
        assert!(validate_for(&config, Operation::RegisterSchema).is_ok());

        config.contracts.schema_registry.clear();
        let errors = validate_for(&config, Operation::RegisterSchema).unwrap_err();
        assert_eq!(errors[0].field, "contracts.schema_registry");
        assert!(errors[0].to_string().contains("schema registration"));
    }

    #[test]
    fn test_private_commit_requirements() {
        let config = attest_config();
        let errors = validate_for(&config, Operation::PrivateDataCommit).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["private_data.schema_uid", "private_data.fields"]);
    }

    #[test]
    fn test_revoking_workflow_needs_revocable_schema() {
        let mut config = attest_config();
        assert!(validate_for(&config, Operation::Revoke).is_ok());
        assert!(validate_for(&config, Operation::Workflow).is_ok());

        config.schema.revocable = false;
        // The target of `revoke <UID>` may belong to another schema
        assert!(validate_for(&config, Operation::Revoke).is_ok());

        // Workflow only revokes when asked to
        assert!(validate_for(&config, Operation::Workflow).is_ok());
        config.workflow.revoke_after = true;
        let errors = validate_for(&config, Operation::Workflow).unwrap_err();
        assert_eq!(errors[0].field, "schema.revocable");
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_address("f", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
        assert!(parse_bytes32("f", "0x12").is_err());
        assert_eq!(parse_wei("f", "1000").unwrap(), U256::from(1000));
        assert!(parse_wei("f", "-1").is_err());
    }
}
