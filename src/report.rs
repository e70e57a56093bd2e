//! Console reports.
//!
//! Every renderer is pure and returns the text the CLI prints to stdout.

use alloy::primitives::{utils::format_units, Address, U256};
use chrono::DateTime;

use crate::blockchain::GasPlan;
use crate::config::ValidationError;
use crate::eas::attestation::TxOutcome;
use crate::eas::contracts::IEAS::Attestation;
use crate::eas::contracts::ISchemaRegistry::SchemaRecord;
use crate::eas::private_data::DisclosureProof;
use crate::eas::registry::Registration;
use crate::eas::schema::DecodedField;
use crate::eas::SignedOffchainAttestation;

/// Render a Unix timestamp; 0 renders as `never`.
pub fn format_time(secs: u64) -> String {
    if secs == 0 {
        return "never".to_string();
    }
    match DateTime::from_timestamp(secs as i64, 0) {
        Some(dt) => format!("{} ({})", dt.format("%Y-%m-%d %H:%M:%S UTC"), secs),
        None => secs.to_string(),
    }
}

/// Wei amount in ether, falling back to raw wei.
pub fn format_eth(wei: U256) -> String {
    format_units(wei, "ether")
        .map(|eth| format!("{} ETH", eth))
        .unwrap_or_else(|_| format!("{} wei", wei))
}

fn format_gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei")
        .map(|gwei| format!("{} gwei", gwei))
        .unwrap_or_else(|_| format!("{} wei", wei))
}

fn format_resolver(resolver: Address) -> String {
    if resolver.is_zero() {
        "none".to_string()
    } else {
        resolver.to_checksum(None)
    }
}

fn push_decoded(lines: &mut Vec<String>, decoded: &[DecodedField]) {
    if decoded.is_empty() {
        return;
    }
    lines.push("  Data:".to_string());
    lines.extend(decoded.iter().map(|d| format!("    {}", d)));
}

pub fn schema_record(record: &SchemaRecord) -> String {
    [
        "Schema".to_string(),
        format!("  UID:       {}", record.uid),
        format!("  Schema:    {}", record.schema),
        format!("  Resolver:  {}", format_resolver(record.resolver)),
        format!("  Revocable: {}", record.revocable),
    ]
    .join("\n")
}

pub fn registration(registration: &Registration) -> String {
    match registration {
        Registration::Existing(record) => {
            format!("Schema already registered, nothing sent\n{}", schema_record(record))
        }
        Registration::Registered {
            uid,
            tx_hash,
            block_number,
            gas_used,
        } => [
            "Schema registered".to_string(),
            format!("  UID:       {}", uid),
            format!("  Tx:        {}", tx_hash),
            format!("  Block:     {}", block_number.map_or("-".to_string(), |b| b.to_string())),
            format!("  Gas used:  {}", gas_used),
        ]
        .join("\n"),
    }
}

pub fn tx_outcome(title: &str, outcome: &TxOutcome) -> String {
    [
        title.to_string(),
        format!("  Tx:        {}", outcome.tx_hash),
        format!(
            "  Block:     {}",
            outcome.block_number.map_or("-".to_string(), |b| b.to_string())
        ),
        format!("  Gas used:  {}", outcome.gas_used),
    ]
    .join("\n")
}

pub fn gas_plan(operation: &str, plan: &GasPlan) -> String {
    [
        format!("Gas estimate for {}", operation),
        format!("  Estimated gas: {}", plan.estimated_gas),
        format!("  Gas limit:     {}", plan.gas_limit),
        format!("  Gas price:     {}", format_gwei(plan.gas_price)),
        format!("  Max cost:      {}", format_eth(plan.max_cost_wei())),
    ]
    .join("\n")
}

pub fn attestation(
    attestation: &Attestation,
    decoded: &[DecodedField],
    valid: Option<bool>,
) -> String {
    let mut lines = vec![
        "Attestation".to_string(),
        format!("  UID:        {}", attestation.uid),
        format!("  Schema:     {}", attestation.schema),
        format!("  Attester:   {}", attestation.attester.to_checksum(None)),
        format!("  Recipient:  {}", attestation.recipient.to_checksum(None)),
        format!("  Created:    {}", format_time(attestation.time)),
        format!("  Expires:    {}", format_time(attestation.expirationTime)),
        format!("  Revoked:    {}", format_time(attestation.revocationTime)),
        format!("  Revocable:  {}", attestation.revocable),
    ];
    if !attestation.refUID.is_zero() {
        lines.push(format!("  Ref UID:    {}", attestation.refUID));
    }
    if let Some(valid) = valid {
        lines.push(format!("  Valid:      {}", valid));
    }
    push_decoded(&mut lines, decoded);
    lines.join("\n")
}

pub fn offchain(record: &SignedOffchainAttestation, decoded: &[DecodedField]) -> String {
    let m = &record.message;
    let mut lines = vec![
        "Off-chain attestation".to_string(),
        format!("  UID:        {}", record.uid),
        format!("  Schema:     {}", m.schema),
        format!("  Signer:     {}", record.signer.to_checksum(None)),
        format!("  Recipient:  {}", m.recipient.to_checksum(None)),
        format!("  Created:    {}", format_time(m.time)),
        format!("  Expires:    {}", format_time(m.expiration_time)),
        format!("  Revocable:  {}", m.revocable),
        format!(
            "  Domain:     {} v{} (chain {}, {})",
            record.domain.name,
            record.domain.version,
            record.domain.chain_id,
            record.domain.verifying_contract.to_checksum(None)
        ),
    ];
    if !m.ref_uid.is_zero() {
        lines.push(format!("  Ref UID:    {}", m.ref_uid));
    }
    push_decoded(&mut lines, decoded);
    lines.join("\n")
}

pub fn offchain_list(records: &[SignedOffchainAttestation]) -> String {
    if records.is_empty() {
        return "No off-chain attestations stored".to_string();
    }
    let mut lines = vec![format!("{} off-chain attestation(s)", records.len())];
    lines.extend(records.iter().map(|r| {
        format!(
            "  {}  schema {}  recipient {}  {}",
            r.uid,
            r.message.schema,
            r.message.recipient.to_checksum(None),
            format_time(r.message.time)
        )
    }));
    lines.join("\n")
}

pub fn signer(address: Address, balance: U256) -> String {
    format!("Signer {} ({})", address.to_checksum(None), format_eth(balance))
}

pub fn disclosure(proof: &DisclosureProof) -> String {
    let mut lines = vec![
        "Private data disclosure".to_string(),
        format!("  Root:       {}", proof.root),
        format!("  Leaves:     {}", proof.total_leaves),
        format!("  Proof:      {} hash(es)", proof.proof.len()),
        "  Fields:".to_string(),
    ];
    lines.extend(proof.fields.iter().map(|d| {
        format!(
            "    [{}] {} {} = {}",
            d.index, d.field.type_name, d.field.name, d.field.value
        )
    }));
    lines.join("\n")
}

pub fn validation_errors(errors: &[ValidationError]) -> String {
    let mut lines = vec![format!("{} configuration error(s)", errors.len())];
    lines.extend(errors.iter().map(|e| format!("  - {}", e)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, B256};

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "never");
        assert_eq!(format_time(1_700_000_000), "2023-11-14 22:13:20 UTC (1700000000)");
    }

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(U256::from(1_500_000_000_000_000_000u128)), "1.500000000000000000 ETH");
    }

    #[test]
    fn test_signer_report() {
        let address: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(
            signer(address, U256::ZERO),
            "Signer 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 (0.000000000000000000 ETH)"
        );
    }

    #[test]
    fn test_gas_plan_report() {
        let plan = GasPlan {
            estimated_gas: 100_000,
            gas_limit: 120_000,
            gas_price: 2_000_000_000,
        };
        let text = gas_plan("attestation", &plan);
        assert!(text.starts_with("Gas estimate for attestation"));
        assert!(text.contains("Gas limit:     120000"));
        assert!(text.contains("2.000000000 gwei"));
    }

    #[test]
    fn test_attestation_report() {
        let a = Attestation {
            uid: B256::repeat_byte(1),
            schema: B256::repeat_byte(2),
            time: 1_700_000_000,
            expirationTime: 0,
            revocationTime: 0,
            refUID: B256::ZERO,
            recipient: Address::repeat_byte(3),
            attester: Address::repeat_byte(4),
            revocable: true,
            data: Bytes::new(),
        };
        let text = attestation(&a, &[], Some(true));
        assert!(text.contains("Expires:    never"));
        assert!(text.contains("Valid:      true"));
        assert!(!text.contains("Ref UID"));
        assert!(!text.contains("Data:"));
    }

    #[test]
    fn test_schema_record_report() {
        let record = SchemaRecord {
            uid: B256::repeat_byte(1),
            resolver: Address::ZERO,
            revocable: false,
            schema: "bool ok".to_string(),
        };
        let text = schema_record(&record);
        assert!(text.contains("Resolver:  none"));
        assert!(text.contains("Schema:    bool ok"));
    }

    #[test]
    fn test_validation_errors_report() {
        let errors = vec![
            ValidationError::new("contracts.eas", "required"),
            ValidationError::new("schema.definition", "required"),
        ];
        assert_eq!(
            validation_errors(&errors),
            "2 configuration error(s)\n  - contracts.eas: required\n  - schema.definition: required"
        );
    }
}
