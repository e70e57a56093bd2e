//! Off-chain signing, the local store, and private data proofs end to end.

use std::collections::BTreeMap;

use alloy::primitives::{Address, B256};
use serde_json::json;

use eas_toolkit::blockchain::Wallet;
use eas_toolkit::eas::offchain::EasDomain;
use eas_toolkit::eas::{
    DisclosureProof, OffchainAttestationParams, PrivateData, PrivateField, SchemaDefinition,
    SignedOffchainAttestation,
};
use eas_toolkit::storage::{InsertOutcome, JsonStore};

mod common;

fn wallet() -> Wallet {
    Wallet::from_private_key(common::TEST_PRIVATE_KEY, 31337).unwrap()
}

fn domain() -> EasDomain {
    EasDomain::new(
        "1.3.0",
        31337,
        "0xC2679fBD37d54388Ce493F1DB75320D236e1815e".parse().unwrap(),
    )
}

fn vote(recipient: Address) -> OffchainAttestationParams {
    let schema = SchemaDefinition::parse("uint256 eventId, uint8 voteIndex").unwrap();
    let values = BTreeMap::from([
        ("eventId".to_string(), json!(1)),
        ("voteIndex".to_string(), json!(3)),
    ]);
    OffchainAttestationParams {
        schema: schema.uid(Address::ZERO, true),
        recipient,
        expiration_time: 0,
        revocable: true,
        ref_uid: B256::ZERO,
        data: schema.encode(&values).unwrap(),
        time: None,
        salt: None,
    }
}

#[tokio::test]
async fn test_signed_attestations_survive_the_store() {
    let wallet = wallet();
    let store = JsonStore::<SignedOffchainAttestation>::new(common::temp_path("store.json"));

    let first = vote(Address::repeat_byte(1)).sign(&wallet, domain()).await.unwrap();
    let second = vote(Address::repeat_byte(2)).sign(&wallet, domain()).await.unwrap();
    assert_ne!(first.uid, second.uid);

    assert_eq!(store.insert(&first).unwrap(), InsertOutcome::Inserted);
    assert_eq!(store.insert(&second).unwrap(), InsertOutcome::Inserted);
    assert_eq!(store.insert(&first).unwrap(), InsertOutcome::Duplicate);

    // A new handle reads what an earlier run wrote
    let reopened = JsonStore::<SignedOffchainAttestation>::new(store.path());
    let records = reopened.list().unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.verify().unwrap(), wallet.address());
    }

    let found = reopened.find(second.uid).unwrap().unwrap();
    let schema = SchemaDefinition::parse("uint256 eventId, uint8 voteIndex").unwrap();
    let decoded = schema.decode(&found.message.data).unwrap();
    assert_eq!(decoded[1].to_string(), "uint8 voteIndex = 3");
}

#[tokio::test]
async fn test_edited_store_record_fails_verification() {
    let store = JsonStore::<SignedOffchainAttestation>::new(common::temp_path("store.json"));
    let signed = vote(Address::repeat_byte(1)).sign(&wallet(), domain()).await.unwrap();
    store.insert(&signed).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    // All-digit addresses serialize the same with or without checksum casing
    let tampered = text.replace(
        &Address::repeat_byte(1).to_string(),
        &Address::repeat_byte(9).to_string(),
    );
    assert_ne!(tampered, text);
    std::fs::write(store.path(), tampered).unwrap();

    let record = store.find(signed.uid).unwrap().unwrap();
    assert!(record.verify().is_err());
}

#[test]
fn test_private_data_disclosure_round_trip_through_json() {
    let fields = vec![
        PrivateField { name: "name".into(), type_name: "string".into(), value: json!("Alice") },
        PrivateField { name: "age".into(), type_name: "uint8".into(), value: json!(30) },
        PrivateField { name: "isMember".into(), type_name: "bool".into(), value: json!(true) },
        PrivateField { name: "country".into(), type_name: "string".into(), value: json!("NZ") },
    ];
    let data = PrivateData::new(fields).unwrap();
    let proof = data.disclose(&["isMember".to_string(), "name".to_string()]).unwrap();

    let text = serde_json::to_string_pretty(&proof).unwrap();
    assert!(!text.contains("\"age\""));
    assert!(!text.contains("NZ"));

    let parsed: DisclosureProof = serde_json::from_str(&text).unwrap();
    parsed.verify_against(data.root()).unwrap();
}
