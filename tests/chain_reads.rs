//! Contract reads against a mock JSON-RPC node.

use alloy::dyn_abi::DynSolValue;
use alloy::hex;
use alloy::primitives::{Address, B256, U256};
use serde_json::{json, Value};

use eas_toolkit::blockchain::{BlockchainClient, BlockchainError, Wallet};
use eas_toolkit::eas::{EasClient, EasError, SchemaRegistryClient};

mod common;

const ANVIL_CHAIN_ID: &str = "0x7a69";

fn hex_result(bytes: Vec<u8>) -> Option<Value> {
    Some(Value::String(hex::encode_prefixed(bytes)))
}

/// ABI return data for a `SchemaRecord` struct.
fn schema_record(uid: B256, schema: &str) -> Vec<u8> {
    DynSolValue::Tuple(vec![DynSolValue::Tuple(vec![
        DynSolValue::FixedBytes(uid, 32),
        DynSolValue::Address(Address::ZERO),
        DynSolValue::Bool(true),
        DynSolValue::String(schema.to_string()),
    ])])
    .abi_encode_params()
}

/// ABI return data for an all-zero `Attestation` struct.
fn empty_attestation() -> Vec<u8> {
    DynSolValue::Tuple(vec![DynSolValue::Tuple(vec![
        DynSolValue::FixedBytes(B256::ZERO, 32),
        DynSolValue::FixedBytes(B256::ZERO, 32),
        DynSolValue::Uint(U256::ZERO, 64),
        DynSolValue::Uint(U256::ZERO, 64),
        DynSolValue::Uint(U256::ZERO, 64),
        DynSolValue::FixedBytes(B256::ZERO, 32),
        DynSolValue::Address(Address::ZERO),
        DynSolValue::Address(Address::ZERO),
        DynSolValue::Bool(false),
        DynSolValue::Bytes(Vec::new()),
    ])])
    .abi_encode_params()
}

#[tokio::test]
async fn test_failover_reaches_healthy_node() {
    let url = common::start_mock_rpc(|method, _| match method {
        "eth_chainId" => Some(json!(ANVIL_CHAIN_ID)),
        "eth_blockNumber" => Some(json!("0x10")),
        _ => None,
    })
    .await;

    let mut config = common::network_config(common::DEAD_RPC);
    config.failover_urls.push(url);
    let client = BlockchainClient::new(config).unwrap();

    assert_eq!(client.get_chain_id().await.unwrap().0, 31337);
    assert_eq!(client.get_block_number().await.unwrap(), 16);
    client.verify_chain_id().await.unwrap();
}

#[tokio::test]
async fn test_chain_id_mismatch_detected() {
    let url = common::start_mock_rpc(|method, _| match method {
        "eth_chainId" => Some(json!("0x1")),
        _ => None,
    })
    .await;

    let wallet = Wallet::from_private_key(common::TEST_PRIVATE_KEY, 31337).unwrap();
    let client = BlockchainClient::with_wallet(common::network_config(&url), &wallet).unwrap();
    let err = client.verify_chain_id().await.unwrap_err();
    assert!(matches!(
        err,
        BlockchainError::ChainMismatch {
            expected: 31337,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn test_get_schema_found_and_missing() {
    let known = B256::repeat_byte(0x42);
    let url = common::start_mock_rpc(move |method, params| match method {
        "eth_call" => {
            // The UID argument is the last 32 bytes of the calldata
            let call = params[0].to_string();
            if call.contains(&hex::encode(known)) {
                hex_result(schema_record(known, "uint256 eventId, uint8 voteIndex"))
            } else {
                hex_result(schema_record(B256::ZERO, ""))
            }
        }
        _ => None,
    })
    .await;

    let client = BlockchainClient::new(common::network_config(&url)).unwrap();
    let registry = SchemaRegistryClient::new(client, Address::repeat_byte(0x0a));

    let record = registry.get_schema(known).await.unwrap();
    assert_eq!(record.uid, known);
    assert_eq!(record.schema, "uint256 eventId, uint8 voteIndex");
    assert!(record.revocable);

    let missing = B256::repeat_byte(0x43);
    let err = registry.get_schema(missing).await.unwrap_err();
    assert!(matches!(err, EasError::SchemaNotFound(uid) if uid == missing));
}

#[tokio::test]
async fn test_unknown_attestation_is_not_found() {
    let url = common::start_mock_rpc(|method, _| match method {
        "eth_call" => hex_result(empty_attestation()),
        _ => None,
    })
    .await;

    let client = BlockchainClient::new(common::network_config(&url)).unwrap();
    let eas = EasClient::new(client, Address::repeat_byte(0x0e));
    let err = eas.get_attestation(B256::repeat_byte(1)).await.unwrap_err();
    assert!(matches!(err, EasError::AttestationNotFound(_)));
}

#[tokio::test]
async fn test_eas_version_and_validity() {
    let url = common::start_mock_rpc(|method, params| match method {
        "eth_call" => {
            let call = params[0].to_string();
            // version() selector
            if call.contains("54fd4d50") {
                hex_result(DynSolValue::Tuple(vec![DynSolValue::String("1.3.0".into())]).abi_encode_params())
            } else {
                hex_result(DynSolValue::Tuple(vec![DynSolValue::Bool(true)]).abi_encode_params())
            }
        }
        _ => None,
    })
    .await;

    let client = BlockchainClient::new(common::network_config(&url)).unwrap();
    let eas = EasClient::new(client, Address::repeat_byte(0x0e));
    assert_eq!(eas.version().await.unwrap(), "1.3.0");
    assert!(eas.is_valid(B256::repeat_byte(1)).await.unwrap());
}
