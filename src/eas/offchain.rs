//! Off-chain attestations: EIP-712 signing, UID derivation and verification.
//!
//! A signed off-chain attestation never touches the chain. Its UID can be
//! anchored later with `timestamp`, or marked revoked with `revokeOffchain`.

use alloy::primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::blockchain::Wallet;
use crate::eas::types::{unix_now, EasError, EasResult};
use crate::storage::StoredRecord;

/// EIP-712 domain name used by the EAS contract.
pub const EAS_DOMAIN_NAME: &str = "EAS Attestation";

/// Off-chain attestation format version (salted UIDs).
pub const OFFCHAIN_VERSION: u16 = 2;

const PRIMARY_TYPE: &str = "Attest";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Attest {
        uint16 version;
        bytes32 schema;
        address recipient;
        uint64 time;
        uint64 expirationTime;
        bool revocable;
        bytes32 refUID;
        bytes data;
        bytes32 salt;
    }
}

/// EIP-712 domain of an EAS deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl EasDomain {
    pub fn new(version: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: EAS_DOMAIN_NAME.to_string(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

/// The signed message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffchainMessage {
    pub version: u16,
    pub schema: B256,
    pub recipient: Address,
    pub time: u64,
    pub expiration_time: u64,
    pub revocable: bool,
    #[serde(rename = "refUID")]
    pub ref_uid: B256,
    pub data: Bytes,
    pub salt: B256,
}

impl OffchainMessage {
    fn typed(&self) -> Attest {
        Attest {
            version: self.version,
            schema: self.schema,
            recipient: self.recipient,
            time: self.time,
            expirationTime: self.expiration_time,
            revocable: self.revocable,
            refUID: self.ref_uid,
            data: self.data.clone(),
            salt: self.salt,
        }
    }

    /// EIP-712 hash the attester signs.
    pub fn signing_hash(&self, domain: &EasDomain) -> B256 {
        self.typed().eip712_signing_hash(&domain.eip712())
    }

    /// Off-chain UID of this message.
    pub fn uid(&self) -> B256 {
        offchain_uid(self)
    }
}

/// `{ v, r, s }` with `v` in `{27, 28}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl From<Signature> for OffchainSignature {
    fn from(sig: Signature) -> Self {
        Self {
            v: 27 + sig.v() as u8,
            r: sig.r().into(),
            s: sig.s().into(),
        }
    }
}

impl OffchainSignature {
    fn to_signature(self) -> EasResult<Signature> {
        let y_parity = match self.v {
            27 | 0 => false,
            28 | 1 => true,
            v => return Err(EasError::InvalidSignature(format!("bad recovery id {}", v))),
        };
        Ok(Signature::new(self.r.into(), self.s.into(), y_parity))
    }
}

/// A signed off-chain attestation, as persisted in the JSON store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOffchainAttestation {
    pub version: u16,
    pub uid: B256,
    pub domain: EasDomain,
    pub primary_type: String,
    pub message: OffchainMessage,
    pub signature: OffchainSignature,
    pub signer: Address,
}

impl SignedOffchainAttestation {
    /// Check the UID against the message and the signature against `signer`.
    /// Returns the recovered signer.
    pub fn verify(&self) -> EasResult<Address> {
        if self.primary_type != PRIMARY_TYPE {
            return Err(EasError::InvalidSignature(format!(
                "unexpected primary type '{}'",
                self.primary_type
            )));
        }
        let expected_uid = self.message.uid();
        if expected_uid != self.uid {
            return Err(EasError::InvalidSignature(format!(
                "uid {} does not match message (expected {})",
                self.uid, expected_uid
            )));
        }

        let hash = self.message.signing_hash(&self.domain);
        let recovered = self
            .signature
            .to_signature()?
            .recover_address_from_prehash(&hash)
            .map_err(|e| EasError::InvalidSignature(e.to_string()))?;
        if recovered != self.signer {
            return Err(EasError::InvalidSignature(format!(
                "signed by {}, expected {}",
                recovered, self.signer
            )));
        }
        Ok(recovered)
    }
}

impl StoredRecord for SignedOffchainAttestation {
    fn uid(&self) -> B256 {
        self.uid
    }
}

/// What to attest off-chain. `time` and `salt` are filled at signing when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffchainAttestationParams {
    pub schema: B256,
    pub recipient: Address,
    pub expiration_time: u64,
    pub revocable: bool,
    pub ref_uid: B256,
    pub data: Bytes,
    pub time: Option<u64>,
    pub salt: Option<B256>,
}

impl OffchainAttestationParams {
    pub fn message(&self) -> OffchainMessage {
        OffchainMessage {
            version: OFFCHAIN_VERSION,
            schema: self.schema,
            recipient: self.recipient,
            time: self.time.unwrap_or_else(unix_now),
            expiration_time: self.expiration_time,
            revocable: self.revocable,
            ref_uid: self.ref_uid,
            data: self.data.clone(),
            salt: self.salt.unwrap_or_else(random_salt),
        }
    }

    /// Sign with `wallet` under `domain`.
    pub async fn sign(
        &self,
        wallet: &Wallet,
        domain: EasDomain,
    ) -> EasResult<SignedOffchainAttestation> {
        let message = self.message();
        let hash = message.signing_hash(&domain);
        let signature = wallet.sign_hash(hash).await?;
        let uid = message.uid();

        tracing::debug!(uid = %uid, signer = %wallet.address(), "Signed off-chain attestation");

        Ok(SignedOffchainAttestation {
            version: OFFCHAIN_VERSION,
            uid,
            domain,
            primary_type: PRIMARY_TYPE.to_string(),
            message,
            signature: signature.into(),
            signer: wallet.address(),
        })
    }
}

fn random_salt() -> B256 {
    let mut salt = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut salt);
    B256::from(salt)
}

/// `keccak256(abi.encodePacked(version, bytes(hex(schema)), recipient,
/// address(0), time, expirationTime, revocable, refUID, data, salt, uint32(0)))`.
pub fn offchain_uid(message: &OffchainMessage) -> B256 {
    let schema_hex = message.schema.to_string();
    let mut packed = Vec::with_capacity(160 + schema_hex.len() + message.data.len());
    packed.extend_from_slice(&message.version.to_be_bytes());
    packed.extend_from_slice(schema_hex.as_bytes());
    packed.extend_from_slice(message.recipient.as_slice());
    packed.extend_from_slice(Address::ZERO.as_slice());
    packed.extend_from_slice(&message.time.to_be_bytes());
    packed.extend_from_slice(&message.expiration_time.to_be_bytes());
    packed.push(message.revocable as u8);
    packed.extend_from_slice(message.ref_uid.as_slice());
    packed.extend_from_slice(&message.data);
    packed.extend_from_slice(message.salt.as_slice());
    packed.extend_from_slice(&0u32.to_be_bytes());
    keccak256(&packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn params() -> OffchainAttestationParams {
        OffchainAttestationParams {
            schema: B256::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            expiration_time: 0,
            revocable: true,
            ref_uid: B256::ZERO,
            data: Bytes::from_static(&[0xde, 0xad]),
            time: Some(1_700_000_000),
            salt: Some(B256::repeat_byte(0x33)),
        }
    }

    fn domain() -> EasDomain {
        EasDomain::new("1.3.0", 31337, Address::repeat_byte(0x44))
    }

    fn wallet() -> Wallet {
        Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap()
    }

    #[test]
    fn test_message_fills_time_and_salt() {
        let mut p = params();
        p.time = None;
        p.salt = None;
        let a = p.message();
        let b = p.message();
        assert!(a.time >= 1_700_000_000);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.uid(), b.uid());
    }

    #[test]
    fn test_uid_is_deterministic_and_salted() {
        let message = params().message();
        assert_eq!(message.uid(), params().message().uid());

        let mut other = params();
        other.salt = Some(B256::repeat_byte(0x34));
        assert_ne!(message.uid(), other.message().uid());
    }

    #[test]
    fn test_known_answer_uid_and_signing_hash() {
        let message = params().message();
        assert_eq!(
            message.uid(),
            "0x3d84aaafd545c72f843c16d2470814e0fd79e2df24bc12b05053163edb600fd1"
                .parse::<B256>()
                .unwrap()
        );
        assert_eq!(
            domain().eip712().separator(),
            "0xe9315fb67482db910c485cb2143c84b82967bcc3d6390ab443be257f80ffa7d4"
                .parse::<B256>()
                .unwrap()
        );
        assert_eq!(
            message.signing_hash(&domain()),
            "0x851233b9ba43e010f84f1ee3b004dedabc867de922dbc2f74489727a75c23dac"
                .parse::<B256>()
                .unwrap()
        );
    }

    #[test]
    fn test_signing_hash_depends_on_domain() {
        let message = params().message();
        let other_chain = EasDomain::new("1.3.0", 1, Address::repeat_byte(0x44));
        assert_ne!(message.signing_hash(&domain()), message.signing_hash(&other_chain));
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let wallet = wallet();
        let signed = params().sign(&wallet, domain()).await.unwrap();
        assert_eq!(signed.primary_type, "Attest");
        assert_eq!(signed.version, 2);
        assert!(signed.signature.v == 27 || signed.signature.v == 28);
        assert_eq!(signed.verify().unwrap(), wallet.address());
    }

    #[tokio::test]
    async fn test_verify_rejects_tampering() {
        let signed = params().sign(&wallet(), domain()).await.unwrap();

        let mut changed_data = signed.clone();
        changed_data.message.data = Bytes::from_static(&[0xbe, 0xef]);
        assert!(changed_data.verify().is_err());

        // Consistent uid, but the signature no longer covers the message
        let mut resigned_uid = changed_data.clone();
        resigned_uid.uid = resigned_uid.message.uid();
        assert!(matches!(resigned_uid.verify(), Err(EasError::InvalidSignature(_))));

        let mut wrong_signer = signed.clone();
        wrong_signer.signer = Address::repeat_byte(0x99);
        assert!(wrong_signer.verify().is_err());

        let mut bad_v = signed;
        bad_v.signature.v = 30;
        assert!(bad_v.verify().is_err());
    }

    #[tokio::test]
    async fn test_json_shape() {
        let signed = params().sign(&wallet(), domain()).await.unwrap();
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["primaryType"], "Attest");
        assert_eq!(json["domain"]["name"], "EAS Attestation");
        assert_eq!(json["domain"]["chainId"], 31337);
        assert!(json["message"]["refUID"].is_string());
        assert!(json["message"]["expirationTime"].is_number());
        assert!(json["signature"]["v"].is_number());

        let back: SignedOffchainAttestation = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
