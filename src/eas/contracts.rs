//! Solidity bindings for the EAS and SchemaRegistry contracts.
//!
//! Only the parts of the ABI the toolkit calls are declared.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ISchemaRegistry {
        #[derive(Debug, PartialEq, Eq)]
        struct SchemaRecord {
            bytes32 uid;
            address resolver;
            bool revocable;
            string schema;
        }

        event Registered(bytes32 indexed uid, address indexed registerer, SchemaRecord schema);

        function register(string calldata schema, address resolver, bool revocable) external returns (bytes32);

        function getSchema(bytes32 uid) external view returns (SchemaRecord memory);
    }
}

sol! {
    #[sol(rpc)]
    interface IEAS {
        #[derive(Debug, PartialEq, Eq)]
        struct AttestationRequestData {
            address recipient;
            uint64 expirationTime;
            bool revocable;
            bytes32 refUID;
            bytes data;
            uint256 value;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct AttestationRequest {
            bytes32 schema;
            AttestationRequestData data;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct MultiAttestationRequest {
            bytes32 schema;
            AttestationRequestData[] data;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct RevocationRequestData {
            bytes32 uid;
            uint256 value;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct RevocationRequest {
            bytes32 schema;
            RevocationRequestData data;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Attestation {
            bytes32 uid;
            bytes32 schema;
            uint64 time;
            uint64 expirationTime;
            uint64 revocationTime;
            bytes32 refUID;
            address recipient;
            address attester;
            bool revocable;
            bytes data;
        }

        event Attested(address indexed recipient, address indexed attester, bytes32 uid, bytes32 indexed schemaUID);

        event Revoked(address indexed recipient, address indexed attester, bytes32 uid, bytes32 indexed schemaUID);

        event Timestamped(bytes32 indexed data, uint64 indexed timestamp);

        event RevokedOffchain(address indexed revoker, bytes32 indexed data, uint64 indexed timestamp);

        function attest(AttestationRequest calldata request) external payable returns (bytes32);

        function multiAttest(MultiAttestationRequest[] calldata multiRequests) external payable returns (bytes32[] memory);

        function revoke(RevocationRequest calldata request) external payable;

        function timestamp(bytes32 data) external returns (uint64);

        function revokeOffchain(bytes32 data) external returns (uint64);

        function getAttestation(bytes32 uid) external view returns (Attestation memory);

        function isAttestationValid(bytes32 uid) external view returns (bool);

        function getTimestamp(bytes32 data) external view returns (uint64);

        function getRevokeOffchain(address revoker, bytes32 data) external view returns (uint64);

        function version() external view returns (string memory);
    }
}
