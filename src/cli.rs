//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "eas-toolkit")]
#[command(version, about = "Ethereum Attestation Service toolkit", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, default_value = "eas.yaml")]
    pub config: PathBuf,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and validate the configuration
    Validate,
    /// Schema registration and lookup
    Schema {
        #[command(subcommand)]
        action: SchemaCommand,
    },
    /// Attest on chain to every configured recipient
    Attest {
        /// Only estimate gas
        #[arg(long)]
        estimate: bool,
    },
    /// Show an on-chain attestation
    Get { uid: String },
    /// Revoke an on-chain attestation
    Revoke {
        uid: String,
        /// Only estimate gas
        #[arg(long)]
        estimate: bool,
    },
    /// Off-chain attestations
    Offchain {
        #[command(subcommand)]
        action: OffchainCommand,
    },
    /// Private data (Merkle tree) attestations
    PrivateData {
        #[command(subcommand)]
        action: PrivateDataCommand,
    },
    /// Register, attest, wait, check and optionally revoke
    Workflow,
}

#[derive(Debug, Subcommand)]
pub enum SchemaCommand {
    /// Register the configured schema
    Register {
        #[arg(long)]
        estimate: bool,
    },
    /// Show a registered schema (defaults to the configured one)
    Get { uid: Option<String> },
    /// Print the UID of the configured schema
    Uid,
}

#[derive(Debug, Subcommand)]
pub enum OffchainCommand {
    /// Sign an off-chain attestation for every configured recipient
    Sign {
        /// Print without saving to the store
        #[arg(long)]
        no_store: bool,
    },
    /// List stored off-chain attestations
    List,
    /// Show a stored off-chain attestation
    Show { uid: String },
    /// Verify the UID and signature of a stored off-chain attestation
    Verify { uid: String },
    /// Anchor an off-chain attestation UID on chain
    Timestamp {
        uid: String,
        #[arg(long)]
        estimate: bool,
    },
    /// Record the revocation of an off-chain attestation on chain
    Revoke {
        uid: String,
        #[arg(long)]
        estimate: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PrivateDataCommand {
    /// Print the Merkle root of the configured private fields
    Root,
    /// Sign an off-chain attestation of the root and store it
    Commit,
    /// Write a disclosure proof for some fields
    Prove {
        /// Field to disclose (repeatable)
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
        /// Output file (default: <proofs_dir>/<root>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a disclosure proof file
    Verify {
        file: PathBuf,
        /// Root the proof must match
        #[arg(long)]
        root: Option<String>,
    },
}
