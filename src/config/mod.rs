//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (format checks, then per-operation existence checks)
//!     → ToolkitConfig (validated, immutable)
//!     → handed to the command being run
//! ```
//!
//! # Design Decisions
//! - Config is read once per invocation; commands never write it back
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets stay in the environment; the file only names the variable

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AttestationConfig, ContractsConfig, NetworkConfig, PrivateDataConfig, PrivateFieldConfig,
    SchemaConfig, StorageConfig, ToolkitConfig, WorkflowConfig,
};
pub use validation::{validate_config, validate_for, Operation, ValidationError};
