//! `private-data` commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::{Address, B256};

use crate::cli::PrivateDataCommand;
use crate::commands::offchain::{report_and_store, sign_for_recipients};
use crate::commands::{parse_uid, CommandError, CommandResult, Context};
use crate::config::validation::{parse_address, parse_bytes32};
use crate::config::Operation;
use crate::eas::private_data::PRIVATE_DATA_SCHEMA;
use crate::eas::{DisclosureProof, PrivateData, PrivateField, SchemaDefinition};
use crate::report;

pub async fn run(ctx: &Context, action: PrivateDataCommand) -> CommandResult<()> {
    match action {
        PrivateDataCommand::Root => {
            let data = private_data(ctx)?;
            println!("Private data root: {}", data.root());
            println!("  Fields:     {}", data.fields().len());
            Ok(())
        }
        PrivateDataCommand::Commit => commit(ctx).await,
        PrivateDataCommand::Prove { fields, out } => prove(ctx, &fields, out),
        PrivateDataCommand::Verify { file, root } => {
            let root = root.as_deref().map(parse_uid).transpose()?;
            let proof = verify_file(&file, root)?;
            println!("{}", report::disclosure(&proof));
            println!("Proof is valid");
            Ok(())
        }
    }
}

fn private_data(ctx: &Context) -> CommandResult<PrivateData> {
    let fields = ctx
        .config
        .private_data
        .fields
        .iter()
        .map(PrivateField::from)
        .collect();
    Ok(PrivateData::new(fields)?)
}

/// ABI data attesting `root` under the `bytes32 privateData` schema.
pub fn root_attestation_data(root: B256) -> CommandResult<alloy::primitives::Bytes> {
    let schema = SchemaDefinition::parse(PRIVATE_DATA_SCHEMA)?;
    let values = BTreeMap::from([(
        "privateData".to_string(),
        serde_json::Value::String(root.to_string()),
    )]);
    Ok(schema.encode(&values)?)
}

async fn commit(ctx: &Context) -> CommandResult<()> {
    ctx.require(Operation::PrivateDataCommit)?;
    let data = private_data(ctx)?;
    let root = data.root();
    let schema = parse_bytes32(
        "private_data.schema_uid",
        ctx.config.private_data.schema_uid.as_deref().unwrap_or_default(),
    )?;

    // Without recipients the root is attested to nobody in particular
    let recipients = if ctx.config.attestation.recipients.is_empty() {
        vec![Address::ZERO]
    } else {
        ctx.config
            .attestation
            .recipients
            .iter()
            .enumerate()
            .map(|(i, r)| parse_address(&format!("attestation.recipients[{}]", i), r))
            .collect::<Result<Vec<_>, _>>()?
    };

    let wallet = ctx.wallet()?;
    let eas = ctx.eas(ctx.read_client()?)?;
    let domain = ctx.domain(&eas).await?;

    tracing::info!(root = %root, fields = data.fields().len(), "Committing private data root");
    let records = sign_for_recipients(
        ctx,
        &wallet,
        &domain,
        schema,
        root_attestation_data(root)?,
        &recipients,
    )
    .await?;
    println!("Private data root: {}", root);
    report_and_store(ctx, &records, true)
}

fn prove(ctx: &Context, fields: &[String], out: Option<PathBuf>) -> CommandResult<()> {
    ctx.require(Operation::PrivateDataProve)?;
    let proof = private_data(ctx)?.disclose(fields)?;
    let path = out.unwrap_or_else(|| {
        Path::new(&ctx.config.storage.proofs_dir).join(format!("{}.json", proof.root))
    });
    write_proof(&path, &proof)?;
    println!("{}", report::disclosure(&proof));
    println!("Proof written to {}", path.display());
    Ok(())
}

pub fn write_proof(path: &Path, proof: &DisclosureProof) -> CommandResult<()> {
    let io_error = |source: std::io::Error| CommandError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(proof).map_err(|source| CommandError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json + "\n").map_err(io_error)?;
    tracing::info!(path = %path.display(), "Wrote disclosure proof");
    Ok(())
}

/// Read a proof file and check it, optionally against an expected root.
pub fn verify_file(path: &Path, root: Option<B256>) -> CommandResult<DisclosureProof> {
    let text = fs::read_to_string(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let proof: DisclosureProof =
        serde_json::from_str(&text).map_err(|source| CommandError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    match root {
        Some(root) => proof.verify_against(root)?,
        None => proof.verify()?,
    }
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const CONFIG: &str = r#"
private_data:
  schema_uid: "0x2222222222222222222222222222222222222222222222222222222222222222"
  fields:
    - { name: name, type: string, value: Alice }
    - { name: age, type: uint8, value: 30 }
    - { name: member, type: bool, value: true }
"#;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("eas-toolkit-proofs-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_prove_then_verify_file() {
        let mut ctx = Context::new(parse_config(CONFIG).unwrap());
        let dir = temp_dir();
        ctx.config.storage.proofs_dir = dir.display().to_string();

        prove(&ctx, &["age".to_string()], None).unwrap();
        let root = private_data(&ctx).unwrap().root();
        let path = dir.join(format!("{}.json", root));
        assert!(path.exists());

        let proof = verify_file(&path, Some(root)).unwrap();
        assert_eq!(proof.fields.len(), 1);
        assert_eq!(proof.fields[0].field.name, "age");
        assert!(verify_file(&path, Some(B256::ZERO)).is_err());
    }

    #[test]
    fn test_verify_rejects_edited_file() {
        let ctx = Context::new(parse_config(CONFIG).unwrap());
        let path = temp_dir().join("edited.json");
        prove(&ctx, &["name".to_string()], Some(path.clone())).unwrap();

        let text = fs::read_to_string(&path).unwrap().replace("Alice", "Mallory");
        fs::write(&path, text).unwrap();
        assert!(matches!(verify_file(&path, None), Err(CommandError::Eas(_))));
    }

    #[test]
    fn test_verify_missing_file() {
        let err = verify_file(Path::new("/nonexistent/proof.json"), None).unwrap_err();
        assert!(matches!(err, CommandError::Io { .. }));
    }

    #[test]
    fn test_root_attestation_data_is_the_root_word() {
        let root = B256::repeat_byte(0xab);
        let data = root_attestation_data(root).unwrap();
        assert_eq!(data.as_ref(), root.as_slice());
    }
}
