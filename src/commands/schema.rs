//! `validate` and `schema` commands.

use crate::cli::SchemaCommand;
use crate::commands::{parse_uid, CommandResult, Context};
use crate::config::Operation;
use crate::report;

/// Summary printed by `validate`. The config was already validated on load.
pub fn validate_report(ctx: &Context) -> CommandResult<String> {
    let config = &ctx.config;
    let mut lines = vec![
        "Configuration OK".to_string(),
        format!("  RPC:        {} (chain {})", config.network.rpc_url, config.network.chain_id),
    ];
    if !config.schema.definition.trim().is_empty() {
        lines.push(format!("  Schema:     {}", ctx.schema_definition()?));
        lines.push(format!("  Schema UID: {}", ctx.schema_uid()?));
    }
    lines.push(format!("  Recipients: {}", config.attestation.recipients.len()));
    lines.push(format!("  Store:      {}", config.storage.path));
    Ok(lines.join("\n"))
}

pub async fn run(ctx: &Context, action: SchemaCommand) -> CommandResult<()> {
    match action {
        SchemaCommand::Register { estimate } => register(ctx, estimate).await,
        SchemaCommand::Get { uid } => get(ctx, uid.as_deref()).await,
        SchemaCommand::Uid => {
            println!("{}", ctx.schema_uid()?);
            Ok(())
        }
    }
}

async fn register(ctx: &Context, estimate: bool) -> CommandResult<()> {
    ctx.require(Operation::RegisterSchema)?;
    let definition = ctx.schema_definition()?;
    let resolver = ctx.resolver()?;
    let revocable = ctx.config.schema.revocable;
    let registry = ctx.registry(ctx.signing_client().await?)?;

    if estimate {
        let plan = registry.estimate_register(&definition, resolver, revocable).await?;
        println!("{}", report::gas_plan("schema registration", &plan));
        return Ok(());
    }

    let registration = registry.register(&definition, resolver, revocable).await?;
    println!("{}", report::registration(&registration));
    Ok(())
}

async fn get(ctx: &Context, uid: Option<&str>) -> CommandResult<()> {
    ctx.require(Operation::ReadSchema)?;
    let uid = match uid {
        Some(uid) => parse_uid(uid)?,
        None => ctx.schema_uid()?,
    };
    let registry = ctx.registry(ctx.read_client()?)?;
    let record = registry.get_schema(uid).await?;
    println!("{}", report::schema_record(&record));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_validate_report() {
        let ctx = Context::new(
            parse_config("schema:\n  definition: \"bool ok\"\nattestation:\n  recipients: []\n").unwrap(),
        );
        let text = validate_report(&ctx).unwrap();
        assert!(text.starts_with("Configuration OK"));
        assert!(text.contains("Schema:     bool ok"));
        assert!(text.contains("Recipients: 0"));
    }

    #[test]
    fn test_validate_report_without_schema() {
        let ctx = Context::new(parse_config("").unwrap());
        let text = validate_report(&ctx).unwrap();
        assert!(!text.contains("Schema UID"));
    }

    #[tokio::test]
    async fn test_get_requires_registry() {
        let ctx = Context::new(parse_config("").unwrap());
        let err = get(&ctx, None).await.unwrap_err();
        assert!(err.to_string().contains("contracts.schema_registry"));
    }
}
