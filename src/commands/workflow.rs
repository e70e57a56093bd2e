//! End-to-end workflow: schema → attest → review delay → check → revoke.

use std::time::Duration;

use alloy::primitives::B256;

use crate::commands::attest::{attested_report, submit};
use crate::commands::{CommandResult, Context};
use crate::config::Operation;
use crate::eas::EasClient;
use crate::report;

pub async fn run(ctx: &Context) -> CommandResult<()> {
    ctx.require(Operation::Workflow)?;
    let client = ctx.signing_client().await?;

    if let Some(signer) = client.signer() {
        let balance = client.get_balance(signer).await?;
        println!("{}", report::signer(signer, balance));
        if balance.is_zero() {
            tracing::warn!(signer = %signer, "Signer has no balance; transactions will fail");
        }
    }

    // 1. Schema
    let registry = ctx.registry(client.clone())?;
    let definition = ctx.schema_definition()?;
    let registration = registry
        .register(&definition, ctx.resolver()?, ctx.config.schema.revocable)
        .await?;
    println!("{}", report::registration(&registration));
    let schema = registration.uid();

    // 2. Attest
    let eas = ctx.eas(client)?;
    let params = ctx.attest_params(schema, ctx.encoded_data()?)?;
    let (uids, outcome) = submit(&eas, &params).await?;
    println!("{}", attested_report(&uids, &outcome));

    // 3. Review period
    let delay = Duration::from_secs(ctx.config.workflow.delay_secs);
    tracing::info!(delay_secs = delay.as_secs(), "Waiting before review");
    tokio::time::sleep(delay).await;

    // 4. Review
    for &uid in &uids {
        review(ctx, &eas, uid).await?;
    }

    // 5. Optional revocation
    if ctx.config.workflow.revoke_after {
        for &uid in &uids {
            let outcome = eas.revoke(uid).await?;
            println!("{}", report::tx_outcome(&format!("Attestation {} revoked", uid), &outcome));
            let valid = eas.is_valid(uid).await?;
            println!("  Valid after revocation: {}", valid);
        }
    }

    tracing::info!(attestations = uids.len(), "Workflow complete");
    Ok(())
}

async fn review(ctx: &Context, eas: &EasClient, uid: B256) -> CommandResult<()> {
    let attestation = eas.get_attestation(uid).await?;
    let valid = eas.is_valid(uid).await?;
    let decoded = ctx.decode_if_configured(attestation.schema, &attestation.data);
    println!("{}", report::attestation(&attestation, &decoded, Some(valid)));
    if !valid {
        tracing::warn!(uid = %uid, "Attestation is not valid after review delay");
    }
    Ok(())
}
