//! On-chain `attest`, `get` and `revoke` commands.

use alloy::primitives::B256;

use crate::commands::{total_value, CommandResult, Context};
use crate::config::Operation;
use crate::eas::attestation::{AttestParams, TxOutcome};
use crate::eas::EasClient;
use crate::report;

pub async fn attest(ctx: &Context, estimate: bool) -> CommandResult<()> {
    ctx.require(Operation::Attest)?;
    let schema = ctx.schema_uid()?;
    let params = ctx.attest_params(schema, ctx.encoded_data()?)?;
    let eas = ctx.eas(ctx.signing_client().await?)?;

    if estimate {
        let plan = eas.estimate_attest(&params).await?;
        let operation = format!("{} attestation(s)", params.len());
        println!("{}", report::gas_plan(&operation, &plan));
        return Ok(());
    }

    let (uids, outcome) = submit(&eas, &params).await?;
    println!("{}", attested_report(&uids, &outcome));
    Ok(())
}

/// `attest` for one recipient, `multiAttest` for several.
pub(crate) async fn submit(
    eas: &EasClient,
    params: &[AttestParams],
) -> CommandResult<(Vec<B256>, TxOutcome)> {
    tracing::debug!(count = params.len(), value = %total_value(params), "Submitting attestations");
    match params {
        [single] => {
            let (uid, outcome) = eas.attest(single).await?;
            Ok((vec![uid], outcome))
        }
        _ => Ok(eas.multi_attest(params).await?),
    }
}

pub(crate) fn attested_report(uids: &[B256], outcome: &TxOutcome) -> String {
    let mut text = report::tx_outcome(&format!("{} attestation(s) created", uids.len()), outcome);
    for uid in uids {
        text.push_str(&format!("\n  UID:       {}", uid));
    }
    text
}

pub async fn get(ctx: &Context, uid: B256) -> CommandResult<()> {
    ctx.require(Operation::ReadAttestation)?;
    let eas = ctx.eas(ctx.read_client()?)?;
    let attestation = eas.get_attestation(uid).await?;
    let valid = eas.is_valid(uid).await?;
    let decoded = ctx.decode_data(attestation.schema, &attestation.data).await;
    println!("{}", report::attestation(&attestation, &decoded, Some(valid)));
    Ok(())
}

pub async fn revoke(ctx: &Context, uid: B256, estimate: bool) -> CommandResult<()> {
    ctx.require(Operation::Revoke)?;
    let eas = ctx.eas(ctx.signing_client().await?)?;

    if estimate {
        let plan = eas.estimate_revoke(uid).await?;
        println!("{}", report::gas_plan("revocation", &plan));
        return Ok(());
    }

    let outcome = eas.revoke(uid).await?;
    println!("{}", report::tx_outcome(&format!("Attestation {} revoked", uid), &outcome));
    Ok(())
}
