//! `offchain` commands: sign, list, show, verify, and on-chain anchoring.

use alloy::primitives::{Address, Bytes, B256};

use crate::blockchain::Wallet;
use crate::cli::OffchainCommand;
use crate::commands::{parse_uid, CommandError, CommandResult, Context};
use crate::config::Operation;
use crate::eas::{EasDomain, OffchainAttestationParams, SignedOffchainAttestation};
use crate::report;
use crate::storage::InsertOutcome;

pub async fn run(ctx: &Context, action: OffchainCommand) -> CommandResult<()> {
    match action {
        OffchainCommand::Sign { no_store } => sign(ctx, !no_store).await,
        OffchainCommand::List => {
            println!("{}", report::offchain_list(&ctx.store().list()?));
            Ok(())
        }
        OffchainCommand::Show { uid } => show(ctx, parse_uid(&uid)?),
        OffchainCommand::Verify { uid } => verify(ctx, parse_uid(&uid)?),
        OffchainCommand::Timestamp { uid, estimate } => {
            timestamp(ctx, parse_uid(&uid)?, estimate).await
        }
        OffchainCommand::Revoke { uid, estimate } => revoke(ctx, parse_uid(&uid)?, estimate).await,
    }
}

/// Sign one off-chain attestation per recipient, all sharing `schema` and `data`.
pub(crate) async fn sign_for_recipients(
    ctx: &Context,
    wallet: &Wallet,
    domain: &EasDomain,
    schema: B256,
    data: Bytes,
    recipients: &[Address],
) -> CommandResult<Vec<SignedOffchainAttestation>> {
    let att = &ctx.config.attestation;
    let ref_uid = crate::config::validation::parse_bytes32("attestation.ref_uid", &att.ref_uid)?;
    let mut signed = Vec::with_capacity(recipients.len());
    for &recipient in recipients {
        let params = OffchainAttestationParams {
            schema,
            recipient,
            expiration_time: att.expiration_time,
            revocable: att.revocable,
            ref_uid,
            data: data.clone(),
            time: None,
            salt: None,
        };
        signed.push(params.sign(wallet, domain.clone()).await?);
    }
    Ok(signed)
}

/// Print each record and save it unless `persist` is false.
pub(crate) fn report_and_store(
    ctx: &Context,
    records: &[SignedOffchainAttestation],
    persist: bool,
) -> CommandResult<()> {
    let store = ctx.store();
    for record in records {
        let decoded = ctx.decode_if_configured(record.message.schema, &record.message.data);
        println!("{}", report::offchain(record, &decoded));
        if !persist {
            continue;
        }
        match store.insert(record)? {
            InsertOutcome::Inserted => println!("  Stored in:  {}", store.path().display()),
            InsertOutcome::Duplicate => println!("  Already stored, left unchanged"),
        }
    }
    Ok(())
}

async fn sign(ctx: &Context, persist: bool) -> CommandResult<()> {
    ctx.require(Operation::OffchainSign)?;
    let schema = ctx.schema_uid()?;
    let data = ctx.encoded_data()?;
    let recipients: Vec<Address> = ctx
        .attest_params(schema, data.clone())?
        .iter()
        .map(|p| p.recipient)
        .collect();

    let wallet = ctx.wallet()?;
    let eas = ctx.eas(ctx.read_client()?)?;
    let domain = ctx.domain(&eas).await?;

    let records = sign_for_recipients(ctx, &wallet, &domain, schema, data, &recipients).await?;
    report_and_store(ctx, &records, persist)
}

fn stored(ctx: &Context, uid: B256) -> CommandResult<SignedOffchainAttestation> {
    ctx.store().find(uid)?.ok_or(CommandError::NotStored(uid))
}

fn show(ctx: &Context, uid: B256) -> CommandResult<()> {
    let record = stored(ctx, uid)?;
    let decoded = ctx.decode_if_configured(record.message.schema, &record.message.data);
    println!("{}", report::offchain(&record, &decoded));
    Ok(())
}

fn verify(ctx: &Context, uid: B256) -> CommandResult<()> {
    let record = stored(ctx, uid)?;
    let signer = record.verify()?;
    if record.domain.chain_id != ctx.config.network.chain_id {
        tracing::warn!(
            signed_chain = record.domain.chain_id,
            configured_chain = ctx.config.network.chain_id,
            "Attestation was signed for a different chain"
        );
    }
    println!("Off-chain attestation {} is valid", uid);
    println!("  Signer:     {}", signer.to_checksum(None));
    Ok(())
}

async fn timestamp(ctx: &Context, uid: B256, estimate: bool) -> CommandResult<()> {
    ctx.require(Operation::OffchainAnchor)?;
    warn_if_unknown(ctx, uid)?;
    let eas = ctx.eas(ctx.signing_client().await?)?;

    if estimate {
        let plan = eas.estimate_timestamp(uid).await?;
        println!("{}", report::gas_plan("timestamp", &plan));
        return Ok(());
    }

    let existing = eas.get_timestamp(uid).await?;
    if existing != 0 {
        println!("{} already timestamped at {}", uid, report::format_time(existing));
        return Ok(());
    }

    let (time, outcome) = eas.timestamp(uid).await?;
    println!("{}", report::tx_outcome(&format!("Timestamped {}", uid), &outcome));
    println!("  Time:      {}", report::format_time(time));
    Ok(())
}

async fn revoke(ctx: &Context, uid: B256, estimate: bool) -> CommandResult<()> {
    ctx.require(Operation::OffchainAnchor)?;
    if let Some(record) = ctx.store().find(uid)? {
        if !record.message.revocable {
            return Err(crate::eas::EasError::NotRevocable(uid).into());
        }
    } else {
        tracing::warn!(uid = %uid, "UID is not in the local store");
    }
    let eas = ctx.eas(ctx.signing_client().await?)?;

    if estimate {
        let plan = eas.estimate_revoke_offchain(uid).await?;
        println!("{}", report::gas_plan("off-chain revocation", &plan));
        return Ok(());
    }

    if let Some(revoker) = eas.blockchain().signer() {
        let existing = eas.get_revoke_offchain(revoker, uid).await?;
        if existing != 0 {
            return Err(crate::eas::EasError::AlreadyRevoked(uid).into());
        }
    }

    let (time, outcome) = eas.revoke_offchain(uid).await?;
    println!("{}", report::tx_outcome(&format!("Revoked off-chain attestation {}", uid), &outcome));
    println!("  Time:      {}", report::format_time(time));
    Ok(())
}

fn warn_if_unknown(ctx: &Context, uid: B256) -> CommandResult<()> {
    if ctx.store().find(uid)?.is_none() {
        tracing::warn!(uid = %uid, "UID is not in the local store");
    }
    Ok(())
}
