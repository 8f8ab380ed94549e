//! hourglass — command-line front end for building, signing and verifying
//! coin-hour transactions.
//!
//! Works offline against a JSON snapshot of unspent outputs (an array of
//! `{hash, address, coins, hours, created_at}` objects). Keys are derived
//! from a hex seed given with `--seed` or `HOURGLASS_SEED`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

use hourglass_core::droplet;
use hourglass_core::encoding;
use hourglass_core::traits::UnspentPool;
use hourglass_core::types::Transaction;
use hourglass_core::validation::SignatureMode;
use hourglass_wallet::{Seed, SpendRequest, Wallet};

mod settings;

use settings::Settings;

/// Hourglass offline wallet tool.
#[derive(Parser)]
#[command(name = "hourglass")]
#[command(version, about = "Build, sign and verify coin-hour transactions.")]
struct Cli {
    /// Settings file (default: <config dir>/hourglass/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verification profile: user, ledger, preview or a configured name.
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the addresses derived from a seed.
    Address(SeedArgs),
    /// Show coins and accrued hours held by a seed's addresses.
    Balance(BalanceArgs),
    /// Build (and by default sign) a transaction from a spend request.
    Create(CreateArgs),
    /// Sign some or all inputs of an encoded transaction.
    Sign(SignArgs),
    /// Verify an encoded transaction against a snapshot.
    Verify(VerifyArgs),
    /// Print an encoded transaction as JSON.
    Decode(DecodeArgs),
}

#[derive(Args)]
struct SeedArgs {
    /// Hex-encoded 32-byte seed. Falls back to HOURGLASS_SEED.
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Args)]
struct BalanceArgs {
    #[command(flatten)]
    seed: SeedArgs,

    /// Snapshot of unspent outputs (JSON).
    #[arg(long)]
    snapshot: PathBuf,

    /// Unix time to accrue hours to (default: now).
    #[arg(long)]
    now: Option<u64>,
}

#[derive(Args)]
struct CreateArgs {
    #[command(flatten)]
    seed: SeedArgs,

    /// Snapshot of unspent outputs (JSON).
    #[arg(long)]
    snapshot: PathBuf,

    /// Spend request (JSON).
    #[arg(long)]
    request: PathBuf,

    /// Unix time to accrue hours to (default: now).
    #[arg(long)]
    now: Option<u64>,

    /// Leave all signatures null, overriding the request.
    #[arg(long)]
    unsigned: bool,
}

#[derive(Args)]
struct SignArgs {
    #[command(flatten)]
    seed: SeedArgs,

    /// Snapshot of unspent outputs (JSON).
    #[arg(long)]
    snapshot: PathBuf,

    /// Hex-encoded transaction.
    #[arg(long)]
    tx: String,

    /// Input index to sign; repeat for several. Default: every input with a key.
    #[arg(long = "index")]
    indexes: Vec<usize>,
}

#[derive(Args)]
struct VerifyArgs {
    /// Snapshot of unspent outputs (JSON).
    #[arg(long)]
    snapshot: PathBuf,

    /// Hex-encoded transaction.
    #[arg(long)]
    tx: String,

    /// Unix time to accrue hours to (default: now).
    #[arg(long)]
    now: Option<u64>,

    /// Require every signature to be null instead of valid.
    #[arg(long)]
    unsigned: bool,
}

#[derive(Args)]
struct DecodeArgs {
    /// Hex-encoded transaction.
    #[arg(long)]
    tx: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(&settings.log_level, &settings.log_format);
    debug!(?settings, "loaded settings");

    let profile_name = cli.profile.as_deref();
    match cli.command {
        Commands::Address(args) => cmd_address(&settings, profile_name, args),
        Commands::Balance(args) => cmd_balance(&settings, profile_name, args),
        Commands::Create(args) => cmd_create(&settings, profile_name, args),
        Commands::Sign(args) => cmd_sign(&settings, profile_name, args),
        Commands::Verify(args) => cmd_verify(&settings, profile_name, args),
        Commands::Decode(args) => cmd_decode(args),
    }
}

/// Initialize tracing on stderr so stdout stays machine-readable.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn cmd_address(settings: &Settings, profile: Option<&str>, args: SeedArgs) -> Result<()> {
    let wallet = load_wallet(settings, profile, &args)?;
    for address in wallet.addresses() {
        println!("{address}");
    }
    Ok(())
}

fn cmd_balance(settings: &Settings, profile: Option<&str>, args: BalanceArgs) -> Result<()> {
    let wallet = load_wallet(settings, profile, &args.seed)?;
    let snapshot = read_snapshot(&args.snapshot)?;
    let now = resolve_now(args.now)?;

    let balance = wallet.balance(&snapshot, now).context("Failed to compute balance")?;
    print_json(&json!({
        "coins": droplet::format(balance.coins),
        "hours": balance.hours.to_string(),
        "outputs": balance.outputs,
    }))
}

fn cmd_create(settings: &Settings, profile: Option<&str>, args: CreateArgs) -> Result<()> {
    let wallet = load_wallet(settings, profile, &args.seed)?;
    let snapshot = read_snapshot(&args.snapshot)?;
    let now = resolve_now(args.now)?;

    let text = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request: {}", args.request.display()))?;
    let mut request: SpendRequest = serde_json::from_str(&text)
        .with_context(|| format!("Invalid request: {}", args.request.display()))?;
    request.unsigned |= args.unsigned;

    let created = wallet
        .create_transaction(&request, &snapshot, now)
        .context("Failed to create transaction")?;
    info!(txid = %created.txid(), fee = created.fee, "created transaction");

    print_json(&json!({
        "txid": created.txid(),
        "encoded": created.encode_hex(),
        "fee": created.fee.to_string(),
        "inputs": created.inputs,
        "transaction": created.transaction,
    }))
}

fn cmd_sign(settings: &Settings, profile: Option<&str>, args: SignArgs) -> Result<()> {
    let wallet = load_wallet(settings, profile, &args.seed)?;
    let snapshot = read_snapshot(&args.snapshot)?;
    let tx = decode_tx(&args.tx)?;

    let indexes = (!args.indexes.is_empty()).then_some(args.indexes.as_slice());
    let signed = wallet
        .sign(&tx, &snapshot, indexes)
        .context("Failed to sign transaction")?;

    print_json(&json!({
        "txid": signed.hash(),
        "encoded": encoding::encode_hex(&signed),
        "fully_signed": signed.is_fully_signed(),
    }))
}

fn cmd_verify(settings: &Settings, profile: Option<&str>, args: VerifyArgs) -> Result<()> {
    let profile = settings.resolve_profile(profile)?;
    let snapshot = read_snapshot(&args.snapshot)?;
    let now = resolve_now(args.now)?;
    let tx = decode_tx(&args.tx)?;
    let mode = if args.unsigned { SignatureMode::Unsigned } else { SignatureMode::Signed };

    let verified = hourglass_core::validation::verify_transaction(&tx, &snapshot, now, &profile, mode)
        .context("Transaction rejected")?;

    print_json(&json!({
        "txid": tx.hash(),
        "mode": mode,
        "verified": verified,
    }))
}

fn cmd_decode(args: DecodeArgs) -> Result<()> {
    let tx = decode_tx(&args.tx)?;
    print_json(&json!({
        "txid": tx.hash(),
        "transaction": tx,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_wallet(settings: &Settings, profile: Option<&str>, args: &SeedArgs) -> Result<Wallet> {
    let hex = match &args.seed {
        Some(s) => s.clone(),
        None => std::env::var("HOURGLASS_SEED").context("No seed: pass --seed or set HOURGLASS_SEED")?,
    };
    let seed = Seed::from_hex(&hex).context("Invalid seed")?;
    let profile = settings.resolve_profile(profile)?;
    Wallet::from_seed(&seed, settings.key_count, profile).context("Failed to derive keys")
}

fn read_snapshot(path: &Path) -> Result<UnspentPool> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: UnspentPool = serde_json::from_str(&text)
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;
    debug!(outputs = snapshot.len(), "loaded snapshot");
    Ok(snapshot)
}

fn decode_tx(hex: &str) -> Result<Transaction> {
    encoding::decode_hex(hex).context("Failed to decode transaction")
}

fn resolve_now(now: Option<u64>) -> Result<u64> {
    match now {
        Some(t) => Ok(t),
        None => Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the unix epoch")?
            .as_secs()),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
