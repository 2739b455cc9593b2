use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use votechain::store::LedgerStore;
use votechain::{
    BallotBox, CapturingSink, Device, Ledger, LogFormat, OtpGate, Receipt, StoreBackend,
    Verification, VotechainConfig,
};

use crate::cli::*;

type DynLedger = Ledger<Box<dyn LedgerStore>>;

/// Config file (or defaults) with command-line overrides applied.
pub fn load_config(cli: &Cli) -> anyhow::Result<VotechainConfig> {
    let mut config = match &cli.config {
        Some(path) => VotechainConfig::from_file(path)?,
        None => VotechainConfig::default(),
    };
    if let Some(path) = &cli.db {
        config.store = StoreBackend::Sqlite { path: path.clone() };
    }
    if let Some(path) = &cli.json {
        config.store = StoreBackend::Json { path: path.clone() };
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log.format = match format {
            LogFormatArg::Human => LogFormat::Human,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
    Ok(config)
}

pub async fn run_command(cli: Cli, config: VotechainConfig) -> anyhow::Result<()> {
    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }
    if let Command::ResetDevice(args) = &cli.command {
        return cmd_reset_device(args);
    }

    tracing::debug!(store = ?config.store, "opening ledger");
    let store = config
        .store
        .open()
        .with_context(|| format!("opening store {:?}", config.store))?;
    let ledger = Arc::new(Ledger::new(store));

    match cli.command {
        Command::Cast(args) => cmd_cast(&config, ledger, args).await,
        Command::Verify => cmd_verify(&ledger).await,
        Command::Tally => cmd_tally(&config, &ledger).await,
        Command::Log(args) => cmd_log(&config, &ledger, args).await,
        Command::Export(args) => cmd_export(&ledger, args).await,
        Command::Import(args) => cmd_import(&ledger, args).await,
        Command::ResetDevice(_) | Command::Config => Ok(()),
    }
}

async fn cmd_cast(
    config: &VotechainConfig,
    ledger: Arc<DynLedger>,
    args: CastArgs,
) -> anyhow::Result<()> {
    let mut device = load_device(&args.device.device_file)?;
    if let Some(vote) = device.vote() {
        bail!(
            "this device has already voted for {} (receipt {})",
            vote.candidate,
            vote.receipt.prefix(config.receipt_display_len)
        );
    }

    let gate = OtpGate::with_sink(config.otp_policy(), CapturingSink::new());
    let expires_at = gate.request(&args.voter_id).await?;
    let issued = gate
        .sink()
        .last_code(args.voter_id.trim())
        .context("no code was delivered")?;
    println!(
        "Demo OTP for {}: {} (expires at unix {})",
        votechain::mask_voter_id(&args.voter_id),
        issued.as_str(),
        expires_at
    );

    let presented = args.otp.unwrap_or_else(|| issued.as_str().to_string());
    let voter = gate.verify(&args.voter_id, &presented).await?;
    tracing::info!(voter = %voter.masked_id(), "voter verified");

    let ballot_box = BallotBox::new(ledger, config.candidates.clone());
    let receipt = ballot_box
        .cast_vote(&mut device, voter, &args.candidate)
        .await?;
    save_device(&args.device.device_file, &device)?;

    println!("Vote recorded for {}", args.candidate);
    println!("Receipt: {}", receipt.prefix(config.receipt_display_len));
    Ok(())
}

async fn cmd_verify(ledger: &DynLedger) -> anyhow::Result<()> {
    let count = ledger.len().await?;
    match ledger.verify().await? {
        Verification::Valid => {
            println!("Ledger OK: {} records, chain intact", count);
            Ok(())
        }
        Verification::Broken { index, fault } => {
            bail!("integrity failure at record #{}: {}", index + 1, fault)
        }
    }
}

async fn cmd_tally(config: &VotechainConfig, ledger: &DynLedger) -> anyhow::Result<()> {
    let tally = ledger.tally(&config.candidates).await?;
    let width = config.candidates.iter().map(str::len).max().unwrap_or(0);
    for (candidate, votes) in tally.iter() {
        println!("{:<width$}  {}", candidate, votes, width = width);
    }
    println!("{:<width$}  {}", "Total", tally.total(), width = width);
    Ok(())
}

async fn cmd_log(
    config: &VotechainConfig,
    ledger: &DynLedger,
    args: LogArgs,
) -> anyhow::Result<()> {
    let records = ledger.records().await?;
    let skip = records.len().saturating_sub(args.limit);
    for (i, record) in records.iter().enumerate().skip(skip) {
        let receipt = Receipt::for_record(record);
        let short = receipt.prefix(config.receipt_display_len);
        if args.oneline {
            println!("#{} {} {}", i + 1, short, record.candidate);
        } else {
            println!("#{}  {}", i + 1, short);
            println!("  voter:     {}", record.voter_id_masked);
            println!("  candidate: {}", record.candidate);
            println!("  timestamp: {}", record.timestamp);
            println!("  prev:      {}", short_prev(&record.prev_hash, config));
        }
    }
    if records.is_empty() {
        println!("Ledger is empty.");
    }
    Ok(())
}

fn short_prev<'a>(prev: &'a str, config: &VotechainConfig) -> &'a str {
    prev.get(..config.receipt_display_len).unwrap_or(prev)
}

async fn cmd_export(ledger: &DynLedger, args: ExportArgs) -> anyhow::Result<()> {
    let json = ledger.export_json().await?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_import(ledger: &DynLedger, args: ImportArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let outcome = ledger.import_json(&text).await?;
    println!(
        "Imported {} records (replaced {})",
        outcome.imported, outcome.replaced
    );
    Ok(())
}

fn cmd_reset_device(args: &DeviceArgs) -> anyhow::Result<()> {
    let mut device = load_device(&args.device_file)?;
    device.reset();
    save_device(&args.device_file, &device)?;
    println!("Device vote flag cleared.");
    Ok(())
}

fn load_device(path: &Path) -> anyhow::Result<Device> {
    match std::fs::read(path) {
        Ok(data) => serde_json::from_slice(&data)
            .with_context(|| format!("parsing device file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Device::new()),
        Err(e) => Err(e).with_context(|| format!("reading device file {}", path.display())),
    }
}

fn save_device(path: &Path, device: &Device) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(device)?;
    std::fs::write(path, data).with_context(|| format!("writing device file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_store() {
        let cli = Cli::parse_from(["votechain", "--json", "/tmp/l.json", "verify"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Json {
                path: "/tmp/l.json".into()
            }
        );
    }

    #[test]
    fn test_device_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        assert!(!load_device(&path).unwrap().has_voted());

        save_device(&path, &Device::new()).unwrap();
        assert_eq!(load_device(&path).unwrap(), Device::new());
    }

    #[tokio::test]
    async fn test_cast_then_verify_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let device_path = dir.path().join("device.json");

        let cli = Cli::parse_from([
            "votechain",
            "--json",
            ledger_path.to_str().unwrap(),
            "cast",
            "--voter-id",
            "voter12345",
            "--candidate",
            "Ben Carter",
            "--device-file",
            device_path.to_str().unwrap(),
        ]);
        let config = load_config(&cli).unwrap();
        run_command(cli, config.clone()).await.unwrap();

        // Same device cannot vote twice.
        let again = Cli::parse_from([
            "votechain",
            "--json",
            ledger_path.to_str().unwrap(),
            "cast",
            "--voter-id",
            "someone-else",
            "--candidate",
            "Chloe Singh",
            "--device-file",
            device_path.to_str().unwrap(),
        ]);
        assert!(run_command(again, config.clone()).await.is_err());

        let verify = Cli::parse_from(["votechain", "--json", ledger_path.to_str().unwrap(), "verify"]);
        run_command(verify, config).await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_otp_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "votechain",
            "--json",
            dir.path().join("ledger.json").to_str().unwrap(),
            "cast",
            "--voter-id",
            "voter12345",
            "--candidate",
            "Ben Carter",
            "--otp",
            "not-a-code",
            "--device-file",
            dir.path().join("device.json").to_str().unwrap(),
        ]);
        let config = load_config(&cli).unwrap();
        assert!(run_command(cli, config).await.is_err());
    }
}
