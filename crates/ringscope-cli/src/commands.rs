//! The inspect command.

use crate::Cli;
use ringscope_inspect::{inspect, Account, InspectOptions};
use ringscope_ledger::{LedgerConfig, SqliteLedger};
use ringscope_types::keys::{parse_hash, parse_secret_key};
use ringscope_types::parse_address_for;
use std::io::IsTerminal;
use std::time::Duration;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// Parse the view key and address pair, when given.
fn account(cli: &Cli) -> std::result::Result<Option<Account>, Box<dyn std::error::Error>> {
    let (Some(viewkey), Some(address)) = (&cli.viewkey, &cli.address) else {
        return Ok(None);
    };
    let view_secret_key =
        parse_secret_key(viewkey).map_err(|e| format!("cannot parse view key {viewkey}: {e}"))?;
    let address = parse_address_for(address, cli.network())
        .map_err(|e| format!("cannot parse address {address}: {e}"))?;
    Ok(Some(Account::from_address(view_secret_key, address)))
}

pub fn run(cli: &Cli) -> Result {
    let tx_hash = parse_hash(&cli.txhash)
        .map_err(|e| format!("cannot parse tx hash {}: {e}", cli.txhash))?;
    let account = account(cli)?;

    let path = cli.ledger_path();
    let mut config = LedgerConfig::read_only(&path);
    if let Some(ms) = cli.lock_wait_ms {
        config = config.with_lock_wait(Duration::from_millis(ms));
    }
    if let Some(window) = cli.scan_window {
        config = config.with_scan_window(window);
    }
    log::info!("opening ledger {}", path.display());
    let ledger = SqliteLedger::open(&config)?;

    let mut opts = InspectOptions::new(cli.network(), path.display().to_string())
        .with_scale_width(cli.scale_width);
    if let Some(account) = account {
        opts = opts.with_account(account);
    }

    let report = inspect(&ledger, &tx_hash, &opts)?;
    if cli.json {
        println!("{}", report.to_json()?);
    } else if !cli.no_color && std::io::stdout().is_terminal() {
        print!("{}", report.render_text_colored());
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
