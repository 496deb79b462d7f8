use clap::Parser;
use ringscope_types::{network_config, Network};
use std::path::PathBuf;

mod commands;

const DEFAULT_TX_HASH: &str = "09d9e8eccf82b3d6811ed7005102caf1b605f325cf60ed372abeb4a67d956fff";

/// Resolve the ring members of a transaction and check which belong to you.
#[derive(Parser, Debug)]
#[command(name = "ringscope")]
#[command(about = "Show ring members of a transaction, their age and ownership")]
#[command(version)]
struct Cli {
    /// Hash of the transaction to inspect.
    #[arg(short = 't', long, default_value = DEFAULT_TX_HASH)]
    txhash: String,

    /// Private view key (hex); requires --address.
    #[arg(short = 'v', long, requires = "address")]
    viewkey: Option<String>,

    /// Account address; requires --viewkey.
    #[arg(short = 'a', long, requires = "viewkey")]
    address: Option<String>,

    /// Path to the ledger database.
    #[arg(short = 'b', long)]
    bc_path: Option<PathBuf>,

    /// Use testnet addresses and data directory.
    #[arg(long, conflicts_with = "stagenet")]
    testnet: bool,

    /// Use stagenet addresses and data directory.
    #[arg(long)]
    stagenet: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Never colour ownership verdicts, even on a terminal.
    #[arg(long)]
    no_color: bool,

    /// Blocks past an output's height searched for its source transaction.
    #[arg(long)]
    scan_window: Option<u64>,

    /// Width of the time-scale line.
    #[arg(long, default_value_t = ringscope_inspect::DEFAULT_SCALE_WIDTH)]
    scale_width: usize,

    /// How long to wait on a locked ledger, in milliseconds.
    #[arg(long)]
    lock_wait_ms: Option<u64>,
}

impl Cli {
    fn network(&self) -> Network {
        if self.testnet {
            Network::Testnet
        } else if self.stagenet {
            Network::Stagenet
        } else {
            Network::Mainnet
        }
    }

    fn ledger_path(&self) -> PathBuf {
        match &self.bc_path {
            Some(p) => p.clone(),
            None => default_ledger_path(self.network()),
        }
    }
}

fn default_ledger_path(network: Network) -> PathBuf {
    let base = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ringscope");
    ringscope_ledger::ledger_path(&base, network_config(network).data_subdir)
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = commands::run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
