use clap::{ArgAction, Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use std::path::PathBuf;

mod cmd;
mod helpers;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and derive registry keypairs
    Keys {
        #[command(subcommand)]
        cmd: KeysCmd,
    },
    /// Parse, decode and build links
    Link {
        #[command(subcommand)]
        cmd: LinkCmd,
    },
    /// Check SkyDB config files
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Subcommand)]
enum KeysCmd {
    /// Generate a new 12-word seed phrase and print its public key
    Generate,
    /// Print the public key belonging to a seed phrase or raw seed
    Derive {
        /// 12-word BIP39 seed phrase
        #[arg(long, conflicts_with = "seed", required_unless_present = "seed")]
        phrase: Option<String>,
        /// Arbitrary seed string (for tests and throwaway keys)
        #[arg(long)]
        seed: Option<String>,
    },
}

#[derive(Subcommand)]
enum LinkCmd {
    /// Find a link in a URI, portal URL or bare string
    Parse {
        input: String,
        /// Print the link followed by its path, query and fragment
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "only_path")]
        include_path: bool,
        /// Print only the path, query and fragment
        #[arg(long, action = ArgAction::SetTrue)]
        only_path: bool,
    },
    /// Show the raw bytes and both encodings of a link
    Decode { link: String },
    /// Build the entry link for a public key and data key
    Entry {
        /// Public key in hex (Ed25519, 32 bytes)
        public_key: String,
        /// Data key; a 64-char hex digest when --hashed is set
        data_key: String,
        #[arg(long, action = ArgAction::SetTrue)]
        hashed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Parse and validate a SkyDB config file
    Check { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    cmd::run_command(cli.cmd)
}
