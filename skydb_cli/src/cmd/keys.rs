use anyhow::{Context, Result};
use skydb_core::{Keypair, keys};
use tracing::warn;

use crate::KeysCmd;

pub fn run_keys(cmd: KeysCmd) -> Result<()> {
    match cmd {
        KeysCmd::Generate => {
            let phrase = keys::generate_seed_phrase()?;
            let keypair = Keypair::from_seed_phrase(&phrase)?;
            println!("seed phrase: {phrase}");
            println!("public key:  {}", keypair.public_key());
        }
        KeysCmd::Derive { phrase, seed } => {
            let keypair = match (phrase, seed) {
                (Some(phrase), _) => {
                    Keypair::from_seed_phrase(phrase.trim()).context("failed to derive keypair")?
                }
                (None, Some(seed)) => {
                    warn!("deriving from a raw seed string; use a seed phrase for real keys");
                    Keypair::derive(seed.as_bytes())
                }
                (None, None) => anyhow::bail!("either --phrase or --seed is required"),
            };
            println!("{}", keypair.public_key());
        }
    }
    Ok(())
}
