use anyhow::Result;

mod config;
mod keys;
mod link;

pub use config::run_config;
pub use keys::run_keys;
pub use link::run_link;

pub fn run_command(cmd: crate::Commands) -> Result<()> {
    match cmd {
        crate::Commands::Keys { cmd } => run_keys(cmd),
        crate::Commands::Link { cmd } => run_link(cmd),
        crate::Commands::Config { cmd } => run_config(cmd),
    }
}
