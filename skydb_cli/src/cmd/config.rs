use anyhow::{Context, Result};
use skydb::SkyDbConfig;
use tracing::info;

use crate::ConfigCmd;

pub fn run_config(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Check { path } => {
            let toml_content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: SkyDbConfig =
                toml::from_str(&toml_content).context("could not parse config file")?;
            config.validate()?;
            info!(path = %path.display(), "config is valid");
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
