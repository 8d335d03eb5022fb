// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use eyre::Context;
use serde::Serialize;

use crate::{config::Settings, host};

#[derive(Parser)]
pub struct NewCommandCli {
    #[command(subcommand)]
    pub command: NewCommand,
}

#[derive(clap::Subcommand)]
pub enum NewCommand {
    /// Create a new config file.
    #[command(visible_alias = "c")]
    Config(NewConfigCommand),
}

#[derive(clap::Args)]
pub struct NewConfigCommand {
    /// Path to the new configuration file.
    #[arg(default_value_t = host::DEFAULT_CONFIG_PATH.into())]
    pub path: Utf8PathBuf,
}

/// On-disk layout read by [`host::TomlHost`]: one table per namespace.
#[derive(Serialize, Default)]
struct ConfigFile {
    katex: Settings,
}

pub fn new_config(command: &NewConfigCommand) -> eyre::Result<()> {
    new_config_inner(&command.path)
}

fn new_config_inner(config_path: &Utf8Path) -> eyre::Result<()> {
    if config_path.exists() {
        return Err(eyre::eyre!("Already exists: {}", config_path));
    }

    let toml = default_config_toml()?;
    std::fs::write(config_path, toml).wrap_err("failed to create default config file")?;
    println!("Created new config at: {}", config_path);
    Ok(())
}

fn default_config_toml() -> eyre::Result<String> {
    toml::to_string(&ConfigFile::default()).wrap_err("failed to serialize default config")
}
