// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use clap::Parser;

use katex_widget::cli::{
    new::{NewCommand, NewCommandCli},
    render::RenderCommand,
    watch::WatchCommand,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Render a formula to widget HTML and script.
    #[command(visible_alias = "r")]
    Render(RenderCommand),

    /// Re-render a formula file into a preview page whenever it changes.
    #[command(visible_alias = "w")]
    Watch(WatchCommand),

    /// Create a new config.
    #[command(visible_alias = "n")]
    New(NewCommandCli),
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Render(command) => katex_widget::cli::render::render(command)?,
        Command::Watch(command) => katex_widget::cli::watch::watch(command)?,
        Command::New(NewCommandCli { command }) => match command {
            NewCommand::Config(command) => katex_widget::cli::new::new_config(command)?,
        },
    };
    Ok(())
}
