// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::{
    cli::render::render_file,
    host::{self, TomlHost},
    widget::Widget,
};

#[derive(clap::Args)]
pub struct WatchCommand {
    /// File holding the formula source.
    #[arg(required = true)]
    pub file: Utf8PathBuf,

    /// Path to the configuration file (e.g., "KatexWidget.toml").
    #[arg(short, long, default_value_t = host::DEFAULT_CONFIG_PATH.into())]
    pub config: Utf8PathBuf,

    /// Path of the preview page rewritten on every change.
    #[arg(short, long, default_value_t = Utf8PathBuf::from("./preview.html"))]
    pub output: Utf8PathBuf,
}

/// Render once, then again whenever the formula or the settings change.
///
/// One widget serves every render, so a warning is shown only the first time
/// it comes up during the session.
pub fn watch(command: &WatchCommand) -> eyre::Result<()> {
    let mut widget = Widget::new(TomlHost::new(&command.config));
    let mut render = || render_file(&mut widget, &command.file, &command.output);

    if let Err(err) = render() {
        color_print::ceprintln!("<r>Error: {:?}</>", err);
    }

    watch_paths(&[&command.file, &command.config], |_| {
        if let Err(err) = render() {
            color_print::ceprintln!("<r>Error: {:?}</>", err);
        }
        Ok(())
    })
}

/// from: https://github.com/notify-rs/notify/blob/main/examples/monitor_raw.rs#L18
fn watch_paths<P: AsRef<Utf8Path>, F>(watched_paths: &[P], mut action: F) -> eyre::Result<()>
where
    F: FnMut(&Utf8Path) -> eyre::Result<()>,
{
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

    print!("[watch] ");
    for watched_path in watched_paths {
        let watched_path = watched_path.as_ref();
        if !watched_path.exists() {
            color_print::ceprintln!(
                "<y>[watch] Warning: Path \"{}\" does not exist, skipping.</>",
                watched_path
            );
            continue;
        }

        watcher.watch(watched_path.as_std_path(), RecursiveMode::NonRecursive)?;
        print!("\"{}\"  ", watched_path);
    }
    println!("\n\nPress Ctrl+C to stop watching.\n");

    for res in rx {
        match res {
            Ok(event) => {
                // Editors that save by replacing the file report a creation instead.
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    for path in event.paths {
                        println!("[watch] Change: {path:?}");
                        std::io::stdout().flush()?;
                        if let Ok(p) = path.as_path().try_into() {
                            action(p)?;
                        }
                    }
                }
            }
            Err(error) => color_print::ceprintln!("<r>[watch] Error: {:?}</>", error),
        }
    }

    Ok(())
}
