// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use camino::{Utf8Path, Utf8PathBuf};
use eyre::WrapErr;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_CONFIG_PATH: &str = "./KatexWidget.toml";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Error,
    Warning,
    Info,
}

/// The editor embedding the widget.
///
/// Both calls are answered before the render continues; there is no
/// cancellation and failures are never retried.
pub trait Host {
    /// Return the settings stored under `namespace`, or `default` when none are stored.
    fn get_config(&self, namespace: &str, default: Value) -> eyre::Result<Value>;

    /// Show `message` to the user without blocking the render.
    fn flash_notification(&self, message: &str, level: NotificationLevel) -> eyre::Result<()>;
}

/// Send a notification, logging instead of propagating a failure.
pub fn notify<H: Host + ?Sized>(host: &H, message: &str, level: NotificationLevel) {
    if let Err(err) = host.flash_notification(message, level) {
        color_print::ceprintln!("<y>Warning: failed to show notification \"{}\": {:?}</>", message, err);
    }
}

/// Host backed by a TOML file, reporting notifications on the terminal.
///
/// Each namespace is a top-level table of the file, e.g. `[katex]`.
pub struct TomlHost {
    path: Utf8PathBuf,
}

impl TomlHost {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> TomlHost {
        TomlHost {
            path: path.as_ref().to_owned(),
        }
    }
}

impl Host for TomlHost {
    fn get_config(&self, namespace: &str, default: Value) -> eyre::Result<Value> {
        if !self.path.exists() {
            return Ok(default);
        }

        let toml = std::fs::read_to_string(&self.path)
            .wrap_err_with(|| eyre::eyre!("failed to read file `{}`", self.path))?;
        let mut table: toml::Table = toml::from_str(&toml)
            .map_err(|e| eyre::eyre!("failed to parse config file `{}`: {}", self.path, e))?;

        match table.remove(namespace) {
            Some(value) => serde_json::to_value(value)
                .wrap_err_with(|| eyre::eyre!("failed to convert `[{}]` of `{}`", namespace, self.path)),
            None => Ok(default),
        }
    }

    fn flash_notification(&self, message: &str, level: NotificationLevel) -> eyre::Result<()> {
        match level {
            NotificationLevel::Error => color_print::ceprintln!("<r><s>error</>: {}</>", message),
            NotificationLevel::Warning => color_print::ceprintln!("<y><s>warning</>: {}</>", message),
            NotificationLevel::Info => color_print::ceprintln!("<c>info</>: {}", message),
        }
        Ok(())
    }
}
