// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

pub mod feature;
pub mod validate;

use serde::Serialize;
use serde_json::Value;

use crate::{
    dedup::WarningDeduplicator,
    host::{self, Host, NotificationLevel},
};

pub use feature::{AllowedFeatures, FeatureName};
pub use validate::{validate, Issue, Validation};

/// Namespace under which the host stores our settings.
pub const NAMESPACE: &str = "katex";

/// User-defined macro, e.g. `\R` expanding to `\mathbb{R}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroDefinition {
    #[serde(rename = "macro")]
    pub name: String,
    pub expansion: String,
}

impl MacroDefinition {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, expansion: E) -> MacroDefinition {
        MacroDefinition {
            name: name.into(),
            expansion: expansion.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub display_mode: bool,
    pub allowed_features: AllowedFeatures,
    pub macros: Vec<MacroDefinition>,
}

/// Fetch the settings from the host and validate them.
///
/// Never fails: a broken fetch counts as an empty configuration, and invalid
/// settings are replaced by the defaults after notifying the user once per
/// distinct issue.
pub fn resolve_settings<H: Host + ?Sized>(host: &H, warnings: &mut WarningDeduplicator) -> Settings {
    let raw = host
        .get_config(NAMESPACE, Value::Object(Default::default()))
        .unwrap_or_else(|err| {
            color_print::ceprintln!("<y>Warning: failed to read `{}` settings: {:?}</>", NAMESPACE, err);
            Value::Object(Default::default())
        });

    let (settings, issues) = validate(&raw).into_parts();
    for issue in issues {
        if warnings.should_show(&issue.signature_text()) {
            let message = format!("KaTeX settings: {}", issue);
            host::notify(host, &message, NotificationLevel::Error);
        }
    }
    settings
}
