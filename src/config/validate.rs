// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use std::fmt::Display;

use itertools::Itertools;
use serde_json::{Map, Value};

use super::{
    feature::{AllowedFeatures, FeatureName, ALL_FEATURES},
    MacroDefinition, Settings,
};

const DISPLAY_MODE: &str = "displayMode";
const ALLOWED_FEATURES: &str = "allowedFeatures";
const MACROS: &str = "macros";
const MACRO_NAME: &str = "macro";
const MACRO_EXPANSION: &str = "expansion";

/// One schema violation found in the raw settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Dotted path to the offending entry, empty for the root.
    pub path: String,
    pub message: String,
    pub received: Value,
}

impl Issue {
    fn new<P: Into<String>, M: Into<String>>(path: P, message: M, received: &Value) -> Issue {
        Issue {
            path: path.into(),
            message: message.into(),
            received: received.clone(),
        }
    }

    /// Text identifying this issue for deduplication.
    pub fn signature_text(&self) -> String {
        format!("{}{}", self.message, self.received)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path.is_empty() {
            true => write!(f, "{}", self.message),
            false => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Outcome of validating raw settings. Both arms carry usable settings.
#[derive(Debug)]
pub enum Validation {
    Valid(Settings),
    Invalid {
        fallback: Settings,
        issues: Vec<Issue>,
    },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn settings(&self) -> &Settings {
        match self {
            Validation::Valid(settings) => settings,
            Validation::Invalid { fallback, .. } => fallback,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Validation::Valid(_) => &[],
            Validation::Invalid { issues, .. } => issues,
        }
    }

    pub fn into_parts(self) -> (Settings, Vec<Issue>) {
        match self {
            Validation::Valid(settings) => (settings, vec![]),
            Validation::Invalid { fallback, issues } => (fallback, issues),
        }
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, value: &Value) -> String {
    format!("Expected {}, received {}", kind, type_name(value))
}

fn join_path(parent: &str, child: impl Display) -> String {
    match parent.is_empty() {
        true => child.to_string(),
        false => format!("{}.{}", parent, child),
    }
}

/// Validate raw, schema-less settings.
///
/// Every violation is collected. If there is any, the result carries the
/// default settings rather than a partially applied input.
pub fn validate(raw: &Value) -> Validation {
    let mut issues = vec![];
    let settings = validate_settings(raw, &mut issues);
    match issues.is_empty() {
        true => Validation::Valid(settings),
        false => Validation::Invalid {
            fallback: Settings::default(),
            issues,
        },
    }
}

fn validate_settings(raw: &Value, issues: &mut Vec<Issue>) -> Settings {
    let mut settings = Settings::default();
    let Some(object) = raw.as_object() else {
        issues.push(Issue::new("", expected("object", raw), raw));
        return settings;
    };

    for (key, value) in object {
        match key.as_str() {
            DISPLAY_MODE => match value.as_bool() {
                Some(display_mode) => settings.display_mode = display_mode,
                None => issues.push(Issue::new(key, expected("boolean", value), value)),
            },
            ALLOWED_FEATURES => {
                if let Some(allowed) = validate_allowed_features(value, issues) {
                    settings.allowed_features = allowed;
                }
            }
            MACROS => settings.macros = validate_macros(value, issues),
            _ => issues.push(Issue::new(
                "",
                format!("Unrecognized key `{}`", key),
                value,
            )),
        }
    }
    settings
}

fn feature_list() -> String {
    FeatureName::ALL.iter().map(|f| format!("'{}'", f)).join(" | ")
}

fn validate_allowed_features(value: &Value, issues: &mut Vec<Issue>) -> Option<AllowedFeatures> {
    match value {
        Value::String(s) if s == ALL_FEATURES => Some(AllowedFeatures::All),
        Value::String(s) => {
            issues.push(Issue::new(
                ALLOWED_FEATURES,
                format!(
                    "Invalid value '{}', expected '{}' or a list of feature names",
                    s, ALL_FEATURES
                ),
                value,
            ));
            None
        }
        Value::Array(items) => {
            let before = issues.len();
            let mut features = vec![];
            for (i, item) in items.iter().enumerate() {
                let path = join_path(ALLOWED_FEATURES, i);
                match item.as_str().map(|s| s.parse::<FeatureName>()) {
                    Some(Ok(feature)) => features.push(feature),
                    Some(Err(_)) => issues.push(Issue::new(
                        path,
                        format!(
                            "Invalid feature name, expected {}",
                            feature_list()
                        ),
                        item,
                    )),
                    None => issues.push(Issue::new(path, expected("string", item), item)),
                }
            }
            (issues.len() == before).then(|| features.into_iter().collect())
        }
        _ => {
            issues.push(Issue::new(
                ALLOWED_FEATURES,
                expected("'all' or array", value),
                value,
            ));
            None
        }
    }
}

fn validate_macros(value: &Value, issues: &mut Vec<Issue>) -> Vec<MacroDefinition> {
    let Some(items) = value.as_array() else {
        issues.push(Issue::new(MACROS, expected("array", value), value));
        return vec![];
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| validate_macro(&join_path(MACROS, i), item, issues))
        .collect()
}

fn validate_macro(path: &str, item: &Value, issues: &mut Vec<Issue>) -> Option<MacroDefinition> {
    let Some(entry) = item.as_object() else {
        issues.push(Issue::new(path, expected("object", item), item));
        return None;
    };

    for (key, value) in entry {
        if key != MACRO_NAME && key != MACRO_EXPANSION {
            issues.push(Issue::new(
                path,
                format!("Unrecognized key `{}`", key),
                value,
            ));
        }
    }

    let name = required_string(path, entry, MACRO_NAME, issues);
    let expansion = required_string(path, entry, MACRO_EXPANSION, issues);
    Some(MacroDefinition {
        name: name?,
        expansion: expansion?,
    })
}

fn required_string(
    path: &str,
    entry: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<Issue>,
) -> Option<String> {
    let path = join_path(path, key);
    match entry.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(value) => {
            issues.push(Issue::new(path, expected("string", value), value));
            None
        }
        None => {
            issues.push(Issue::new(path, "Required", &Value::Null));
            None
        }
    }
}
