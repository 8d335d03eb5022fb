// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use std::{collections::BTreeSet, str::FromStr};

use serde::{Serialize, Serializer};

/// Marker accepted in place of a feature list, meaning every feature is allowed.
pub const ALL_FEATURES: &str = "all";

/// Relaxed-parsing features KaTeX can either tolerate or reject.
///
/// The string forms are KaTeX's own strict-mode error codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureName {
    UnknownSymbol,
    UnicodeTextInMathMode,
    MathVsTextUnits,
    CommentAtEnd,
    HtmlExtension,
    NewLineInDisplayMode,
}

impl FeatureName {
    pub const ALL: [FeatureName; 6] = [
        FeatureName::UnknownSymbol,
        FeatureName::UnicodeTextInMathMode,
        FeatureName::MathVsTextUnits,
        FeatureName::CommentAtEnd,
        FeatureName::HtmlExtension,
        FeatureName::NewLineInDisplayMode,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            FeatureName::UnknownSymbol => "unknownSymbol",
            FeatureName::UnicodeTextInMathMode => "unicodeTextInMathMode",
            FeatureName::MathVsTextUnits => "mathVsTextUnits",
            FeatureName::CommentAtEnd => "commentAtEnd",
            FeatureName::HtmlExtension => "htmlExtension",
            FeatureName::NewLineInDisplayMode => "newLineInDisplayMode",
        }
    }
}

#[derive(Debug)]
pub struct ParseFeatureNameError;

impl FromStr for FeatureName {
    type Err = ParseFeatureNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .into_iter()
            .find(|feature| feature.code() == s)
            .ok_or(ParseFeatureNameError)
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which relaxed-parsing features are tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedFeatures {
    All,
    Only(BTreeSet<FeatureName>),
}

impl AllowedFeatures {
    pub fn allows(&self, feature: FeatureName) -> bool {
        match self {
            AllowedFeatures::All => true,
            AllowedFeatures::Only(features) => features.contains(&feature),
        }
    }
}

impl Default for AllowedFeatures {
    fn default() -> Self {
        AllowedFeatures::Only(BTreeSet::new())
    }
}

impl FromIterator<FeatureName> for AllowedFeatures {
    fn from_iter<I: IntoIterator<Item = FeatureName>>(iter: I) -> Self {
        AllowedFeatures::Only(iter.into_iter().collect())
    }
}

impl Serialize for AllowedFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AllowedFeatures::All => serializer.serialize_str(ALL_FEATURES),
            AllowedFeatures::Only(features) => features.serialize(serializer),
        }
    }
}
