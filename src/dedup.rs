// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use std::collections::HashSet;

/// 32-bit rolling hash over the UTF-16 code units of `s`,
/// i.e. `hash = hash * 31 + unit`, wrapping at every step.
pub fn signature(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32)
    })
}

/// Remembers which warnings the user has already been shown.
///
/// Signatures are only ever added, so the set grows for as long as its owner
/// lives. Two distinct warnings hashing to the same signature means the
/// second one is silently dropped.
///
/// The set is not synchronized: it assumes one render at a time.
#[derive(Debug, Default)]
pub struct WarningDeduplicator {
    signatures: HashSet<i32>,
}

impl WarningDeduplicator {
    pub fn new() -> WarningDeduplicator {
        WarningDeduplicator::default()
    }

    pub fn seen(&self, signature: i32) -> bool {
        self.signatures.contains(&signature)
    }

    pub fn mark(&mut self, signature: i32) {
        self.signatures.insert(signature);
    }

    /// Return `true` the first time `text` is seen, and record it.
    pub fn should_show(&mut self, text: &str) -> bool {
        self.signatures.insert(signature(text))
    }

    pub fn reset(&mut self) {
        self.signatures.clear();
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
