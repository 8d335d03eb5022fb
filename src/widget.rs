// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use serde::Serialize;

use crate::{
    config,
    dedup::WarningDeduplicator,
    host::Host,
    html_flake,
    renderer::{self, KatexTypesetter, Typesetter},
};

/// What the host injects into the widget frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    /// Markup inserted into the frame.
    pub html: String,
    /// Script run in the frame right after the markup is inserted.
    pub script: String,
}

/// A formula widget bound to one host.
///
/// Warnings already shown are remembered for the widget's lifetime, so
/// re-rendering the same broken formula or settings stays quiet.
pub struct Widget<H: Host, T: Typesetter = KatexTypesetter> {
    host: H,
    typesetter: T,
    warnings: WarningDeduplicator,
}

impl<H: Host> Widget<H> {
    pub fn new(host: H) -> Widget<H> {
        Widget::with_typesetter(host, KatexTypesetter)
    }
}

impl<H: Host, T: Typesetter> Widget<H, T> {
    pub fn with_typesetter(host: H, typesetter: T) -> Widget<H, T> {
        Widget {
            host,
            typesetter,
            warnings: WarningDeduplicator::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn warnings(&self) -> &WarningDeduplicator {
        &self.warnings
    }

    /// Forget every warning shown so far.
    pub fn reset_warnings(&mut self) {
        self.warnings.reset();
    }

    /// Render `body` (the raw formula source) into the widget markup.
    pub fn render(&mut self, body: &str) -> RenderResult {
        let settings = config::resolve_settings(&self.host, &mut self.warnings);
        let formula = renderer::render_formula(
            &self.typesetter,
            body,
            &settings,
            &mut self.warnings,
            &self.host,
        );
        RenderResult {
            html: html_flake::widget_html(formula.html()),
            script: html_flake::widget_script(),
        }
    }
}
