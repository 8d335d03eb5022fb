// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

pub mod strict;

use std::{borrow::Cow, collections::HashMap};

use crate::{
    config::{MacroDefinition, Settings},
    dedup::WarningDeduplicator,
    host::{self, Host, NotificationLevel},
};

pub use strict::Violation;

pub const ERROR_COLOR: &str = "#cc0000";

/// Answer of the strict callback for one violation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StrictAction {
    /// Accept the construct and keep parsing permissively.
    Ignore,
    /// Reject the construct, failing the render.
    Error,
}

pub struct RenderOptions<'a> {
    pub display_mode: bool,
    pub trust: bool,
    pub macros: HashMap<String, String>,
    pub strict: &'a mut dyn FnMut(&Violation) -> StrictAction,
}

/// A formula typesetting engine.
pub trait Typesetter {
    /// Render `source` to an HTML string, or fail with the engine's message.
    fn render_to_string(&self, source: &str, options: &mut RenderOptions<'_>) -> eyre::Result<String>;
}

/// Ask `options.strict` about each violation of `source`, failing on the
/// first rejected fatal one.
///
/// Returns the source to typeset, with every rejected non-fatal construct
/// replaced by a space.
pub fn check_strictness<'s>(source: &'s str, options: &mut RenderOptions<'_>) -> eyre::Result<Cow<'s, str>> {
    let mut dropped = Vec::new();
    for violation in strict::scan(source, options.display_mode) {
        if (options.strict)(&violation) == StrictAction::Error {
            if violation.is_fatal() {
                return Err(eyre::eyre!("{}", violation.strict_error()));
            }
            dropped.extend(violation.span);
        }
    }
    if dropped.is_empty() {
        return Ok(Cow::Borrowed(source));
    }

    let mut kept = String::with_capacity(source.len());
    let mut last = 0;
    for span in dropped {
        kept.push_str(&source[last..span.start]);
        kept.push(' ');
        last = span.end;
    }
    kept.push_str(&source[last..]);
    Ok(Cow::Owned(kept))
}

/// KaTeX, run in the embedded JS engine of the [`katex`] crate.
///
/// The engine does not expose KaTeX's strict callback, so strictness is
/// decided up front by [`check_strictness`].
#[derive(Debug, Default, Clone, Copy)]
pub struct KatexTypesetter;

impl Typesetter for KatexTypesetter {
    fn render_to_string(&self, source: &str, options: &mut RenderOptions<'_>) -> eyre::Result<String> {
        let source = check_strictness(source, options)?;

        let mut builder = katex::Opts::builder();
        builder
            .display_mode(options.display_mode)
            .trust(options.trust)
            .throw_on_error(true);
        let mut opts = builder
            .build()
            .map_err(|e| eyre::eyre!("invalid KaTeX options: {}", e))?;
        for (name, expansion) in &options.macros {
            opts.add_macro(name.clone(), expansion.clone());
        }

        katex::render_with_opts(&source, &opts).map_err(|err| match err {
            katex::Error::JsExecError(detail) => eyre::eyre!("{}", detail),
            other => eyre::eyre!(other).wrap_err("KaTeX engine is unavailable"),
        })
    }
}

/// Result of rendering one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Rendered(String),
    Failed { message: String, fallback: String },
}

impl Formula {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Formula::Rendered(_))
    }

    pub fn html(&self) -> &str {
        match self {
            Formula::Rendered(html) => html,
            Formula::Failed { fallback, .. } => fallback,
        }
    }
}

/// Collect macro definitions into a table. A later definition of the same
/// name replaces an earlier one.
pub fn merge_macros(macros: &[MacroDefinition]) -> HashMap<String, String> {
    macros.iter().fold(HashMap::new(), |mut table, m| {
        table.insert(m.name.clone(), m.expansion.clone());
        table
    })
}

/// Markup KaTeX itself emits for a formula it failed to render.
pub fn error_span(source: &str, message: &str) -> String {
    format!(
        r#"<span class="katex-error" title="{}" style="color:{}">{}</span>"#,
        htmlize::escape_attribute(message),
        ERROR_COLOR,
        htmlize::escape_text(source)
    )
}

pub fn render_formula<T, H>(
    typesetter: &T,
    source: &str,
    settings: &Settings,
    warnings: &mut WarningDeduplicator,
    host: &H,
) -> Formula
where
    T: Typesetter + ?Sized,
    H: Host + ?Sized,
{
    let allowed = &settings.allowed_features;
    let mut strict = |violation: &Violation| {
        if allowed.allows(violation.feature) {
            return StrictAction::Ignore;
        }
        if warnings.should_show(&format!("{}{}", source, violation.message)) {
            let message = format!("KaTeX: {} [{}]", violation.message, violation.feature);
            host::notify(host, &message, NotificationLevel::Error);
        }
        StrictAction::Error
    };

    let mut options = RenderOptions {
        display_mode: settings.display_mode,
        trust: true,
        macros: merge_macros(&settings.macros),
        strict: &mut strict,
    };

    match typesetter.render_to_string(source, &mut options) {
        Ok(html) => Formula::Rendered(html),
        Err(err) => {
            let message = format!("{:#}", err);
            color_print::ceprintln!("<y>Warning: failed to render formula: {}</>", message);
            Formula::Failed {
                fallback: error_span(source, &message),
                message,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::{
        config::{AllowedFeatures, FeatureName},
        host::test::MockHost,
    };

    /// Typesetter echoing its input, recording the options of every call.
    #[derive(Default)]
    pub struct EchoTypesetter {
        pub calls: RefCell<Vec<(bool, bool, HashMap<String, String>)>>,
    }

    impl Typesetter for EchoTypesetter {
        fn render_to_string(&self, source: &str, options: &mut RenderOptions<'_>) -> eyre::Result<String> {
            self.calls.borrow_mut().push((
                options.display_mode,
                options.trust,
                options.macros.clone(),
            ));
            let source = check_strictness(source, options)?;
            Ok(format!("<span class=\"katex\">{}</span>", source))
        }
    }

    fn settings_with(allowed_features: AllowedFeatures) -> Settings {
        Settings {
            allowed_features,
            ..Settings::default()
        }
    }

    /// The part of KaTeX's output that depends on layout only, not on the source text.
    fn katex_html(html: &str) -> &str {
        &html[html.find("katex-html").expect("no katex-html in output")..]
    }

    #[test]
    fn test_merge_macros_last_wins() {
        let table = merge_macros(&[
            MacroDefinition::new(r"\R", r"\mathbb{R}"),
            MacroDefinition::new(r"\N", r"\mathbb{N}"),
            MacroDefinition::new(r"\R", r"\mathbf{R}"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table[r"\R"], r"\mathbf{R}");
        assert_eq!(table[r"\N"], r"\mathbb{N}");
    }

    #[test]
    fn test_error_span_escapes() {
        assert_eq!(
            error_span("a<b", "Expected \"}\""),
            r#"<span class="katex-error" title="Expected &quot;}&quot;" style="color:#cc0000">a&lt;b</span>"#
        );
    }

    #[test]
    fn test_options_follow_settings() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::empty();
        let mut warnings = WarningDeduplicator::new();
        let settings = Settings {
            display_mode: true,
            allowed_features: [FeatureName::HtmlExtension].into_iter().collect(),
            macros: vec![MacroDefinition::new(r"\foo", "bar")],
        };

        let formula = render_formula(&typesetter, "x", &settings, &mut warnings, &host);
        assert_eq!(formula, Formula::Rendered("<span class=\"katex\">x</span>".into()));

        let calls = typesetter.calls.borrow();
        let (display_mode, trust, macros) = &calls[0];
        assert!(*display_mode);
        assert!(*trust);
        assert_eq!(macros[r"\foo"], "bar");
    }

    #[test]
    fn test_trusted_by_default() {
        let typesetter = EchoTypesetter::default();
        let mut warnings = WarningDeduplicator::new();
        render_formula(&typesetter, "x", &Settings::default(), &mut warnings, &MockHost::empty());
        assert!(typesetter.calls.borrow()[0].1);
    }

    #[test]
    fn test_rejected_new_line_is_dropped() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::empty();
        let mut warnings = WarningDeduplicator::new();
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };

        for _ in 0..2 {
            let formula = render_formula(&typesetter, r"a \\[1em] b \newline c", &settings, &mut warnings, &host);
            assert_eq!(formula, Formula::Rendered("<span class=\"katex\">a   b   c</span>".into()));
        }
        assert_eq!(
            host.notifications(),
            [r"KaTeX: In LaTeX, \\ or \newline does nothing in display mode [newLineInDisplayMode]"]
        );
    }

    #[test]
    fn test_allow_all_ignores_violations() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::empty();
        let mut warnings = WarningDeduplicator::new();
        let settings = settings_with(AllowedFeatures::All);

        let source = "\\htmlId{a}{é} \\kern1mu % end \u{1F600}";
        let formula = render_formula(&typesetter, source, &settings, &mut warnings, &host);
        assert!(formula.is_rendered());
        assert!(host.notifications().is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_allowed_feature_is_ignored() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::empty();
        let mut warnings = WarningDeduplicator::new();
        let settings = settings_with([FeatureName::CommentAtEnd].into_iter().collect());

        let formula = render_formula(&typesetter, "x % note", &settings, &mut warnings, &host);
        assert!(formula.is_rendered());
        assert!(host.notifications().is_empty());
    }

    #[test]
    fn test_disallowed_feature_notifies_once() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::empty();
        let mut warnings = WarningDeduplicator::new();
        let settings = Settings::default();

        for _ in 0..2 {
            let formula = render_formula(&typesetter, "x % note", &settings, &mut warnings, &host);
            let Formula::Failed { message, fallback } = formula else {
                panic!("strict violation must fail the render");
            };
            assert!(message.contains("[commentAtEnd]"));
            assert!(fallback.starts_with(r#"<span class="katex-error""#));
            assert!(fallback.ends_with(">x % note</span>"));
        }

        assert_eq!(host.notifications().len(), 1);
        assert!(host.notifications()[0].starts_with("KaTeX: % comment has no terminating newline"));
        assert!(host.notifications()[0].ends_with("[commentAtEnd]"));
        assert_eq!(host.levels(), [NotificationLevel::Error]);

        // Another formula with the same problem is a new warning.
        render_formula(&typesetter, "y % note", &settings, &mut warnings, &host);
        assert_eq!(host.notifications().len(), 2);
    }

    #[test]
    fn test_notification_failure_still_renders_fallback() {
        let typesetter = EchoTypesetter::default();
        let host = MockHost::failing();
        let mut warnings = WarningDeduplicator::new();
        let formula = render_formula(&typesetter, "é", &Settings::default(), &mut warnings, &host);
        assert!(!formula.is_rendered());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_katex_renders() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let formula = render_formula(&KatexTypesetter, "x^2", &Settings::default(), &mut warnings, &host);
        assert!(formula.is_rendered());
        assert!(formula.html().contains(r#"class="katex""#));
        assert!(formula.html().contains("msup"));
    }

    #[test]
    fn test_katex_display_mode() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };
        let formula = render_formula(&KatexTypesetter, "x^2", &settings, &mut warnings, &host);
        assert!(formula.html().contains("katex-display"));
    }

    #[test]
    fn test_katex_macro_expands_like_its_body() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let settings = Settings {
            macros: vec![MacroDefinition::new(r"\foo", "bar")],
            ..Settings::default()
        };

        let with_macro = render_formula(&KatexTypesetter, r"\foo", &settings, &mut warnings, &host);
        let literal = render_formula(&KatexTypesetter, "bar", &settings, &mut warnings, &host);
        assert!(with_macro.is_rendered());
        assert_eq!(katex_html(with_macro.html()), katex_html(literal.html()));
    }

    #[test]
    fn test_katex_display_new_line_renders() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };

        for _ in 0..2 {
            let formula = render_formula(&KatexTypesetter, r"a \\ b", &settings, &mut warnings, &host);
            assert!(formula.is_rendered());
            assert!(formula.html().contains("katex-display"));
        }
        assert_eq!(host.notifications().len(), 1);
        assert!(host.notifications()[0].ends_with("[newLineInDisplayMode]"));
    }

    #[test]
    fn test_katex_href_is_trusted() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let formula = render_formula(
            &KatexTypesetter,
            r"\href{https://a.b}{x}",
            &Settings::default(),
            &mut warnings,
            &host,
        );
        assert!(formula.is_rendered());
        assert!(formula.html().contains(r#"href="https://a.b""#));
        assert!(!formula.html().contains(ERROR_COLOR));
    }

    #[test]
    fn test_katex_verb_renders() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::empty();
        let formula = render_formula(&KatexTypesetter, r"\verb|é|", &Settings::default(), &mut warnings, &host);
        assert!(formula.is_rendered());
        assert!(host.notifications().is_empty());
    }

    #[test]
    fn test_katex_parse_error_falls_back() {
        let mut warnings = WarningDeduplicator::new();
        let host = MockHost::new(json!({}));
        let formula = render_formula(&KatexTypesetter, r"\frac{a}{", &Settings::default(), &mut warnings, &host);
        let Formula::Failed { message, fallback } = formula else {
            panic!("incomplete formula must not render");
        };
        assert!(message.contains("KaTeX parse error"));
        assert!(fallback.contains(r"\frac{a}{"));
        // Engine failures are logged, not notified.
        assert!(host.notifications().is_empty());
    }
}
