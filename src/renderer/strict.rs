// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

//! Lexical detection of the LaTeX-incompatible constructs KaTeX reports
//! through its strict mode.
//!
//! Detection is shallow: it tokenizes control sequences,
//! comments and braces, and tracks text-mode groups and environments. It does
//! not expand macros, so constructs hidden behind user macros go unreported.

use std::{iter::Peekable, ops::Range};

use crate::config::FeatureName;

/// One LaTeX-incompatible construct found in a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub feature: FeatureName,
    pub message: String,
    pub token: Option<String>,
    /// Byte range of the offending construct in the source.
    pub span: Option<Range<usize>>,
}

impl Violation {
    fn new<M: Into<String>, T: Into<String>>(feature: FeatureName, message: M, token: T) -> Violation {
        Violation {
            feature,
            message: message.into(),
            token: Some(token.into()),
            span: None,
        }
    }

    fn at(self, span: Range<usize>) -> Violation {
        Violation {
            span: Some(span),
            ..self
        }
    }

    /// Whether rejecting this violation fails the render. KaTeX only drops a
    /// rejected `\\` in display mode and keeps parsing.
    pub fn is_fatal(&self) -> bool {
        self.feature != FeatureName::NewLineInDisplayMode
    }

    /// The parse error KaTeX raises when this violation is treated as an error.
    pub fn strict_error(&self) -> String {
        format!(
            "KaTeX parse error: LaTeX-incompatible input and strict mode is set to 'error': {} [{}]",
            self.message, self.feature
        )
    }
}

const COMMENT_AT_END: &str = "% comment has no terminating newline; LaTeX would fail because of commenting the end of math mode (e.g. $)";
const HTML_EXTENSION: &str = "HTML extension is disabled on strict mode";
const NEW_LINE_IN_DISPLAY_MODE: &str = r"In LaTeX, \\ or \newline does nothing in display mode";

const HTML_COMMANDS: [&str; 4] = [r"\htmlClass", r"\htmlId", r"\htmlStyle", r"\htmlData"];
const KERN_COMMANDS: [&str; 4] = [r"\kern", r"\hskip", r"\mkern", r"\mskip"];
const TEXT_COMMANDS: [&str; 13] = [
    r"\text", r"\textrm", r"\textsf", r"\texttt", r"\textnormal", r"\textbf", r"\textmd",
    r"\textit", r"\textup", r"\emph", r"\mbox", r"\hbox", r"\textsc",
];

#[derive(Debug, Clone, Copy, Default)]
struct Group {
    text: bool,
    rows: bool,
}

#[derive(Default)]
struct Scanner {
    display_mode: bool,
    /// Byte offset of every char, plus the source length.
    offsets: Vec<usize>,
    groups: Vec<Group>,
    environments: usize,
    /// The next argument is a text-mode argument.
    pending_text: bool,
    /// The next argument is split into rows, as in `\substack`.
    pending_rows: bool,
    violations: Vec<Violation>,
}

/// Find every LaTeX-incompatible construct of `source`, in source order.
pub fn scan(source: &str, display_mode: bool) -> Vec<Violation> {
    let mut scanner = Scanner {
        display_mode,
        offsets: source.char_indices().map(|(b, _)| b).chain([source.len()]).collect(),
        ..Scanner::default()
    };
    scanner.run(&source.chars().collect::<Vec<_>>());
    scanner.violations
}

impl Scanner {
    fn in_text(&self) -> bool {
        self.groups.last().is_some_and(|g| g.text)
    }

    fn in_rows(&self) -> bool {
        self.environments > 0 || self.groups.iter().any(|g| g.rows)
    }

    fn run(&mut self, chars: &[char]) {
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            // A text command without braces takes a single token as argument.
            let single_text_token = std::mem::take(&mut self.pending_text);
            let rows = std::mem::take(&mut self.pending_rows);

            match c {
                '\\' => {
                    let start = i;
                    i += 1;
                    if i < chars.len() && chars[i].is_ascii_alphabetic() {
                        while i < chars.len() && chars[i].is_ascii_alphabetic() {
                            i += 1;
                        }
                    } else if i < chars.len() {
                        i += 1;
                    }
                    let name: String = chars[start..i].iter().collect();
                    if name == r"\verb" {
                        i = skip_verb(chars, i);
                    } else {
                        self.command(&name, chars, start..i);
                    }
                    continue;
                }
                '%' => {
                    match chars[i..].iter().position(|&c| c == '\n') {
                        Some(offset) => i += offset,
                        None => {
                            self.violations
                                .push(Violation::new(FeatureName::CommentAtEnd, COMMENT_AT_END, "%"));
                            i = chars.len();
                        }
                    }
                }
                '{' => {
                    let text = single_text_token || self.in_text();
                    self.groups.push(Group { text, rows });
                }
                '}' => {
                    self.groups.pop();
                }
                c if !c.is_ascii() => {
                    let text = single_text_token || self.in_text();
                    self.symbol(c, text);
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Handle the command `name` found at `chars[at]`.
    fn command(&mut self, name: &str, chars: &[char], at: Range<usize>) {
        let rest = &chars[at.end..];
        match name {
            r"\\" | r"\newline" if self.display_mode && !self.in_rows() => {
                let size = match name {
                    r"\\" => size_argument(rest),
                    _ => 0,
                };
                let span = self.offsets[at.start]..self.offsets[at.end + size];
                self.violations.push(
                    Violation::new(FeatureName::NewLineInDisplayMode, NEW_LINE_IN_DISPLAY_MODE, name)
                        .at(span),
                );
            }
            r"\begin" => self.environments += 1,
            r"\end" => self.environments = self.environments.saturating_sub(1),
            r"\substack" => self.pending_rows = true,
            _ if HTML_COMMANDS.contains(&name) => {
                self.violations
                    .push(Violation::new(FeatureName::HtmlExtension, HTML_EXTENSION, name));
            }
            _ if KERN_COMMANDS.contains(&name) => self.kern(name, rest),
            _ if TEXT_COMMANDS.contains(&name) => self.pending_text = true,
            _ => {}
        }
    }

    /// `\kern` and `\hskip` take non-mu units, `\mkern` and `\mskip` only mu
    /// units and only in math mode.
    fn kern(&mut self, name: &str, rest: &[char]) {
        let Some(unit) = dimension_unit(rest) else {
            return;
        };
        let math_function = name.starts_with(r"\m");
        let mu = unit == "mu";
        let in_text = self.in_text();
        let mut report = |message: String| {
            self.violations
                .push(Violation::new(FeatureName::MathVsTextUnits, message, name));
        };
        if math_function {
            if !mu {
                report(format!("LaTeX's {} supports only mu units, not {} units", name, unit));
            }
            if in_text {
                report(format!("LaTeX's {} works only in math mode", name));
            }
        } else if mu {
            report(format!("LaTeX's {} doesn't support mu units", name));
        }
    }

    fn symbol(&mut self, c: char, text: bool) {
        if is_math_symbol(c) {
            return;
        }
        if c.is_alphabetic() {
            if !text {
                self.violations.push(Violation::new(
                    FeatureName::UnicodeTextInMathMode,
                    format!("Unicode text character \"{}\" used in math mode", c),
                    c,
                ));
            }
            return;
        }
        // Reported with the first UTF-16 unit, as KaTeX does.
        let unit = c.encode_utf16(&mut [0; 2])[0];
        self.violations.push(Violation::new(
            FeatureName::UnknownSymbol,
            format!("Unrecognized Unicode character \"{}\" ({})", c, unit),
            c,
        ));
    }
}

/// Index just past the argument of `\verb` or `\verb*`, delimited by the
/// first char after the command name.
fn skip_verb(chars: &[char], mut i: usize) -> usize {
    if chars.get(i) == Some(&'*') {
        i += 1;
    }
    let Some(&delimiter) = chars.get(i) else {
        return i;
    };
    match chars[i + 1..].iter().position(|&c| c == delimiter) {
        Some(offset) => i + offset + 2,
        None => chars.len(),
    }
}

/// Length in chars of the `[2pt]` size argument of `\\` at the start of `rest`.
fn size_argument(rest: &[char]) -> usize {
    let spaces = rest.iter().take_while(|c| c.is_whitespace()).count();
    if rest.get(spaces) != Some(&'[') {
        return 0;
    }
    match rest[spaces..].iter().position(|&c| c == ']') {
        Some(close) => spaces + close + 1,
        None => 0,
    }
}

fn skip_spaces<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Unit of the dimension at the start of `rest`, e.g. `mu` for ` {-1.5 mu}`.
fn dimension_unit(rest: &[char]) -> Option<String> {
    let mut chars = rest.iter().copied().peekable();

    skip_spaces(&mut chars);
    chars.next_if_eq(&'{');
    skip_spaces(&mut chars);
    while chars.next_if(|c| matches!(c, '+' | '-')).is_some() {
        skip_spaces(&mut chars);
    }
    let mut digits = 0;
    while chars.next_if(|c| c.is_ascii_digit() || matches!(c, '.' | ',')).is_some() {
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    skip_spaces(&mut chars);
    let unit: String = chars.take(2).collect();
    (unit.len() == 2 && unit.chars().all(|c| c.is_ascii_lowercase())).then_some(unit)
}

/// Non-ASCII characters KaTeX accepts in math mode: Greek and the
/// mathematical symbol blocks.
fn is_math_symbol(c: char) -> bool {
    matches!(c,
        '¬' | '±' | '·' | '×' | '÷' | '°' | '§' | '¶' | '£' | '©' | '®' | 'ð' | 'ı' | 'ȷ'
        | '\u{0370}'..='\u{03FF}'
        | '\u{2000}'..='\u{206F}'
        | '\u{20D0}'..='\u{214F}'
        | '\u{2190}'..='\u{23FF}'
        | '\u{25A0}'..='\u{27FF}'
        | '\u{2900}'..='\u{2AFF}'
        | '\u{1D400}'..='\u{1D7FF}'
    )
}
