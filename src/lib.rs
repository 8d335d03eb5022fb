// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

//! Render LaTeX formulas into HTML widgets for an editor's page panel.
//!
//! ```no_run
//! use katex_widget::{host::TomlHost, widget::Widget};
//!
//! let mut widget = Widget::new(TomlHost::new("./KatexWidget.toml"));
//! let result = widget.render(r"\frac{a}{b}");
//! println!("{}\n<script>{}</script>", result.html, result.script);
//! ```

pub mod cli;
pub mod config;
pub mod dedup;
pub mod host;
pub mod html_flake;
pub mod renderer;
pub mod widget;
