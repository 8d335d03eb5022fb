// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use camino::{Utf8Path, Utf8PathBuf};
use eyre::WrapErr;

use crate::{
    host::{self, Host, TomlHost},
    html_flake,
    renderer::Typesetter,
    widget::{RenderResult, Widget},
};

#[derive(clap::Args)]
pub struct RenderCommand {
    /// Formula source, e.g. "x^2". Read from `--file` or stdin when omitted.
    pub formula: Option<String>,

    /// Read the formula source from this file.
    #[arg(short, long, conflicts_with = "formula")]
    pub file: Option<Utf8PathBuf>,

    /// Path to the configuration file (e.g., "KatexWidget.toml").
    #[arg(short, long, default_value_t = host::DEFAULT_CONFIG_PATH.into())]
    pub config: Utf8PathBuf,

    /// Write a standalone preview page here instead of printing JSON.
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

pub fn render(command: &RenderCommand) -> eyre::Result<()> {
    let source = match (&command.formula, &command.file) {
        (Some(formula), _) => formula.clone(),
        (None, Some(file)) => read_formula(file)?,
        (None, None) => std::io::read_to_string(std::io::stdin())
            .wrap_err("failed to read formula from stdin")?,
    };

    let mut widget = Widget::new(TomlHost::new(&command.config));
    let result = widget.render(source.trim_end_matches('\n'));

    match &command.output {
        Some(output) => write_preview(output, &result),
        None => {
            let json = serde_json::to_string_pretty(&result)
                .wrap_err("failed to serialize widget")?;
            println!("{}", json);
            Ok(())
        }
    }
}

pub fn read_formula(path: &Utf8Path) -> eyre::Result<String> {
    let source = std::fs::read_to_string(path)
        .wrap_err_with(|| eyre::eyre!("failed to read file `{}`", path))?;
    Ok(source.trim_end_matches('\n').to_string())
}

/// Render `file` and write its preview page to `output`.
pub fn render_file<H: Host, T: Typesetter>(
    widget: &mut Widget<H, T>,
    file: &Utf8Path,
    output: &Utf8Path,
) -> eyre::Result<()> {
    let source = read_formula(file)?;
    let result = widget.render(&source);
    write_preview(output, &result)
}

fn write_preview(output: &Utf8Path, result: &RenderResult) -> eyre::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| eyre::eyre!("failed to create directory `{}`", parent))?;
    }
    std::fs::write(output, html_flake::preview_document(result))
        .wrap_err_with(|| eyre::eyre!("failed to write file `{}`", output))?;
    color_print::cprintln!("<g>Rendered</> {}", output);
    Ok(())
}
