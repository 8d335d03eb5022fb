// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use crate::widget::RenderResult;

pub const KATEX_VERSION: &str = "0.16.4";

/// Id of the element holding the rendered formula.
pub const FORMULA_ID: &str = "katex";

pub fn katex_stylesheet_url() -> String {
    format!(
        "https://cdn.jsdelivr.net/npm/katex@{}/dist/katex.min.css",
        KATEX_VERSION
    )
}

/// Runs once the stylesheet is applied: show the formula, release the pinned
/// height and let the host measure the real one.
fn html_reveal_handler() -> String {
    format!(
        "document.getElementById('{}').style.display = 'block'; \
         document.documentElement.style.height = ''; \
         updateHeight();",
        FORMULA_ID
    )
}

pub fn html_stylesheet(href: &str, onload: &str) -> String {
    format!(
        r#"<link rel="stylesheet" href="{}" crossorigin="anonymous" onload="{}">"#,
        htmlize::escape_attribute(href),
        htmlize::escape_attribute(onload)
    )
}

pub fn html_hidden_formula(formula_html: &str) -> String {
    format!(
        r#"<div id="{}" style="display: none;">{}</div>"#,
        FORMULA_ID, formula_html
    )
}

/// The formula stays hidden until the KaTeX stylesheet has loaded.
pub fn widget_html(formula_html: &str) -> String {
    format!(
        "\n{}\n{}\n",
        html_stylesheet(&katex_stylesheet_url(), &html_reveal_handler()),
        html_hidden_formula(formula_html)
    )
}

/// Pin the document to the full frame height while the formula is hidden.
/// Otherwise the host measures the empty document, shrinks the frame, and
/// grows it again once the formula appears.
pub fn widget_script() -> String {
    r#"document.documentElement.style.height = "100%";"#.to_string()
}

/// Standalone page showing a widget outside the editor, with the host's
/// globals stubbed out.
pub fn preview_document(result: &RenderResult) -> String {
    let doc_type = "<!DOCTYPE html>";
    let head = format!(
        r#"<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8">
<meta name="viewport" content="width=device-width">
<title>KaTeX widget preview</title>
<script>{}</script>
</head>"#,
        html_host_stubs()
    );
    let body = format!(
        "<body>{}<script>\n{}\n</script>\n</body>",
        result.html, result.script
    );
    format!("{}\n<html lang=\"en-US\">\n{}\n{}\n</html>\n", doc_type, head, body)
}

fn html_host_stubs() -> &'static str {
    r#"
function updateHeight() {
  console.log("updateHeight", document.documentElement.scrollHeight);
}
function api(request) {
  console.log("api", JSON.stringify(request));
}
"#
}
