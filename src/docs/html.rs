// src/docs/html.rs
// =============================================================================
// Converts generated Markdown into a small standalone HTML page.
//
// This is deliberately not a full Markdown renderer. It understands only what
// the generated documentation uses:
// - "# ", "## ", "### " headings
// - "* **Term** rest" list items (bold lead-in)
// - "* item" / "- item" list items
// - ``` fenced code blocks
// - everything else: the line followed by <br>
// =============================================================================

const TEMPLATE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; color: #1f2328; }
h1, h2, h3 { border-bottom: 1px solid #d0d7de; padding-bottom: .3em; }
pre { background: #f6f8fa; padding: 1rem; overflow: auto; border-radius: 6px; }
code { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; font-size: 85%; }
li { margin: .25em 0; }
</style>
</head>
<body>
"#;

const TEMPLATE_TAIL: &str = "\n</body>\n</html>\n";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// Converts one line outside of a code block
fn convert_line(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("### ") {
        return format!("<h3>{}</h3>", escape(rest));
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return format!("<h2>{}</h2>", escape(rest));
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return format!("<h1>{}</h1>", escape(rest));
    }

    let item = line
        .strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "));

    if let Some(item) = item {
        // "**Term**: description"
        if let Some(bold) = item.strip_prefix("**") {
            if let Some((term, rest)) = bold.split_once("**") {
                return format!("<li><strong>{}</strong>{}</li>", escape(term), escape(rest));
            }
        }
        return format!("<li>{}</li>", escape(item));
    }

    format!("{}<br>", escape(line))
}

/// Converts the Markdown subset described above into an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut code: Option<Vec<String>> = None;

    for line in markdown.lines() {
        let is_fence = line.trim_start().starts_with("```");

        if is_fence {
            match code.take() {
                // Closing fence
                Some(lines) => out.push(format!("<pre><code>{}</code></pre>", lines.join("\n"))),
                // Opening fence (the language tag is dropped)
                None => code = Some(Vec::new()),
            }
        } else if let Some(lines) = code.as_mut() {
            lines.push(escape(line));
        } else {
            out.push(convert_line(line));
        }
    }

    // Unterminated fence: still show what we collected
    if let Some(lines) = code {
        out.push(format!("<pre><code>{}</code></pre>", lines.join("\n")));
    }

    out.join("\n")
}

/// Wraps converted Markdown in the full page template
pub fn render_page(title: &str, markdown: &str) -> String {
    format!(
        "{}{}{}",
        TEMPLATE_HEAD.replace("{title}", &escape(title)),
        markdown_to_html(markdown),
        TEMPLATE_TAIL
    )
}
