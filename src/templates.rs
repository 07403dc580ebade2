//! HTML page rendering
//!
//! The pages and the upload script live in `templates/` and are compiled into
//! the binary. Placeholders have the form `{{ name }}`; every substituted
//! value is HTML-escaped.

use crate::upload::ALLOWED_EXTENSIONS;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const RESULT_TEMPLATE: &str = include_str!("../templates/result.html");

/// Script behind the upload page: previews the chosen image and shows the
/// `/predict` answer in place.
pub const UPLOAD_SCRIPT: &str = include_str!("../templates/script.js");

/// Path the upload script is served from
pub const UPLOAD_SCRIPT_PATH: &str = "/static/script.js";

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fill placeholders in a single pass over the template.
///
/// Substituted text is never scanned again. Unknown placeholders are left as
/// they are.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let Some(end) = tail.find("}}") else {
            rest = tail;
            break;
        };
        let placeholder = &tail[..end + 2];
        let key = placeholder[2..end].trim();

        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(&escape_html(value)),
            None => out.push_str(placeholder),
        }
        rest = &tail[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Upload page
pub fn render_index() -> String {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    let formats = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    render(
        INDEX_TEMPLATE,
        &[
            ("accept", &accept),
            ("formats", &formats),
            ("script", UPLOAD_SCRIPT_PATH),
        ],
    )
}

/// Result page for one prediction
///
/// `prediction` is the readable class name and `label` the raw class label
/// from `class_names.txt`. `confidence` is the formatted percentage without
/// the `%` sign.
pub fn render_result(prediction: &str, label: &str, confidence: &str, image_file: &str) -> String {
    render(
        RESULT_TEMPLATE,
        &[
            ("prediction", prediction),
            ("label", label),
            ("confidence", confidence),
            ("image_file", image_file),
        ],
    )
}
