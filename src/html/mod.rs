//! HTML page builders.
//!
//! Every builder is a pure function of its inputs: the same arguments always
//! produce the same document. Interpolated text goes through [`html_escape`]
//! and JSON placed inside `<script>` goes through [`script_json`].

mod home;
mod launch;
mod registration;

use serde::Serialize;

pub use home::home_html;
pub use launch::{
    launch_content_html, launch_html, DEEP_LINKING_BUTTON_ID, DEEP_LINKING_FORM_ID,
    DEEP_LINK_JWT_ID, LAUNCH_CONTENT_TEMPLATE_ID, MAIN_CONTENT_ID,
};
pub use registration::{registration_complete_html, registration_html};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Serialize `value` for inline use in a `<script>` element.
///
/// `<`, `>` and `&` become JSON unicode escapes so the payload cannot close
/// the script element or open a comment.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    let mut result = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => result.push_str("\\u003c"),
            '>' => result.push_str("\\u003e"),
            '&' => result.push_str("\\u0026"),
            _ => result.push(c),
        }
    }
    result
}

/// Shared document shell.
pub(crate) fn document(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
{head}
</head>
<body>
{body}
</body>
</html>
"#,
        title = html_escape(title),
    )
}
