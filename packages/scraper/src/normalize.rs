//! Response normalization.
//!
//! The search endpoint may answer with a Rails script response (SJR)
//! instead of HTML: a `text/javascript` body such as
//! `$('#resultado').html('<table>…<\/table>');`. Everything downstream
//! wants HTML, so the fragment inside the `.html(...)` call is pulled out
//! and its JavaScript string escapes are undone here.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `.html(` followed by a quoted string literal, across newlines.
static SJR_HTML_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\.html\(['"](.*?)['"]\)"#).unwrap_or_else(|_| unreachable!())
});

/// Returns `true` if the `Content-Type` header value denotes a script body.
#[must_use]
pub fn is_script_response(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("javascript")
}

/// Normalizes a response body to HTML.
///
/// Script responses have their embedded HTML fragment extracted and
/// unescaped. Anything else, including a script response with no
/// `.html(...)` call in it, is returned unchanged.
#[must_use]
pub fn normalize(body: &str, content_type: &str) -> String {
    if is_script_response(content_type)
        && let Some(fragment) = extract_sjr_html(body)
    {
        log::debug!("Unwrapped {} bytes of HTML from script response", fragment.len());
        return fragment;
    }
    body.to_owned()
}

/// Extracts and unescapes the string passed to the first `.html(...)` call.
#[must_use]
pub fn extract_sjr_html(script: &str) -> Option<String> {
    let caps = SJR_HTML_CALL.captures(script)?;
    caps.get(1).map(|m| unescape_js(m.as_str()))
}

/// Reverses `\'`, `\"`, `\n` and `\/` in a single left-to-right pass.
///
/// Any other backslash sequence is kept verbatim.
fn unescape_js(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('/') => out.push('/'),
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }

    out
}
