//! Post-processing: make engine Markdown publishable as MDX.
//!
//! The engine writes image links pointing at wherever it saved the files on
//! disk, and emits a couple of constructs that are valid Markdown but break an
//! MDX/JSX compiler:
//!
//! - a line consisting only of `...` parses as a JavaScript spread
//! - `<br>` is not a closed JSX element
//!
//! Each rule is a pure `&str → String` pass with no shared state. They target
//! disjoint patterns, so their relative order does not change the result.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Glyph substituted for a bare `...` line.
pub const OMISSION_MARKER: &str = "（省略）";

/// Apply all post-processing rules to the raw engine output.
///
/// Rules (applied in order):
/// 1. Rewrite local image links to `assets_rel/<file name>`
/// 2. Replace lines consisting only of `...` with [`OMISSION_MARKER`]
/// 3. Turn every `<br>` into `<br />`
pub fn finalize(input: &str, assets_rel: &str) -> String {
    let s = rewrite_image_links(input, assets_rel);
    let s = escape_bare_ellipsis(&s);
    self_close_line_breaks(&s)
}

// ── Rule 1: Rewrite image links ──────────────────────────────────────────────

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());

/// Point every local image reference at `assets_rel`.
///
/// `![alt](dir/sub/fig.png)` becomes `![](<assets_rel>/fig.png)`: only the
/// last path segment survives and the alt text is dropped. Links whose target
/// starts with `http` or `data:` are left exactly as written. Trailing `/` on
/// `assets_rel` are ignored.
pub fn rewrite_image_links(input: &str, assets_rel: &str) -> String {
    let rel = assets_rel.trim_end_matches('/');
    RE_IMAGE
        .replace_all(input, |caps: &Captures<'_>| {
            let url = &caps[1];
            if is_remote(url) {
                caps[0].to_string()
            } else {
                format!("![]({}/{})", rel, file_name(url))
            }
        })
        .into_owned()
}

/// File names of every local image link in `input`, in order of appearance,
/// without duplicates.
pub fn linked_image_files(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in RE_IMAGE.captures_iter(input) {
        let url = &caps[1];
        if is_remote(url) {
            continue;
        }
        let name = file_name(url);
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http") || url.starts_with("data:")
}

/// Final path segment of a link target. Both `/` and `\` separate segments,
/// so Windows paths reduce to their file name too.
fn file_name(url: &str) -> &str {
    url.rsplit(['/', '\\']).next().unwrap_or(url)
}

// ── Rule 2: Escape bare ellipsis lines ───────────────────────────────────────

static RE_BARE_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\.\.\.$").unwrap());

/// Replace every line that is exactly `...` with [`OMISSION_MARKER`].
pub fn escape_bare_ellipsis(input: &str) -> String {
    RE_BARE_ELLIPSIS
        .replace_all(input, OMISSION_MARKER)
        .into_owned()
}

// ── Rule 3: Self-close line breaks ───────────────────────────────────────────

/// Replace every literal `<br>` with `<br />`.
pub fn self_close_line_breaks(input: &str) -> String {
    input.replace("<br>", "<br />")
}

// ── Tests ────────────────────────────────────────────────────────────────────
