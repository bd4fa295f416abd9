//! XSS-safe HTML sanitization with ammonia.

use ammonia::Builder;

/// Strip everything outside the allow-list: scripts, styles, event handlers,
/// `javascript:` URLs and comments.
///
/// ammonia's default allow-list is extended with `class` on `<code>` (for the
/// `language-*` hint) and `start` on `<ol>`.
pub fn sanitize(html: &str) -> String {
    Builder::default()
        .add_tag_attributes("code", &["class"])
        .add_tag_attributes("ol", &["start"])
        .link_rel(None)
        .clean(html)
        .to_string()
}
