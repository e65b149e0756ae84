//! URL sanitization and the table of URL-bearing HTML attributes.

use crate::filter::UrlTransform;
use std::rc::Rc;

const SAFE_PROTOCOLS: [&str; 6] = ["http", "https", "irc", "ircs", "mailto", "xmpp"];

/// Sanitize a URL for use in an HTML attribute.
///
/// Relative URLs and URLs with a safe protocol pass through unchanged;
/// anything else (`javascript:`, `data:`, ...) is neutralized to the empty
/// string. A `:` that appears after the first `?`, `#`, or `/` is part of the
/// path, query, or fragment rather than a protocol.
pub fn sanitize_url(value: &str) -> String {
    let Some(colon) = value.find(':') else {
        return value.to_string();
    };

    for stop in ['?', '#', '/'] {
        if let Some(position) = value.find(stop) {
            if colon > position {
                return value.to_string();
            }
        }
    }

    let protocol = &value[..colon];
    if SAFE_PROTOCOLS
        .iter()
        .any(|safe| protocol.eq_ignore_ascii_case(safe))
    {
        value.to_string()
    } else {
        String::new()
    }
}

/// The default URL transform applied to every URL-bearing attribute.
pub fn default_url_transform() -> UrlTransform {
    Rc::new(|url, _key, _element| sanitize_url(url))
}

/// HTML attributes that carry URLs, and the tags they carry them on.
///
/// `None` means the attribute is URL-bearing on every element (`itemid`).
pub const URL_ATTRIBUTES: &[(&str, Option<&[&str]>)] = &[
    ("action", Some(&["form"])),
    ("cite", Some(&["blockquote", "del", "ins", "q"])),
    ("data", Some(&["object"])),
    ("formaction", Some(&["button", "input"])),
    ("href", Some(&["a", "area", "base", "link"])),
    ("icon", Some(&["menuitem"])),
    ("itemid", None),
    ("manifest", Some(&["html"])),
    ("ping", Some(&["a", "area"])),
    ("poster", Some(&["video"])),
    (
        "src",
        Some(&[
            "audio", "embed", "iframe", "img", "input", "script", "source", "track", "video",
        ]),
    ),
];

#[cfg(test)]
mod tests {
    use super::sanitize_url;

    #[test]
    fn relative_urls_pass_through() {
        assert_eq!(sanitize_url("/relative/path"), "/relative/path");
        assert_eq!(sanitize_url("page.html"), "page.html");
        assert_eq!(sanitize_url(""), "");
    }

    #[test]
    fn colon_after_path_query_or_fragment_is_not_a_protocol() {
        assert_eq!(sanitize_url("/a:b"), "/a:b");
        assert_eq!(sanitize_url("?q=a:b"), "?q=a:b");
        assert_eq!(sanitize_url("#a:b"), "#a:b");
        assert_eq!(sanitize_url("./5:30.html"), "./5:30.html");
    }

    #[test]
    fn safe_protocols_pass_through() {
        assert_eq!(sanitize_url("https://example.com"), "https://example.com");
        assert_eq!(sanitize_url("HTTP://example.com"), "HTTP://example.com");
        assert_eq!(sanitize_url("mailto:a@b.com"), "mailto:a@b.com");
        assert_eq!(sanitize_url("irc://irc.example/chan"), "irc://irc.example/chan");
        assert_eq!(sanitize_url("xmpp:user@host"), "xmpp:user@host");
    }

    #[test]
    fn unsafe_protocols_are_neutralized() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("JaVaScRiPt:alert(1)"), "");
        assert_eq!(sanitize_url("data:text/html,<b>x</b>"), "");
        assert_eq!(sanitize_url("vbscript:msgbox"), "");
    }
}
