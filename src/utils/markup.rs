//! Escaping for Telegram's HTML parse mode.
//!
//! Telegram only requires `&`, `<` and `>` to be escaped outside of tags.

/// Escape `&`, `<` and `>` so the text cannot open or close markup.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_html`]. `&amp;` is decoded last.
pub fn unescape_html(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_basic() {
        assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(
            escape_html("<b>bold</b>"),
            "&lt;b&gt;bold&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_escape_does_not_touch_quotes() {
        assert_eq!(escape_html(r#"O'Brien "Jr""#), r#"O'Brien "Jr""#);
    }

    #[test]
    fn test_unescape_already_escaped_entity() {
        // "&lt;" typed literally by the user must come back literally.
        let original = "&lt;";
        let escaped = escape_html(original);
        assert_eq!(escaped, "&amp;lt;");
        assert_eq!(unescape_html(&escaped), original);
    }

    proptest! {
        #[test]
        fn prop_escape_round_trips(s in any::<String>()) {
            let escaped = escape_html(&s);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert_eq!(unescape_html(&escaped), s);
        }

        #[test]
        fn prop_every_ampersand_starts_an_entity(s in "[a-z&<> ]{0,40}") {
            let escaped = escape_html(&s);
            for (i, _) in escaped.match_indices('&') {
                let rest = &escaped[i..];
                prop_assert!(
                    rest.starts_with("&amp;") || rest.starts_with("&lt;") || rest.starts_with("&gt;")
                );
            }
        }
    }
}
