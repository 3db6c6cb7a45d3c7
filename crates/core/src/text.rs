//! Small text helpers shared by the rendering passes.

/// HTML-escapes the special characters `&`, `<` and `>`.
///
/// Verbatim quote bodies, escaped replacement matches, and the
/// safe-mode escape policy all funnel through this one function so the
/// escape table cannot drift between passes.
pub(crate) fn replace_special_chars(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_specials_only() {
        assert_eq!(replace_special_chars("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(replace_special_chars("plain 'text'"), "plain 'text'");
    }
}
