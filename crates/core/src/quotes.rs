//! Quote definitions and the shared quote scanner.

/// An inline quote: a 1-2 character delimiter pair mapped to an HTML tag
/// pair. `spans=false` quotes render their body verbatim (escaped, with
/// replacements restored to source form).
#[derive(Clone, Debug)]
pub(crate) struct QuoteDef {
    /// The quote characters, e.g. `**` or `` ` ``.
    pub(crate) quote: String,
    /// HTML emitted before the quoted text.
    pub(crate) open_tag: String,
    /// HTML emitted after the quoted text.
    pub(crate) close_tag: String,
    /// Recursively span-render the quoted text?
    pub(crate) spans: bool,
}

/// Byte offsets of one quote occurrence, relative to the scanned text.
/// `start..end` covers the whole match including a leading backslash
/// escape when present.
pub(crate) struct QuoteMatch {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) quote_start: usize,
    pub(crate) quote_end: usize,
    pub(crate) body_start: usize,
    pub(crate) body_end: usize,
}

/// Ordered quote registry plus the scanner compiled from it.
///
/// The scanner is a single disjunction over every registered quote,
/// longest quote first so `**` wins over `*`. It needs a backreference
/// for the closing quote, hence `fancy_regex`.
pub(crate) struct QuoteRegistry {
    defs: Vec<QuoteDef>,
    scanner: fancy_regex::Regex,
    unescaper: regex::Regex,
}

fn default_defs() -> Vec<QuoteDef> {
    let def = |quote: &str, open: &str, close: &str, spans: bool| QuoteDef {
        quote: quote.to_string(),
        open_tag: open.to_string(),
        close_tag: close.to_string(),
        spans,
    };
    vec![
        def("**", "<strong>", "</strong>", true),
        def("*", "<strong>", "</strong>", true),
        def("__", "<em>", "</em>", true),
        def("_", "<em>", "</em>", true),
        def("``", "<code>", "</code>", false),
        def("`", "<code>", "</code>", false),
        def("~~", "<del>", "</del>", true),
    ]
}

impl QuoteRegistry {
    pub(crate) fn new() -> Self {
        let defs = default_defs();
        let (scanner, unescaper) = compile(&defs);
        QuoteRegistry {
            defs,
            scanner,
            unescaper,
        }
    }

    /// Replaces the definition with the same quote in place, or appends
    /// a new one, then recompiles the scanner.
    pub(crate) fn set_definition(&mut self, def: QuoteDef) {
        match self.defs.iter_mut().find(|d| d.quote == def.quote) {
            Some(existing) => *existing = def,
            None => self.defs.push(def),
        }
        let (scanner, unescaper) = compile(&self.defs);
        self.scanner = scanner;
        self.unescaper = unescaper;
    }

    /// The definition for `quote`, if registered.
    pub(crate) fn definition(&self, quote: &str) -> Option<&QuoteDef> {
        self.defs.iter().find(|d| d.quote == quote)
    }

    /// Finds the first quote occurrence in `text`.
    pub(crate) fn find(&self, text: &str) -> Option<QuoteMatch> {
        let caps = match self.scanner.captures(text) {
            Ok(caps) => caps?,
            Err(err) => {
                log::warn!("quote scan aborted: {err}");
                return None;
            }
        };
        let whole = caps.get(0)?;
        let quote = caps.get(1)?;
        let body = caps.get(2)?;
        Some(QuoteMatch {
            start: whole.start(),
            end: whole.end(),
            quote_start: quote.start(),
            quote_end: quote.end(),
            body_start: body.start(),
            body_end: body.end(),
        })
    }

    /// Strips the backslash from `\<quote>` escapes of registered quotes.
    pub(crate) fn unescape(&self, text: &str) -> String {
        self.unescaper.replace_all(text, "${1}").into_owned()
    }
}

fn compile(defs: &[QuoteDef]) -> (fancy_regex::Regex, regex::Regex) {
    let mut quotes: Vec<&str> = defs.iter().map(|d| d.quote.as_str()).collect();
    // Longest first so multi-character quotes win over their prefixes.
    quotes.sort_by_key(|q| std::cmp::Reverse(q.len()));
    let alternation = quotes
        .iter()
        .map(|q| regex::escape(q))
        .collect::<Vec<_>>()
        .join("|");
    let scanner = fancy_regex::Regex::new(&format!(
        r"\\?({alternation})([^\s\\]|\S[\s\S]*?[^\s\\])\1"
    ))
    .expect("quote scanner pattern");
    let unescaper =
        regex::Regex::new(&format!(r"\\({alternation})")).expect("quote unescape pattern");
    (scanner, unescaper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_first_quote() {
        let registry = QuoteRegistry::new();
        let m = registry.find("a *b* c").unwrap();
        assert_eq!(m.start, 2);
        assert_eq!(m.end, 5);
        assert_eq!(&"a *b* c"[m.quote_start..m.quote_end], "*");
        assert_eq!(&"a *b* c"[m.body_start..m.body_end], "b");
    }

    #[test]
    fn longer_quotes_win() {
        let registry = QuoteRegistry::new();
        let text = "**b**";
        let m = registry.find(text).unwrap();
        assert_eq!(&text[m.quote_start..m.quote_end], "**");
        assert_eq!(&text[m.body_start..m.body_end], "b");
    }

    #[test]
    fn escaped_quote_is_included_in_the_match() {
        let registry = QuoteRegistry::new();
        let text = r"\*b*";
        let m = registry.find(text).unwrap();
        assert_eq!(m.start, 0);
        assert_eq!(text.as_bytes()[m.start], b'\\');
    }

    #[test]
    fn unescape_strips_quote_escapes_only() {
        let registry = QuoteRegistry::new();
        assert_eq!(registry.unescape(r"\*x\* \y"), r"*x* \y");
    }

    #[test]
    fn set_definition_replaces_or_appends() {
        let mut registry = QuoteRegistry::new();
        registry.set_definition(QuoteDef {
            quote: "*".to_string(),
            open_tag: "<b>".to_string(),
            close_tag: "</b>".to_string(),
            spans: true,
        });
        assert_eq!(registry.definition("*").unwrap().open_tag, "<b>");
        // Multi-character quotes still win over the override's prefix.
        let text = "**x**";
        let m = registry.find(text).unwrap();
        assert_eq!(&text[m.quote_start..m.quote_end], "**");
        registry.set_definition(QuoteDef {
            quote: "==".to_string(),
            open_tag: "<mark>".to_string(),
            close_tag: "</mark>".to_string(),
            spans: true,
        });
        let m = registry.find("==hi==").unwrap();
        assert_eq!(&"==hi=="[m.quote_start..m.quote_end], "==");
    }
}
