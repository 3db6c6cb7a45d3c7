//! Replacement definitions: regex driven text-to-HTML rewrites.

use std::rc::Rc;

use crate::engine::Engine;

/// Computes a replacement from the match captures instead of the
/// template. Used by the raw-HTML rule to apply the safe-mode policy.
pub(crate) type ReplacementFilter = fn(&fancy_regex::Captures<'_>, &mut Engine) -> String;

/// A single replacement rule.
///
/// The `replacement` template may reference capture groups as `$1`…`$9`
/// (escape specials in the group) or `$$1`…`$$9` (span-render the
/// group). `raw` rules emit their matched text untouched; they exist to
/// shield characters from the quote scanner (their patterns end in a
/// zero-width lookahead, so nothing past the guard is consumed).
pub(crate) struct ReplacementDef {
    /// Source text of the pattern; the registry key for overrides.
    pub(crate) pattern: String,
    pub(crate) re: fancy_regex::Regex,
    /// Replacement template.
    pub(crate) replacement: String,
    pub(crate) filter: Option<ReplacementFilter>,
    /// Emit the matched text as-is, skipping template expansion.
    pub(crate) raw: bool,
}

/// A document-embedded definition that cannot be registered.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DefinitionError {
    /// The replacement pattern failed to compile.
    #[error("illegal replacement pattern: {pattern}")]
    Pattern {
        /// The offending pattern source.
        pattern: String,
        /// Compile error reported by the regex engine.
        #[source]
        source: Box<fancy_regex::Error>,
    },
}

/// Ordered replacement registry. Order is significant: rules are applied
/// in registry order, so earlier rules win on overlapping matches.
pub(crate) struct ReplacementRegistry {
    defs: Vec<Rc<ReplacementDef>>,
}

fn template_def(pattern: &str, replacement: &str) -> Rc<ReplacementDef> {
    Rc::new(ReplacementDef {
        pattern: pattern.to_string(),
        re: fancy_regex::Regex::new(pattern).expect("replacement pattern"),
        replacement: replacement.to_string(),
        filter: None,
        raw: false,
    })
}

fn filter_def(pattern: &str, filter: ReplacementFilter) -> Rc<ReplacementDef> {
    Rc::new(ReplacementDef {
        pattern: pattern.to_string(),
        re: fancy_regex::Regex::new(pattern).expect("replacement pattern"),
        replacement: String::new(),
        filter: Some(filter),
        raw: false,
    })
}

fn raw_def(pattern: &str) -> Rc<ReplacementDef> {
    Rc::new(ReplacementDef {
        pattern: pattern.to_string(),
        re: fancy_regex::Regex::new(pattern).expect("replacement pattern"),
        replacement: String::new(),
        filter: None,
        raw: true,
    })
}

fn html_safe_mode(caps: &fancy_regex::Captures<'_>, engine: &mut Engine) -> String {
    let html = caps.get(1).map_or("", |m| m.as_str());
    engine.options.html_safe_mode_filter(html)
}

fn default_defs() -> Vec<Rc<ReplacementDef>> {
    vec![
        // Raw inline HTML, subject to the safe-mode policy.
        filter_def(r"\\?(<[!/]?[a-zA-Z][\w-]*(?:\s[^<>]*?)?>)", html_safe_mode),
        // Anchor.
        template_def(r"\\?<<#([a-zA-Z][\w-]*)>>", r#"<span id="$1"></span>"#),
        // Image with alt text.
        template_def(
            r"\\?<image:([^\s|]+)\|([\s\S]*?)>",
            r#"<img src="$1" alt="$2">"#,
        ),
        // Image.
        template_def(r"\\?<image:([^\s|]+?)>", r#"<img src="$1" alt="$1">"#),
        // Email address.
        template_def(r"\\?<(\S+@[\w.-]+)>", r#"<a href="mailto:$1">$1</a>"#),
        // Link with caption; the caption is span-rendered.
        template_def(r"\\?<(\S+?)\|([\s\S]*?)>", r#"<a href="$1">$$2</a>"#),
        // Link.
        template_def(r#"\\?<((?:http|https)://[^\s"']+?)>"#, r#"<a href="$1">$1</a>"#),
        // Auto-encoded bare URL.
        template_def(
            r#"\\?((?:http|https)://[^\s"']+[\w/#])"#,
            r#"<a href="$1">$1</a>"#,
        ),
        // Keep a backslash before a code quote literal so the quote
        // still opens; consumes nothing past the guard.
        raw_def(r"\S\\(?=`)"),
        // An underscore between alphanumerics is not an emphasis quote.
        raw_def(r"[a-zA-Z0-9]_(?=[a-zA-Z0-9])"),
    ]
}

impl ReplacementRegistry {
    pub(crate) fn new() -> Self {
        ReplacementRegistry {
            defs: default_defs(),
        }
    }

    /// Registered rules in application order.
    pub(crate) fn defs(&self) -> &[Rc<ReplacementDef>] {
        &self.defs
    }

    /// Registers a document-embedded rule. A rule whose pattern source
    /// equals an existing one replaces it in place, keeping its
    /// position; otherwise the rule is appended. Flags: `i` and `m`.
    pub(crate) fn set_definition(
        &mut self,
        pattern: &str,
        flags: &str,
        replacement: &str,
    ) -> Result<(), DefinitionError> {
        let mut source = String::new();
        if flags.contains('i') {
            source.push_str("(?i)");
        }
        if flags.contains('m') {
            source.push_str("(?m)");
        }
        source.push_str(pattern);
        let re = fancy_regex::Regex::new(&source).map_err(|err| DefinitionError::Pattern {
            pattern: pattern.to_string(),
            source: Box::new(err),
        })?;
        let def = Rc::new(ReplacementDef {
            pattern: pattern.to_string(),
            re,
            replacement: replacement.to_string(),
            filter: None,
            raw: false,
        });
        match self.defs.iter_mut().find(|d| d.pattern == pattern) {
            Some(existing) => *existing = def,
            None => self.defs.push(def),
        }
        Ok(())
    }
}
