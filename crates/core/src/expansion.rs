//! Expansion options select which inline passes apply to a piece of text.

/// Tri-state record of the inline passes to run over a block's content.
///
/// `None` means "unset": merging leaves the target untouched and
/// evaluation treats the pass as disabled. Block definitions carry their
/// defaults as `Some(..)`; pending block-attribute flags override them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ExpansionOptions {
    /// Expand macro invocations.
    pub(crate) macros: Option<bool>,
    /// Render the content as a nested block document.
    pub(crate) container: Option<bool>,
    /// Discard the block entirely.
    pub(crate) skip: Option<bool>,
    /// HTML-escape special characters.
    pub(crate) specials: Option<bool>,
    /// Run the full inline span renderer (implies specials).
    pub(crate) spans: Option<bool>,
}

impl ExpansionOptions {
    /// Overwrites every field that is set in `other`.
    pub(crate) fn merge(&mut self, other: &ExpansionOptions) {
        for (target, source) in [
            (&mut self.macros, other.macros),
            (&mut self.container, other.container),
            (&mut self.skip, other.skip),
            (&mut self.specials, other.specials),
            (&mut self.spans, other.spans),
        ] {
            if source.is_some() {
                *target = source;
            }
        }
    }

    /// Parses a block-attributes flag list such as `+macros -spans`.
    /// Unknown flag names are ignored.
    pub(crate) fn parse(text: &str) -> Self {
        let mut opts = ExpansionOptions::default();
        for flag in text.split_whitespace() {
            let Some(name) = flag.strip_prefix('+').or_else(|| flag.strip_prefix('-')) else {
                continue;
            };
            let value = Some(flag.starts_with('+'));
            match name {
                "macros" => opts.macros = value,
                "container" => opts.container = value,
                "skip" => opts.skip = value,
                "specials" => opts.specials = value,
                "spans" => opts.spans = value,
                _ => {}
            }
        }
        opts
    }

    /// Macro expansion enabled?
    pub(crate) fn macros(&self) -> bool {
        self.macros.unwrap_or(false)
    }

    /// Container rendering enabled?
    pub(crate) fn container(&self) -> bool {
        self.container.unwrap_or(false)
    }

    /// Block discarded?
    pub(crate) fn skip(&self) -> bool {
        self.skip.unwrap_or(false)
    }

    /// Special-character escaping enabled?
    pub(crate) fn specials(&self) -> bool {
        self.specials.unwrap_or(false)
    }

    /// Full span rendering enabled?
    pub(crate) fn spans(&self) -> bool {
        self.spans.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plus_and_minus_flags() {
        let opts = ExpansionOptions::parse("+macros -spans");
        assert_eq!(opts.macros, Some(true));
        assert_eq!(opts.spans, Some(false));
        assert_eq!(opts.container, None);
    }

    #[test]
    fn ignores_unknown_flags() {
        assert_eq!(ExpansionOptions::parse("+bogus"), ExpansionOptions::default());
    }

    #[test]
    fn merge_overwrites_set_fields_only() {
        let mut opts = ExpansionOptions {
            macros: Some(true),
            spans: Some(true),
            ..Default::default()
        };
        opts.merge(&ExpansionOptions::parse("-spans +skip"));
        assert_eq!(opts.macros, Some(true));
        assert_eq!(opts.spans, Some(false));
        assert_eq!(opts.skip, Some(true));
    }

    #[test]
    fn unset_fields_evaluate_disabled() {
        let opts = ExpansionOptions::default();
        assert!(!opts.macros() && !opts.spans() && !opts.specials());
    }
}
