//! Delimited blocks: multi-line blocks with explicit or implicit close
//! conditions, including the catch-all normal paragraph.

use once_cell::sync::Lazy;

use crate::blockattributes;
use crate::engine::Engine;
use crate::expansion::ExpansionOptions;
use crate::io::{Reader, Writer};
use crate::spans;

/// How a block's content ends.
#[derive(Clone)]
pub(crate) enum CloseRule {
    /// A line equal to the opening delimiter (capture 1 of the open
    /// match).
    SameDelimiter,
    /// A line matching this pattern.
    Line(regex::Regex),
    /// A blank line (or end of input); the opening line is content.
    BlankLine,
}

/// Rewrites the raw content lines before expansion.
pub(crate) type ContentFilter = fn(&[String], &mut Engine) -> String;

/// A delimited block definition.
#[derive(Clone)]
pub(crate) struct DelimitedBlockDef {
    pub(crate) name: String,
    pub(crate) open: regex::Regex,
    pub(crate) close: CloseRule,
    pub(crate) open_tag: String,
    pub(crate) close_tag: String,
    pub(crate) expansion: ExpansionOptions,
    pub(crate) content_filter: Option<ContentFilter>,
}

fn html_filter(lines: &[String], engine: &mut Engine) -> String {
    engine.options.html_safe_mode_filter(&lines.join("\n"))
}

/// Strips the first line's indentation from every line.
fn indent_filter(lines: &[String], _engine: &mut Engine) -> String {
    let indent = lines
        .first()
        .map_or(0, |line| line.len() - line.trim_start_matches([' ', '\t']).len());
    lines
        .iter()
        .map(|line| {
            let cut = indent.min(line.len() - line.trim_start_matches([' ', '\t']).len());
            &line[cut..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_paragraph_filter(lines: &[String], _engine: &mut Engine) -> String {
    static LEAD: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"^> ?").unwrap());
    lines
        .iter()
        .map(|line| LEAD.replace(line, "").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn default_defs() -> Vec<DelimitedBlockDef> {
    let def = |name: &str,
               open: &str,
               close: CloseRule,
               open_tag: &str,
               close_tag: &str,
               expansion: ExpansionOptions,
               content_filter: Option<ContentFilter>| DelimitedBlockDef {
        name: name.to_string(),
        open: regex::Regex::new(open).expect("delimited block open pattern"),
        close,
        open_tag: open_tag.to_string(),
        close_tag: close_tag.to_string(),
        expansion,
        content_filter,
    };
    let opts = |macros: bool, container: bool, skip: bool, specials: bool, spans: bool| {
        ExpansionOptions {
            macros: macros.then_some(true),
            container: container.then_some(true),
            skip: skip.then_some(true),
            specials: specials.then_some(true),
            spans: spans.then_some(true),
        }
    };
    vec![
        def(
            "comment",
            r"^/\*+$",
            CloseRule::Line(regex::Regex::new(r"^\*+/$").expect("comment close pattern")),
            "",
            "",
            opts(false, false, true, false, false),
            None,
        ),
        def(
            "division",
            r"^(\.{2,})$",
            CloseRule::SameDelimiter,
            "<div>",
            "</div>",
            opts(false, true, false, false, false),
            None,
        ),
        def(
            "quote",
            r#"^("{2,})$"#,
            CloseRule::SameDelimiter,
            "<blockquote>",
            "</blockquote>",
            opts(false, true, false, false, false),
            None,
        ),
        def(
            "code",
            r"^(-{2,}|`{3,})$",
            CloseRule::SameDelimiter,
            "<pre><code>",
            "</code></pre>",
            opts(false, false, false, true, false),
            None,
        ),
        def(
            "html",
            r"^(?:<!.*|</?[a-zA-Z][\w-]*(?:[ >].*)?)$",
            CloseRule::BlankLine,
            "",
            "",
            opts(true, false, false, false, false),
            Some(html_filter),
        ),
        def(
            "indented",
            r"^\s+\S.*$",
            CloseRule::BlankLine,
            "<pre><code>",
            "</code></pre>",
            opts(false, false, false, true, false),
            Some(indent_filter),
        ),
        def(
            "quote-paragraph",
            r"^>.*$",
            CloseRule::BlankLine,
            "<blockquote><p>",
            "</p></blockquote>",
            opts(true, false, false, false, true),
            Some(quote_paragraph_filter),
        ),
        // The normal paragraph matches anything, so block dispatch can
        // never fall through.
        def(
            "paragraph",
            r"^.*$",
            CloseRule::BlankLine,
            "<p>",
            "</p>",
            opts(true, false, false, false, true),
            None,
        ),
    ]
}

/// Ordered delimited-block registry.
pub(crate) struct DelimitedBlockRegistry {
    defs: Vec<DelimitedBlockDef>,
}

impl DelimitedBlockRegistry {
    pub(crate) fn new() -> Self {
        DelimitedBlockRegistry {
            defs: default_defs(),
        }
    }

    pub(crate) fn defs(&self) -> &[DelimitedBlockDef] {
        &self.defs
    }

    /// Overrides the tags of an existing block. Returns false when no
    /// block is registered under `name`.
    pub(crate) fn set_tags(&mut self, name: &str, open_tag: &str, close_tag: &str) -> bool {
        match self.defs.iter_mut().find(|def| def.name == name) {
            Some(def) => {
                def.open_tag = open_tag.to_string();
                def.close_tag = close_tag.to_string();
                true
            }
            None => false,
        }
    }
}

/// True when `line` opens one of the named blocks. Used by the list
/// renderer to spot attachable blocks.
pub(crate) fn opens_any(engine: &Engine, line: &str, names: &[&str]) -> bool {
    engine
        .blocks
        .defs()
        .iter()
        .filter(|def| names.contains(&def.name.as_str()))
        .any(|def| def.open.is_match(line))
}

/// Renders the delimited block at the cursor. `allowed` restricts the
/// candidate definitions when non-empty. Returns false when no
/// definition matches.
pub(crate) fn render(
    engine: &mut Engine,
    reader: &mut Reader,
    writer: &mut Writer,
    allowed: &[&str],
) -> bool {
    for index in 0..engine.blocks.defs.len() {
        let (def, delimiter) = {
            let def = &engine.blocks.defs[index];
            if !allowed.is_empty() && !allowed.contains(&def.name.as_str()) {
                continue;
            }
            let Some(caps) = def.open.captures(reader.cursor()) else {
                continue;
            };
            (
                def.clone(),
                caps.get(1).map(|m| m.as_str().to_string()),
            )
        };
        let mut lines = Vec::new();
        match &def.close {
            CloseRule::BlankLine => {
                while !reader.eof() && !reader.cursor().trim().is_empty() {
                    lines.push(reader.cursor().to_string());
                    reader.next();
                }
            }
            CloseRule::SameDelimiter => {
                let delimiter = delimiter.unwrap_or_default();
                reader.next();
                let (content, closed) = reader.read_until(|line| line == delimiter);
                lines = content;
                if !closed {
                    let message = format!("unterminated delimited block: {delimiter}");
                    engine.error(&message);
                }
            }
            CloseRule::Line(close) => {
                reader.next();
                let (content, closed) = reader.read_until(|line| close.is_match(line));
                lines = content;
                if !closed {
                    let message = format!("unterminated delimited block: {}", def.name);
                    engine.error(&message);
                }
            }
        }
        let mut opts = def.expansion;
        opts.merge(&engine.attrs.options);
        engine.attrs.options = ExpansionOptions::default();
        if opts.skip() {
            return true;
        }
        let mut text = match def.content_filter {
            Some(filter) => filter(&lines, engine),
            None => lines.join("\n"),
        };
        if opts.container() {
            text = engine.render_source(&text);
        } else {
            text = spans::replace_inline(engine, &text, opts);
        }
        let open_tag = blockattributes::inject(engine, &def.open_tag);
        if open_tag.is_empty() && text.is_empty() && def.close_tag.is_empty() {
            // Nothing survived (e.g. safe mode dropped a raw HTML
            // block): write no output and no block separator.
            return true;
        }
        writer.write(&open_tag);
        if opts.container() && !text.is_empty() {
            writer.write("\n");
            writer.write(&text);
            writer.write("\n");
        } else {
            writer.write(&text);
        }
        writer.write(&def.close_tag);
        // Attached renders (restricted candidates) carry no block
        // separator; their output sits inside another block.
        if allowed.is_empty() && !reader.eof() {
            writer.write("\n");
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_overrides_tags_of_existing_blocks() {
        let mut registry = DelimitedBlockRegistry::new();
        assert!(registry.set_tags("code", "<pre>", "</pre>"));
        let code = registry.defs().iter().find(|d| d.name == "code").unwrap();
        assert_eq!(code.open_tag, "<pre>");
        assert!(!registry.set_tags("bogus", "<x>", "</x>"));
    }

    #[test]
    fn indent_filter_strips_the_first_line_indent() {
        let mut engine = Engine::new();
        let lines = vec!["  one".to_string(), "    two".to_string(), " three".to_string()];
        assert_eq!(indent_filter(&lines, &mut engine), "one\n  two\nthree");
    }

    #[test]
    fn quote_paragraph_filter_strips_markers() {
        let mut engine = Engine::new();
        let lines = vec!["> one".to_string(), ">two".to_string(), "cont".to_string()];
        assert_eq!(quote_paragraph_filter(&lines, &mut engine), "one\ntwo\ncont");
    }

    #[test]
    fn paragraph_matches_anything() {
        let registry = DelimitedBlockRegistry::new();
        let paragraph = registry.defs().last().unwrap();
        assert_eq!(paragraph.name, "paragraph");
        assert!(paragraph.open.is_match("any text at all"));
    }
}
