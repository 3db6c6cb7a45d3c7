//! The inline span renderer.
//!
//! Rendering works over a flat list of text fragments. Each pass splits
//! `Raw` fragments around its matches and inserts `Rendered` fragments
//! that every later pass skips, so replacements, quotes, and
//! special-character escaping compose without inspecting one another's
//! output.
//!
//! Replacements run first and park their rendered HTML in a side queue,
//! leaving a U+0000 placeholder in the text. A `spans=false` quote body
//! rewrites any placeholder it contains to U+0001, telling the final
//! restore pass to emit the escaped *source* of the replacement instead
//! of its HTML. The queue is drained exactly once, in order; anything
//! else is a pipeline bug.

use std::collections::VecDeque;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::engine::Engine;
use crate::expansion::ExpansionOptions;
use crate::macros;
use crate::replacements::ReplacementDef;
use crate::text::replace_special_chars;

/// One piece of the working document.
#[derive(Debug)]
pub(crate) enum Fragment {
    /// Source text still subject to inline passes.
    Raw(String),
    /// Final HTML that later passes must not touch. `verbatim` carries
    /// the pre-replacement source for fragments that a verbatim quote
    /// may un-replace.
    Rendered {
        /// The rendered HTML.
        html: String,
        /// Original matched text, for saved replacements only.
        verbatim: Option<String>,
    },
}

/// A replacement parked behind a placeholder character.
struct SavedReplacement {
    html: String,
    verbatim: String,
}

/// Placeholder for a saved replacement, restored to its HTML.
const RENDERED_PLACEHOLDER: char = '\u{0000}';
/// Placeholder inside a verbatim quote body, restored to escaped source.
const VERBATIM_PLACEHOLDER: char = '\u{0001}';

/// Caps `replace_inline` recursion so pathological replacement or macro
/// definitions cannot expand without bound.
const MAX_EXPANSION_DEPTH: usize = 64;

/// Renders the inline elements of `source` to HTML.
pub(crate) fn render(engine: &mut Engine, source: &str) -> String {
    let mut saved = VecDeque::new();
    let text = pre_replacements(engine, source, &mut saved);
    let mut frags = vec![Fragment::Raw(text)];
    frags = frag_quotes(engine, frags);
    frag_specials(&mut frags);
    let html = defrag(frags);
    post_replacements(&html, &mut saved)
}

/// Concatenates fragment texts back into a single string.
fn defrag(frags: Vec<Fragment>) -> String {
    let mut result = String::new();
    for frag in frags {
        match frag {
            Fragment::Raw(text) => result.push_str(&text),
            Fragment::Rendered { html, .. } => result.push_str(&html),
        }
    }
    result
}

/// Applies every replacement definition to `text`, parking each
/// rendered match in `saved` behind a U+0000 placeholder.
fn pre_replacements(
    engine: &mut Engine,
    text: &str,
    saved: &mut VecDeque<SavedReplacement>,
) -> String {
    let defs: Vec<Rc<ReplacementDef>> = engine.replacements.defs().to_vec();
    let mut frags = vec![Fragment::Raw(text.to_string())];
    for def in &defs {
        let mut next = Vec::with_capacity(frags.len());
        for frag in frags {
            frag_replacement(engine, def, frag, &mut next);
        }
        frags = next;
    }
    let mut result = String::new();
    for frag in frags {
        match frag {
            Fragment::Raw(text) => result.push_str(&text),
            Fragment::Rendered { html, verbatim } => {
                saved.push_back(SavedReplacement {
                    html,
                    verbatim: verbatim.unwrap_or_default(),
                });
                result.push(RENDERED_PLACEHOLDER);
            }
        }
    }
    result
}

/// Splits one fragment around every match of `def`, appending the
/// resulting fragments to `out`.
fn frag_replacement(
    engine: &mut Engine,
    def: &ReplacementDef,
    frag: Fragment,
    out: &mut Vec<Fragment>,
) {
    let mut text = match frag {
        Fragment::Raw(text) => text,
        done => {
            out.push(done);
            return;
        }
    };
    loop {
        let found = match def.re.find(&text) {
            Ok(found) => found,
            Err(err) => {
                log::warn!("replacement scan aborted: {err}");
                None
            }
        };
        let Some(found) = found else {
            out.push(Fragment::Raw(text));
            return;
        };
        if found.start() == found.end() {
            // A zero-width match cannot advance the scan.
            log::warn!("replacement matched empty text: {}", def.pattern);
            out.push(Fragment::Raw(text));
            return;
        }
        let before = text[..found.start()].to_string();
        let matched = text[found.start()..found.end()].to_string();
        let after = text[found.end()..].to_string();
        out.push(Fragment::Raw(before));
        let html = if def.raw {
            matched.clone()
        } else if let Some(unescaped) = matched.strip_prefix('\\') {
            // The rule is quoted out: emit the escaped source.
            replace_special_chars(unescaped)
        } else {
            let caps = match def.re.captures(&matched) {
                Ok(Some(caps)) => caps,
                _ => {
                    out.push(Fragment::Raw(matched));
                    text = after;
                    continue;
                }
            };
            match def.filter {
                Some(filter) => filter(&caps, engine),
                None => replace_match(
                    engine,
                    &caps,
                    &def.replacement,
                    ExpansionOptions::default(),
                ),
            }
        };
        out.push(Fragment::Rendered {
            html,
            verbatim: Some(matched),
        });
        text = after;
    }
}

/// Runs the quote pass over every fragment, then strips quote escapes
/// from the fragments that are still raw.
fn frag_quotes(engine: &Engine, frags: Vec<Fragment>) -> Vec<Fragment> {
    let mut result = Vec::with_capacity(frags.len());
    for frag in frags {
        frag_quote(engine, frag, &mut result);
    }
    for frag in &mut result {
        if let Fragment::Raw(text) = frag {
            *text = engine.quotes.unescape(text);
        }
    }
    result
}

/// Fragments the quotes in a single fragment.
fn frag_quote(engine: &Engine, frag: Fragment, out: &mut Vec<Fragment>) {
    let mut text = match frag {
        Fragment::Raw(text) => text,
        done => {
            out.push(done);
            return;
        }
    };
    loop {
        // Find the first unescaped quote.
        let mut next_index = 0;
        let found = loop {
            let scanned = &text[next_index..];
            let Some(found) = engine.quotes.find(scanned) else {
                out.push(Fragment::Raw(text));
                return;
            };
            if scanned.as_bytes()[found.start] == b'\\' {
                // Restart the search after the escaped opening quote.
                next_index += found.quote_end;
                continue;
            }
            break found;
        };
        let quote = text[next_index + found.quote_start..next_index + found.quote_end].to_string();
        let mut quoted =
            text[next_index + found.body_start..next_index + found.body_end].to_string();
        let start_index = next_index + found.start;
        let mut end_index = next_index + found.end;
        // Additional closing quote characters belong to the quoted text;
        // this lets a quote character appear inside the quote.
        let quote_byte = quote.as_bytes()[0];
        while end_index < text.len() && text.as_bytes()[end_index] == quote_byte {
            quoted.push(quote_byte as char);
            end_index += 1;
        }
        let def = engine
            .quotes
            .definition(&quote)
            .expect("scanner only matches registered quotes");
        // The quote splits the fragment five ways: text before, open
        // tag, quoted text, close tag, text after.
        out.push(Fragment::Raw(text[..start_index].to_string()));
        out.push(Fragment::Rendered {
            html: def.open_tag.clone(),
            verbatim: None,
        });
        if def.spans {
            frag_quote(engine, Fragment::Raw(quoted), out);
        } else {
            // Verbatim body: escape it and retag replacement
            // placeholders so they restore to source form.
            let quoted = replace_special_chars(&quoted).replace(
                RENDERED_PLACEHOLDER,
                &VERBATIM_PLACEHOLDER.to_string(),
            );
            out.push(Fragment::Rendered {
                html: quoted,
                verbatim: None,
            });
        }
        out.push(Fragment::Rendered {
            html: def.close_tag.clone(),
            verbatim: None,
        });
        // Continue with the text following the quote.
        text = text[end_index..].to_string();
    }
}

/// Escapes special characters in the fragments that are still raw.
fn frag_specials(frags: &mut [Fragment]) {
    for frag in frags {
        if let Fragment::Raw(text) = frag {
            *text = replace_special_chars(text);
        }
    }
}

/// Restores saved replacements: U+0000 placeholders take the rendered
/// HTML, U+0001 placeholders (inside verbatim quotes) take the escaped
/// source text. The queue must drain exactly.
fn post_replacements(text: &str, saved: &mut VecDeque<SavedReplacement>) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            RENDERED_PLACEHOLDER | VERBATIM_PLACEHOLDER => {
                let frag = saved
                    .pop_front()
                    .expect("placeholder without saved replacement");
                if c == RENDERED_PLACEHOLDER {
                    result.push_str(&frag.html);
                } else {
                    result.push_str(&replace_special_chars(&frag.verbatim));
                }
            }
            _ => result.push(c),
        }
    }
    assert!(saved.is_empty(), "unrestored saved replacements");
    result
}

static MATCH_GROUP: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"(\${1,2})(\d)").unwrap());

/// Expands `$1`…`$9` and `$$1`…`$$9` group references in a replacement
/// template. A single `$` escapes specials in the substituted group; a
/// double `$$` span-renders it. Once switched on, a pass stays on for
/// the rest of the template. Out-of-range group numbers are reported and
/// substitute the empty string.
pub(crate) fn replace_match(
    engine: &mut Engine,
    caps: &fancy_regex::Captures<'_>,
    template: &str,
    opts: ExpansionOptions,
) -> String {
    let mut opts = opts;
    MATCH_GROUP
        .replace_all(template, |args: &regex::Captures<'_>| -> String {
            if &args[1] == "$$" {
                opts.spans = Some(true);
            } else {
                opts.specials = Some(true);
            }
            let group: usize = args[2].parse().expect("single digit group number");
            if group >= caps.len() {
                engine.error(&format!("undefined replacement group: {}", &args[0]));
                return String::new();
            }
            let value = caps.get(group).map_or("", |m| m.as_str());
            replace_inline(engine, value, opts)
        })
        .into_owned()
}

/// Applies the inline passes selected by `opts` to `text`: macro
/// expansion first, then either the full span renderer or
/// special-character escaping.
pub(crate) fn replace_inline(engine: &mut Engine, text: &str, opts: ExpansionOptions) -> String {
    if engine.expansion_depth >= MAX_EXPANSION_DEPTH {
        engine.error("maximum inline expansion depth exceeded");
        return text.to_string();
    }
    engine.expansion_depth += 1;
    let mut text = text.to_string();
    if opts.macros() {
        text = macros::render(engine, &text, false);
    }
    if opts.spans() {
        text = render(engine, &text);
    } else if opts.specials() {
        text = replace_special_chars(&text);
    }
    engine.expansion_depth -= 1;
    text
}
