//! List blocks: bulleted, ordered, and definition lists with nesting
//! and attached blocks.

use once_cell::sync::Lazy;

use crate::blockattributes;
use crate::delimitedblocks;
use crate::engine::Engine;
use crate::expansion::ExpansionOptions;
use crate::io::{Reader, Writer};
use crate::spans;

struct ListDef {
    item: regex::Regex,
    list_open: &'static str,
    list_close: &'static str,
    item_open: &'static str,
    item_close: &'static str,
    /// Definition lists capture a term ahead of the delimiter.
    term: bool,
}

static DEFS: Lazy<Vec<ListDef>> = Lazy::new(|| {
    vec![
        ListDef {
            item: regex::Regex::new(r"^\s*(-|\*{1,4})\s+(.*)$").unwrap(),
            list_open: "<ul>",
            list_close: "</ul>",
            item_open: "<li>",
            item_close: "</li>",
            term: false,
        },
        ListDef {
            item: regex::Regex::new(r"^\s*(?:\d+)?(\.{1,4})\s+(.*)$").unwrap(),
            list_open: "<ol>",
            list_close: "</ol>",
            item_open: "<li>",
            item_close: "</li>",
            term: false,
        },
        ListDef {
            item: regex::Regex::new(r"^\s*(.*[^:\\])(:{2,4})(|\s+.*)$").unwrap(),
            list_open: "<dl>",
            list_close: "</dl>",
            item_open: "<dd>",
            item_close: "</dd>",
            term: true,
        },
    ]
});

/// Blocks that may be attached to a list item.
const ATTACHED: &[&str] = &["comment", "division", "quote", "code"];

/// One matched list item. `id` is the delimiter text; items nest when
/// their delimiter differs from every open list's delimiter.
struct ItemState {
    def: usize,
    id: String,
    term: Option<String>,
    text: String,
}

fn match_item(reader: &Reader) -> Option<ItemState> {
    if reader.eof() {
        return None;
    }
    let line = reader.cursor();
    if line.starts_with('\\') {
        return None;
    }
    for (index, def) in DEFS.iter().enumerate() {
        if let Some(caps) = def.item.captures(line) {
            return Some(if def.term {
                ItemState {
                    def: index,
                    id: caps[2].to_string(),
                    term: Some(caps[1].trim().to_string()),
                    text: caps[3].trim().to_string(),
                }
            } else {
                ItemState {
                    def: index,
                    id: caps[1].to_string(),
                    term: None,
                    text: caps[2].to_string(),
                }
            });
        }
    }
    None
}

fn macros_and_spans() -> ExpansionOptions {
    ExpansionOptions {
        macros: Some(true),
        spans: Some(true),
        ..Default::default()
    }
}

/// Lines that terminate item text without being items themselves.
fn is_text_break(engine: &Engine, line: &str) -> bool {
    static LINE_BREAKS: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r#"^(?:[#=]{1,6}\s|//|\.[a-zA-Z#"\[+-])"#).unwrap());
    LINE_BREAKS.is_match(line) || delimitedblocks::opens_any(engine, line, ATTACHED)
}

/// Renders the list starting at the cursor. Returns false when the
/// cursor is not at a list item.
pub(crate) fn render(engine: &mut Engine, reader: &mut Reader, writer: &mut Writer) -> bool {
    let Some(item) = match_item(reader) else {
        return false;
    };
    let mut open_ids = Vec::new();
    let leftover = render_list(engine, reader, writer, item, &mut open_ids);
    debug_assert!(leftover.is_none(), "list item left after unwinding");
    if !reader.eof() {
        writer.write("\n");
    }
    true
}

/// Renders one list: items sharing the delimiter of `first`. Returns
/// the item that terminated it, which belongs to an enclosing list.
fn render_list(
    engine: &mut Engine,
    reader: &mut Reader,
    writer: &mut Writer,
    first: ItemState,
    open_ids: &mut Vec<String>,
) -> Option<ItemState> {
    open_ids.push(first.id.clone());
    let def = &DEFS[first.def];
    let open_tag = blockattributes::inject(engine, def.list_open);
    writer.write(&open_tag);
    let mut item = first;
    loop {
        let next = render_list_item(engine, reader, writer, item, open_ids);
        match next {
            Some(next_item) if open_ids.last() == Some(&next_item.id) => item = next_item,
            other => {
                writer.write(def.list_close);
                open_ids.pop();
                return other;
            }
        }
    }
}

/// Renders one item: term, text with lazy continuation, attached
/// blocks, and any nested lists. Returns the next item, if any.
fn render_list_item(
    engine: &mut Engine,
    reader: &mut Reader,
    writer: &mut Writer,
    item: ItemState,
    open_ids: &mut Vec<String>,
) -> Option<ItemState> {
    let def = &DEFS[item.def];
    if let Some(term) = &item.term {
        let rendered = spans::replace_inline(engine, term, macros_and_spans());
        writer.write("<dt>");
        writer.write(&rendered);
        writer.write("</dt>");
    }
    writer.write(def.item_open);
    reader.next();
    // Lazy continuation: following lines join the item text until a
    // blank line, another item, or a block break.
    let mut text_lines = vec![item.text.clone()];
    loop {
        if reader.eof() {
            break;
        }
        let line = reader.cursor().to_string();
        if line.trim().is_empty() || match_item(reader).is_some() || is_text_break(engine, &line) {
            break;
        }
        text_lines.push(line.trim().to_string());
        reader.next();
    }
    let text = text_lines.join("\n");
    let rendered = spans::replace_inline(engine, text.trim(), macros_and_spans());
    writer.write(&rendered);
    // Attached blocks, then the item that follows this one.
    let mut next = None;
    loop {
        if reader.eof() {
            break;
        }
        if reader.cursor().trim().is_empty() {
            reader.skip_blank_lines();
            if reader.eof() {
                break;
            }
            if let Some(found) = match_item(reader) {
                next = Some(found);
                break;
            }
            // After a blank line only an indented block attaches.
            if delimitedblocks::opens_any(engine, reader.cursor(), &["indented"])
                && delimitedblocks::render(engine, reader, writer, &["indented"])
            {
                continue;
            }
            break;
        }
        if let Some(found) = match_item(reader) {
            next = Some(found);
            break;
        }
        if delimitedblocks::opens_any(engine, reader.cursor(), ATTACHED)
            && delimitedblocks::render(engine, reader, writer, ATTACHED)
        {
            continue;
        }
        break;
    }
    // A new delimiter nests a list inside this item.
    while let Some(found) = next.take() {
        if open_ids.contains(&found.id) {
            next = Some(found);
            break;
        }
        next = render_list(engine, reader, writer, found, open_ids);
    }
    writer.write(def.item_close);
    next
}
