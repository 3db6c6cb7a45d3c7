//! Single-line blocks: definitions, API options, block attributes,
//! headers, comments, and block images.

use once_cell::sync::Lazy;

use crate::blockattributes;
use crate::engine::Engine;
use crate::io::{Reader, Writer};
use crate::macros;
use crate::quotes::QuoteDef;
use crate::spans;
use crate::text::replace_special_chars;

/// Renders the line block at the cursor, if any. Definition blocks
/// mutate the registries and emit no output. A leading backslash stops
/// every line block from matching, leaving the line to the paragraph
/// recognizer.
pub(crate) fn render(engine: &mut Engine, reader: &mut Reader, writer: &mut Writer) -> bool {
    let line = reader.cursor().to_string();
    if line.starts_with('\\') {
        return false;
    }
    macro_definition(engine, reader, &line)
        || delimited_block_definition(engine, reader, &line)
        || quote_definition(engine, reader, &line)
        || comment(reader, &line)
        || replacement_definition(engine, reader, &line)
        || api_option(engine, reader, &line)
        || attributes(engine, reader, &line)
        || header(engine, reader, writer, &line)
        || image(engine, reader, writer, &line)
}

/// True when `chunk` ends with a quote that is not `\'`-escaped.
fn ends_unescaped_quote(chunk: &str) -> bool {
    chunk.ends_with('\'') && !chunk.ends_with("\\'")
}

// Macro definition: {name} = 'value', value may span lines.
fn macro_definition(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static OPEN: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^\{([\w-]+\??)\}\s*=\s*'(.*)$").unwrap());
    let Some(caps) = OPEN.captures(line) else {
        return false;
    };
    let name = caps[1].to_string();
    reader.next();
    let mut chunks = Vec::new();
    let mut chunk = caps[2].to_string();
    loop {
        if ends_unescaped_quote(&chunk) {
            chunk.truncate(chunk.len() - 1);
            chunks.push(chunk);
            break;
        }
        chunks.push(chunk);
        if reader.eof() {
            let message = format!("unterminated macro definition: {name}");
            engine.error(&message);
            break;
        }
        chunk = reader.cursor().to_string();
        reader.next();
    }
    if !engine.options.skip_macro_defs() {
        macros::set_definition(engine, &name, &chunks.join("\n"));
    }
    true
}

// Delimited block tag override: |name| = 'open|close'.
fn delimited_block_definition(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static DEF: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^\|([\w-]+)\|\s*=\s*'(.*)'$").unwrap());
    let Some(caps) = DEF.captures(line) else {
        return false;
    };
    reader.next();
    if engine.options.is_safe_mode_nz() {
        return true;
    }
    let name = caps[1].to_string();
    let value = caps[2].replace(r"\'", "'");
    let (open_tag, close_tag) = value.split_once('|').unwrap_or((value.as_str(), ""));
    if !engine.blocks.set_tags(&name, open_tag, close_tag) {
        let message = format!("illegal delimited block name: {name}");
        engine.error(&message);
    }
    true
}

// Quote definition: q = 'open|close' with a 1-2 character quote.
fn quote_definition(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static DEF: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^(\S{1,2})\s*=\s*'([^']*)\|([^']*)'$").unwrap());
    let Some(caps) = DEF.captures(line) else {
        return false;
    };
    if caps[1].chars().any(char::is_alphanumeric) || caps[1].contains('\\') {
        return false;
    }
    reader.next();
    if engine.options.is_safe_mode_nz() {
        return true;
    }
    // An override keeps the existing spans flag so verbatim quotes stay
    // verbatim when retagged; new quotes default to spanned.
    let spans = engine
        .quotes
        .definition(&caps[1])
        .is_none_or(|def| def.spans);
    engine.quotes.set_definition(QuoteDef {
        quote: caps[1].to_string(),
        open_tag: caps[2].to_string(),
        close_tag: caps[3].to_string(),
        spans,
    });
    true
}

// Comment line: // ...
fn comment(reader: &mut Reader, line: &str) -> bool {
    if !line.starts_with("//") {
        return false;
    }
    reader.next();
    true
}

// Replacement definition: /pattern/flags = 'replacement'.
fn replacement_definition(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static DEF: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^/(.+)/([igm]*)\s*=\s*'(.*)'$").unwrap());
    let Some(caps) = DEF.captures(line) else {
        return false;
    };
    reader.next();
    if engine.options.is_safe_mode_nz() {
        return true;
    }
    let pattern = caps[1].to_string();
    let flags = caps[2].to_string();
    let replacement = caps[3].replace(r"\'", "'");
    if let Err(err) = engine
        .replacements
        .set_definition(&pattern, &flags, &replacement)
    {
        let message = err.to_string();
        engine.error(&message);
    }
    true
}

// API option line: .name = 'value'. Honored only outside safe mode.
fn api_option(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static OPTION: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^\.(\w+)\s*=\s*'(.*)'$").unwrap());
    let Some(caps) = OPTION.captures(line) else {
        return false;
    };
    reader.next();
    if engine.options.safe_mode == 0 {
        let name = caps[1].to_string();
        let value = caps[2].to_string();
        engine.set_api_option(&name, &value);
    }
    true
}

// Block attributes line, e.g. `.class #id "css" [attrs] +options`.
fn attributes(engine: &mut Engine, reader: &mut Reader, line: &str) -> bool {
    static GATE: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r#"^\.[a-zA-Z#"\[+-]"#).unwrap());
    if !GATE.is_match(line) {
        return false;
    }
    if !blockattributes::parse(engine, line) {
        return false;
    }
    reader.next();
    true
}

// Header: 1-6 `=` or `#` characters, optionally closed by the same
// delimiter.
fn header(engine: &mut Engine, reader: &mut Reader, writer: &mut Writer, line: &str) -> bool {
    static HEADER: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^([#=]{1,6})\s+(.+)$").unwrap());
    let Some(caps) = HEADER.captures(line) else {
        return false;
    };
    let delimiter = caps[1].to_string();
    let mut content = caps[2].trim().to_string();
    if content.ends_with(&delimiter) {
        let stripped = content[..content.len() - delimiter.len()].trim_end().to_string();
        if !stripped.is_empty() {
            content = stripped;
        }
    }
    reader.next();
    let level = delimiter.len();
    let content = macros::render(engine, &content, false);
    if engine.attrs.id.is_empty()
        && engine
            .macros
            .value("--header-ids")
            .is_some_and(|value| !value.is_empty())
    {
        engine.attrs.id = engine.attrs.slugify(&content);
    }
    let text = spans::render(engine, &content);
    let open_tag = blockattributes::inject(engine, &format!("<h{level}>"));
    writer.write(&open_tag);
    writer.write(&text);
    writer.write(&format!("</h{level}>"));
    if !reader.eof() {
        writer.write("\n");
    }
    true
}

// Block image: <image:src> or <image:src|alt>.
fn image(engine: &mut Engine, reader: &mut Reader, writer: &mut Writer, line: &str) -> bool {
    static IMAGE: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^<image:([^\s|]+?)(?:\|(.*))?>$").unwrap());
    let Some(caps) = IMAGE.captures(line) else {
        return false;
    };
    reader.next();
    let src = caps[1].to_string();
    let alt = caps.get(2).map_or_else(|| src.clone(), |m| m.as_str().to_string());
    let tag = format!(
        r#"<img src="{}" alt="{}">"#,
        replace_special_chars(&src),
        replace_special_chars(&alt)
    );
    let tag = blockattributes::inject(engine, &tag);
    writer.write(&tag);
    if !reader.eof() {
        writer.write("\n");
    }
    true
}
