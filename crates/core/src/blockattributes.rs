//! Pending block attributes: classes, id, CSS, raw attributes, and
//! expansion-option overrides that decorate the next rendered block.

use once_cell::sync::Lazy;

use crate::engine::Engine;
use crate::expansion::ExpansionOptions;
use crate::spans;

/// Attribute state accumulated by `.class #id "css" [attrs] +opts`
/// lines. The transient fields apply to the next block only; `ids`
/// lives for the whole document so duplicate ids can be detected and
/// slugs disambiguated.
#[derive(Default)]
pub(crate) struct BlockAttributes {
    pub(crate) classes: String,
    pub(crate) id: String,
    pub(crate) css: String,
    pub(crate) attributes: String,
    pub(crate) options: ExpansionOptions,
    pub(crate) ids: Vec<String>,
}

impl BlockAttributes {
    pub(crate) fn new() -> Self {
        BlockAttributes::default()
    }

    /// Derives a URL-safe id from `text`, disambiguated against the
    /// allocated ids with a `-2`, `-3`… suffix. Does not allocate the
    /// result.
    pub(crate) fn slugify(&self, text: &str) -> String {
        static NON_SLUG: Lazy<regex::Regex> =
            Lazy::new(|| regex::Regex::new(r"[^a-zA-Z0-9]+").unwrap());
        let slug = NON_SLUG.replace_all(text, "-");
        let slug = slug.trim_matches('-').to_lowercase();
        let mut slug = if slug.is_empty() { "x".to_string() } else { slug };
        if self.ids.iter().any(|id| *id == slug) {
            let mut suffix = 2;
            while self.ids.iter().any(|id| *id == format!("{slug}-{suffix}")) {
                suffix += 1;
            }
            slug = format!("{slug}-{suffix}");
        }
        slug
    }
}

// class names = $1, id = $2, css properties = $3, attributes = $4,
// expansion flags = $5.
static ATTRS: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(
        r#"^\\?\.((?:\s*[a-zA-Z][\w-]*)+)*(?:\s*)?(#[a-zA-Z][\w-]*\s*)?(?:\s*)?(?:"(.+?)")?(?:\s*)?(\[.+])?(?:\s*)?([+-][ \w+-]+)?$"#,
    )
    .unwrap()
});

static CLASS_ATTR: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r#"(?i)class="(.*?)""#).unwrap());
static ID_ATTR: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r#"(?i)id=".*?""#).unwrap());
static STYLE_ATTR: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r#"(?i)style="(.*?)""#).unwrap());
static START_TAG: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"(?i)^(<[a-z]+|<h[1-6])[ >]").unwrap());

/// Interprets `text` as a block-attributes line, accumulating into the
/// pending state on success. Macros are expanded first so attributes can
/// be macro-generated. Returns false when `text` is not an attributes
/// line.
pub(crate) fn parse(engine: &mut Engine, text: &str) -> bool {
    let text = spans::replace_inline(
        engine,
        text,
        ExpansionOptions {
            macros: Some(true),
            ..Default::default()
        },
    );
    let Some(caps) = ATTRS.captures(&text) else {
        return false;
    };
    let group = |index: usize| {
        caps.get(index)
            .map_or("", |m| m.as_str())
            .trim_matches([' ', '\n'])
    };
    if !engine.options.skip_block_attributes() {
        let classes = group(1);
        if !classes.is_empty() {
            if !engine.attrs.classes.is_empty() {
                engine.attrs.classes.push(' ');
            }
            engine.attrs.classes.push_str(classes);
        }
        let id = group(2);
        if !id.is_empty() {
            engine.attrs.id = id[1..].to_string();
        }
        let css = group(3);
        if !css.is_empty() {
            if !engine.attrs.css.is_empty() && !engine.attrs.css.ends_with(';') {
                engine.attrs.css.push(';');
            }
            if !engine.attrs.css.is_empty() {
                engine.attrs.css.push(' ');
            }
            engine.attrs.css.push_str(css);
        }
        let attributes = group(4);
        if !attributes.is_empty() && !engine.options.is_safe_mode_nz() {
            if !engine.attrs.attributes.is_empty() {
                engine.attrs.attributes.push(' ');
            }
            engine
                .attrs
                .attributes
                .push_str(attributes[1..attributes.len() - 1].trim_matches([' ', '\n']));
        }
        engine.attrs.options = ExpansionOptions::parse(group(5));
    }
    true
}

/// Merges the pending attributes into the first start tag of `tag` and
/// clears them. An empty `tag` is returned unchanged and leaves the
/// pending state intact for the next block.
pub(crate) fn inject(engine: &mut Engine, tag: &str) -> String {
    if tag.is_empty() {
        return String::new();
    }
    let mut tag = tag.to_string();
    let mut attrs = String::new();
    let classes = engine.attrs.classes.clone();
    if !classes.is_empty() {
        if CLASS_ATTR.is_match(&tag) {
            // Fold the pending class names into the existing attribute.
            tag = CLASS_ATTR
                .replace(&tag, |caps: &regex::Captures<'_>| {
                    format!(r#"class="{} {}""#, classes, &caps[1])
                })
                .into_owned();
        } else {
            attrs = format!(r#"class="{classes}""#);
        }
    }
    let id = engine.attrs.id.to_lowercase();
    if !id.is_empty() {
        let has_id = ID_ATTR.is_match(&tag);
        let allocated = engine.attrs.ids.iter().any(|existing| *existing == id);
        if has_id || allocated {
            let message = format!("duplicate \"id\" attribute: {id}");
            engine.error(&message);
        } else {
            engine.attrs.ids.push(id.clone());
            attrs.push_str(&format!(r#" id="{id}""#));
        }
    }
    let css = engine.attrs.css.clone();
    if !css.is_empty() {
        if STYLE_ATTR.is_match(&tag) {
            // Fold the pending styles into the existing attribute.
            tag = STYLE_ATTR
                .replace(&tag, |caps: &regex::Captures<'_>| {
                    let mut existing = caps[1].trim_matches([' ', '\n']).to_string();
                    if !existing.ends_with(';') {
                        existing.push(';');
                    }
                    format!(r#"style="{existing} {css}""#)
                })
                .into_owned();
        } else {
            attrs.push_str(&format!(r#" style="{css}""#));
        }
    }
    if !engine.attrs.attributes.is_empty() {
        attrs.push(' ');
        attrs.push_str(&engine.attrs.attributes);
    }
    let attrs = attrs.trim_start_matches([' ', '\n']);
    if !attrs.is_empty() {
        let name_end = START_TAG
            .captures(&tag)
            .map(|caps| caps.get(1).expect("start tag name").end());
        if let Some(name_end) = name_end {
            tag = format!("{} {}{}", &tag[..name_end], attrs, &tag[name_end..]);
        }
    }
    // Consume the attributes.
    engine.attrs.classes.clear();
    engine.attrs.id.clear();
    engine.attrs.css.clear();
    engine.attrs.attributes.clear();
    tag
}
