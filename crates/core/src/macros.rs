//! Macro definitions and invocation expansion.

use once_cell::sync::Lazy;

use crate::engine::Engine;

/// A named text macro.
#[derive(Clone, Debug)]
pub(crate) struct MacroDef {
    /// Macro name: word characters and dashes.
    pub(crate) name: String,
    /// Replacement value.
    pub(crate) value: String,
}

/// Ordered macro registry. Redefining a name replaces its value in
/// place; new names append.
pub(crate) struct MacroRegistry {
    defs: Vec<MacroDef>,
}

impl MacroRegistry {
    /// Factory defaults: the reserved blank macros used by built-in
    /// conditionals (`--`) and header id generation (`--header-ids`).
    pub(crate) fn new() -> Self {
        MacroRegistry {
            defs: vec![
                MacroDef {
                    name: "--".to_string(),
                    value: String::new(),
                },
                MacroDef {
                    name: "--header-ids".to_string(),
                    value: String::new(),
                },
            ],
        }
    }

    /// The value of `name`, if defined.
    pub(crate) fn value(&self, name: &str) -> Option<&str> {
        self.defs
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.value.as_str())
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub(crate) fn set_value(&mut self, name: &str, value: &str) {
        match self.defs.iter_mut().find(|def| def.name == name) {
            Some(def) => def.value = value.to_string(),
            None => self.defs.push(MacroDef {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Matches `{name}` plus parametrized and conditional forms. The
/// parameter tail must end on a non-backslash so `\}` stays inside the
/// invocation.
static MACRO_INVOCATION: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\\?\{([\w-]+)([!=|?](?:[\s\S]*?[^\\])?)?\}").unwrap());

static MACRO_PARAM: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"\$\d+").unwrap());

/// Marks a line for deletion by a failed conditional invocation;
/// distinct from the U+0000/U+0001 span placeholders and filtered out
/// before `render` returns.
const LINE_DELETION: char = '\u{0002}';

/// Registers a macro from its document definition. A name ending in `?`
/// only defines the macro when it is currently undefined. Invocations
/// inside the value are expanded now, at definition time.
pub(crate) fn set_definition(engine: &mut Engine, name: &str, value: &str) {
    let (name, existing_only) = match name.strip_suffix('?') {
        Some(name) => (name, true),
        None => (name, false),
    };
    if existing_only && engine.macros.is_defined(name) {
        return;
    }
    let value = value.replace(r"\'", "'");
    let value = render(engine, &value, false);
    engine.macros.set_value(name, &value);
}

/// Expands macro invocations in `text`.
///
/// `silent` suppresses undefined-macro diagnostics; undefined simple
/// invocations are left in the text verbatim either way. Lines holding a
/// failed `{name=pattern}` / `{name!pattern}` conditional are deleted.
pub(crate) fn render(engine: &mut Engine, text: &str, silent: bool) -> String {
    let mut deleted_lines = false;
    let expanded = MACRO_INVOCATION
        .replace_all(text, |caps: &regex::Captures<'_>| -> String {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if let Some(escaped) = whole.strip_prefix('\\') {
                return escaped.to_string();
            }
            let name = &caps[1];
            let value = engine.macros.value(name).map(str::to_string);
            let params = caps.get(2).map_or("", |m| m.as_str());
            if params.is_empty() {
                return match value {
                    Some(value) => value,
                    None => {
                        if !silent {
                            engine.error(&format!("undefined macro: {whole}"));
                        }
                        whole.to_string()
                    }
                };
            }
            let operator = &params[..1];
            let tail = params[1..].replace(r"\}", "}");
            match operator {
                "?" => value.unwrap_or(tail),
                "|" => match value {
                    Some(value) => substitute_params(&value, &tail),
                    None => {
                        if !silent {
                            engine.error(&format!("undefined macro: {whole}"));
                        }
                        whole.to_string()
                    }
                },
                "!" | "=" => {
                    let Some(value) = value else {
                        if !silent {
                            engine.error(&format!("undefined macro: {whole}"));
                        }
                        return String::new();
                    };
                    let anchored = format!("^(?:{tail})$");
                    match regex::Regex::new(&anchored) {
                        Ok(re) => {
                            let mut delete = !re.is_match(&value);
                            if operator == "!" {
                                delete = !delete;
                            }
                            if delete {
                                deleted_lines = true;
                                LINE_DELETION.to_string()
                            } else {
                                String::new()
                            }
                        }
                        Err(_) => {
                            engine.error(&format!("illegal macro regular expression: {tail}"));
                            String::new()
                        }
                    }
                }
                _ => unreachable!("invocation operator"),
            }
        })
        .into_owned();
    if deleted_lines {
        expanded
            .split('\n')
            .filter(|line| !line.contains(LINE_DELETION))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        expanded
    }
}

/// Replaces `$1`, `$2`… in `value` with the `|`-separated parameters;
/// missing parameters substitute the empty string.
fn substitute_params(value: &str, params: &str) -> String {
    let params: Vec<&str> = params.split('|').collect();
    MACRO_PARAM
        .replace_all(value, |caps: &regex::Captures<'_>| -> String {
            let index: usize = caps[0][1..].parse().unwrap_or(0);
            if index >= 1 {
                params.get(index - 1).copied().unwrap_or("").to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_with_errors() -> (Engine, Rc<RefCell<Vec<String>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let mut engine = Engine::new();
        engine.update_options(crate::RenderOptions {
            callback: Some(Box::new(move |message| {
                sink.borrow_mut().push(message.to_string());
            })),
            ..Default::default()
        });
        (engine, errors)
    }

    #[test]
    fn expands_a_simple_invocation() {
        let mut engine = Engine::new();
        engine.macros.set_value("name", "Rimu");
        assert_eq!(render(&mut engine, "Hello {name}!", false), "Hello Rimu!");
    }

    #[test]
    fn escaped_invocations_lose_the_backslash_only() {
        let mut engine = Engine::new();
        engine.macros.set_value("name", "Rimu");
        assert_eq!(render(&mut engine, r"\{name}", false), "{name}");
    }

    #[test]
    fn undefined_macro_reports_and_stays_verbatim() {
        let (mut engine, errors) = engine_with_errors();
        assert_eq!(render(&mut engine, "{missing}", false), "{missing}");
        assert_eq!(errors.borrow().as_slice(), ["undefined macro: {missing}"]);
        assert_eq!(render(&mut engine, "{missing}", true), "{missing}");
        assert_eq!(errors.borrow().len(), 1);
    }

    #[test]
    fn substitutes_parameters() {
        let mut engine = Engine::new();
        engine.macros.set_value("link", r#"<a href="$1">$2</a>"#);
        assert_eq!(
            render(&mut engine, "{link|http://x|X}", false),
            r#"<a href="http://x">X</a>"#
        );
        // Missing parameters become empty.
        assert_eq!(render(&mut engine, "{link|http://x}", false), r#"<a href="http://x"></a>"#);
    }

    #[test]
    fn default_parameter_form() {
        let mut engine = Engine::new();
        assert_eq!(render(&mut engine, "{undefined?fallback}", false), "fallback");
        engine.macros.set_value("defined", "value");
        assert_eq!(render(&mut engine, "{defined?fallback}", false), "value");
    }

    #[test]
    fn failed_inclusion_deletes_the_line() {
        let mut engine = Engine::new();
        engine.macros.set_value("lang", "en");
        let text = "first\nonly for fr {lang=fr}\nlast";
        assert_eq!(render(&mut engine, text, false), "first\nlast");
        let text = "first\nonly for en {lang=en}\nlast";
        assert_eq!(render(&mut engine, text, false), "first\nonly for en \nlast");
    }

    #[test]
    fn exclusion_inverts_the_test() {
        let mut engine = Engine::new();
        engine.macros.set_value("lang", "en");
        assert_eq!(render(&mut engine, "hide {lang!en}\nkeep", false), "keep");
        assert_eq!(render(&mut engine, "keep {lang!fr}", false), "keep ");
    }

    #[test]
    fn bad_conditional_pattern_is_reported() {
        let (mut engine, errors) = engine_with_errors();
        engine.macros.set_value("x", "1");
        assert_eq!(render(&mut engine, "{x=(}", false), "");
        assert!(errors.borrow()[0].contains("illegal macro regular expression"));
    }

    #[test]
    fn definition_time_expansion_and_conditional_definition() {
        let mut engine = Engine::new();
        engine.macros.set_value("base", "core");
        set_definition(&mut engine, "derived", "{base}-extra");
        assert_eq!(engine.macros.value("derived"), Some("core-extra"));
        // `?` names only define when undefined.
        set_definition(&mut engine, "derived?", "ignored");
        assert_eq!(engine.macros.value("derived"), Some("core-extra"));
        set_definition(&mut engine, "fresh?", "used");
        assert_eq!(engine.macros.value("fresh"), Some("used"));
    }
}
