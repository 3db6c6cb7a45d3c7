//! Document-embedded definitions and their safe-mode gating.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rimu_core::{Engine, RenderOptions, render};

#[test]
fn quote_definitions_register_new_quotes() {
    assert_eq!(
        render("# = '<mark>|</mark>'\n\n#highlight#"),
        "<p><mark>highlight</mark></p>"
    );
}

#[test]
fn quote_overrides_keep_the_verbatim_flag() {
    assert_eq!(
        render("` = '<tt>|</tt>'\n\n`1 < 2`"),
        "<p><tt>1 &lt; 2</tt></p>"
    );
}

#[test]
fn replacement_definitions_register_and_apply() {
    assert_eq!(
        render("/\\bRIMU\\b/ = 'Rimu'\n\nRIMU rocks"),
        "<p>Rimu rocks</p>"
    );
}

#[test]
fn replacement_definitions_support_the_ignore_case_flag() {
    assert_eq!(
        render("/\\bx11\\b/i = '<b>X11</b>'\n\nuse X11 here"),
        "<p>use <b>X11</b> here</p>"
    );
}

#[test]
fn bad_replacement_patterns_are_reported() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        callback: Some(Box::new(move |message| {
            sink.borrow_mut().push(message.to_string());
        })),
        ..Default::default()
    });
    assert_eq!(engine.render("/(unclosed/ = 'x'"), "");
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("illegal replacement pattern"));
}

#[test]
fn delimited_block_definitions_override_tags() {
    assert_eq!(
        render("|paragraph| = '<p class=\"lead\">|</p>'\n\ntext"),
        "<p class=\"lead\">text</p>"
    );
}

#[test]
fn unknown_delimited_block_names_are_reported() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        callback: Some(Box::new(move |message| {
            sink.borrow_mut().push(message.to_string());
        })),
        ..Default::default()
    });
    engine.render("|bogus| = '<x>|</x>'");
    assert!(errors.borrow()[0].contains("bogus"));
}

#[test]
fn api_option_lines_apply_outside_safe_mode() {
    assert_eq!(render(".safeMode = '3'\n\n<b>x"), "&lt;b&gt;x");
}

#[test]
fn api_option_lines_are_ignored_in_safe_mode() {
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: Some(1),
        ..Default::default()
    });
    // The option line is consumed but has no effect; the raw HTML
    // block is still dropped by safe mode 1.
    assert_eq!(engine.render(".safeMode = '0'\n\n<b>x"), "");
}

#[test]
fn macro_definitions_are_skipped_in_safe_mode() {
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: Some(1),
        ..Default::default()
    });
    assert_eq!(engine.render("{x} = 'v'\n\n{x}"), "<p>{x}</p>");
    // The trusted-macros bit re-enables definitions.
    engine.update_options(RenderOptions {
        safe_mode: Some(1 + 8),
        ..Default::default()
    });
    assert_eq!(engine.render("{x} = 'v'\n\n{x}"), "<p>v</p>");
}

#[test]
fn quote_definitions_are_skipped_in_safe_mode() {
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: Some(1),
        ..Default::default()
    });
    assert_eq!(engine.render("` = '<tt>|</tt>'\n\n`a`"), "<p><code>a</code></p>");
}

#[test]
fn multi_line_macro_values_are_joined() {
    let mut engine = Engine::new();
    let html = engine.render("{address} = 'First line\nSecond line'\n\n{address}");
    assert_eq!(html, "<p>First line\nSecond line</p>");
}

#[test]
fn macro_definitions_expand_at_definition_time() {
    let mut engine = Engine::new();
    let html = engine.render("{base} = 'core'\n\n{derived} = '{base}-extra'\n\n{derived}");
    assert_eq!(html, "<p>core-extra</p>");
}
