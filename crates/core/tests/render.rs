//! End-to-end rendering scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rimu_core::{Engine, RenderOptions, render};
use rstest::rstest;

fn engine_with_errors() -> (Engine, Rc<RefCell<Vec<String>>>) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        callback: Some(Box::new(move |message| {
            sink.borrow_mut().push(message.to_string());
        })),
        ..Default::default()
    });
    (engine, errors)
}

#[rstest]
#[case("Hello *world*.", "<p>Hello <strong>world</strong>.</p>")]
#[case(r"Hello \*world*.", "<p>Hello *world*.</p>")]
#[case("Code: `x < y`.", "<p>Code: <code>x &lt; y</code>.</p>")]
#[case(".foo #bar\n_italic_", r#"<p class="foo" id="bar"><em>italic</em></p>"#)]
#[case("# Title", "<h1>Title</h1>")]
#[case("== Subtitle ==", "<h2>Subtitle</h2>")]
#[case("> quoted", "<blockquote><p>quoted</p></blockquote>")]
#[case("  indented", "<pre><code>indented</code></pre>")]
#[case("--\na < b\n--", "<pre><code>a &lt; b</code></pre>")]
#[case("..\npara\n..", "<div>\n<p>para</p>\n</div>")]
#[case("\"\"\nwisdom\n\"\"", "<blockquote>\n<p>wisdom</p>\n</blockquote>")]
#[case("- one\n- two", "<ul><li>one</li><li>two</li></ul>")]
#[case("1. x\n2. y", "<ol><li>x</li><li>y</li></ol>")]
#[case("Term:: definition", "<dl><dt>Term</dt><dd>definition</dd></dl>")]
#[case(
    "Contact <joe@example.com>",
    r#"<p>Contact <a href="mailto:joe@example.com">joe@example.com</a></p>"#
)]
#[case(
    "See http://example.com now",
    r#"<p>See <a href="http://example.com">http://example.com</a> now</p>"#
)]
#[case("<image:img/x.png|Logo>", r#"<img src="img/x.png" alt="Logo">"#)]
#[case("Jump <<#target>> here", r#"<p>Jump <span id="target"></span> here</p>"#)]
#[case("<div>raw</div>", "<div>raw</div>")]
#[case("// dropped comment", "")]
#[case("/*\ndropped\n*/", "")]
fn render_scenarios(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(source), expected);
}

#[test]
fn blocks_are_separated_by_single_newlines() {
    assert_eq!(
        render("# Title\n\nfirst\n\nsecond"),
        "<h1>Title</h1>\n<p>first</p>\n<p>second</p>"
    );
}

#[test]
fn duplicate_id_across_renders_is_reported_and_both_render() {
    let (mut engine, errors) = engine_with_errors();
    let first = engine.render(".sec #top\n= H");
    let second = engine.render(".sec #top\n= H");
    assert_eq!(first, r#"<h1 class="sec" id="top">H</h1>"#);
    assert_eq!(second, r#"<h1 class="sec">H</h1>"#);
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("top"));
}

#[test]
fn header_ids_macro_allocates_unique_slugs() {
    let mut engine = Engine::new();
    let html = engine.render("{--header-ids} = 'true'\n\n# My Title\n\n# My Title");
    assert_eq!(
        html,
        "<h1 id=\"my-title\">My Title</h1>\n<h1 id=\"my-title-2\">My Title</h1>"
    );
}

#[test]
fn safe_mode_filters_raw_html_blocks() {
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: Some(2),
        ..Default::default()
    });
    assert_eq!(engine.render("<div>x</div>"), "<mark>replaced HTML</mark>");
    engine.update_options(RenderOptions {
        safe_mode: Some(1),
        ..Default::default()
    });
    assert_eq!(engine.render("<div>x</div>"), "");
    engine.update_options(RenderOptions {
        safe_mode: Some(3),
        ..Default::default()
    });
    assert_eq!(engine.render("<div>x</div>"), "&lt;div&gt;x&lt;/div&gt;");
}

#[test]
fn safe_mode_escapes_inline_html() {
    let mut engine = Engine::new();
    engine.update_options(RenderOptions {
        safe_mode: Some(3),
        ..Default::default()
    });
    assert_eq!(
        engine.render("a <b>bold</b>"),
        "<p>a &lt;b&gt;bold&lt;/b&gt;</p>"
    );
}

#[test]
fn skip_option_discards_the_next_block() {
    assert_eq!(render(".+skip\nhidden\n\nshown"), "<p>shown</p>");
}

#[test]
fn spans_can_be_disabled_per_block() {
    assert_eq!(render(".-spans\n*verbatim*"), "<p>*verbatim*</p>");
}

#[test]
fn conditional_inclusion_drops_lines() {
    let mut engine = Engine::new();
    let html = engine.render("{lang} = 'en'\n\nShown {lang=en}\nHidden {lang=fr}");
    assert_eq!(html, "<p>Shown </p>");
}

#[test]
fn lists_nest_by_delimiter() {
    assert_eq!(
        render("- a\n** b\n- c"),
        "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
    );
}

#[test]
fn lists_attach_immediately_following_blocks() {
    assert_eq!(
        render("- item\n--\ncode\n--"),
        "<ul><li>item<pre><code>code</code></pre></li></ul>"
    );
}

#[test]
fn list_items_take_continuation_lines() {
    assert_eq!(
        render("- first\n  continued\n\npara"),
        "<ul><li>first\ncontinued</li></ul>\n<p>para</p>"
    );
}

#[test]
fn reserved_placeholder_chars_are_stripped_from_source() {
    assert_eq!(render("a\u{0000}b\u{0001}c"), "<p>abc</p>");
}

#[test]
fn renders_a_small_document() {
    let source = "{version} = '0.1'\n\n# Rimu {version}\n\nWrite *readable* text.\n\n--\na < b\n--";
    insta::assert_snapshot!(render(source), @r#"
    <h1>Rimu 0.1</h1>
    <p>Write <strong>readable</strong> text.</p>
    <pre><code>a &lt; b</code></pre>
    "#);
}
