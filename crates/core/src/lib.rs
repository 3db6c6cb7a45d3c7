#![deny(missing_docs)]
//! Rimu core: a readable-text to HTML markup renderer.
//!
//! Source documents are consumed line by line by a fixed sequence of
//! block recognizers (line blocks, lists, delimited blocks); block
//! content is handed to a recursive inline renderer that interleaves
//! replacements, quotes, macro expansion, and special-character
//! escaping. Documents can embed definitions that extend the quote,
//! replacement, macro, and delimited-block registries for the rest of
//! the [`Engine`]'s lifetime.
//!
//! The code points U+0000 and U+0001 are reserved as internal
//! placeholders and are stripped from source text before rendering.
//!
//! ```
//! let html = rimu_core::render("Hello *Rimu*!");
//! assert_eq!(html, "<p>Hello <strong>Rimu</strong>!</p>");
//! ```

mod blockattributes;
mod delimitedblocks;
mod engine;
mod expansion;
mod io;
mod lineblocks;
mod lists;
mod macros;
mod options;
mod quotes;
mod replacements;
mod spans;
mod text;

pub use engine::Engine;
pub use options::{Callback, DEFAULT_HTML_REPLACEMENT, RenderOptions};

/// Renders a Rimu source document to HTML with a fresh default
/// [`Engine`]. Use an explicit engine to carry options and
/// document-embedded definitions across renders.
pub fn render(source: &str) -> String {
    Engine::new().render(source)
}
