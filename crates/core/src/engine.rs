//! The engine context: registries, options, and the block dispatch
//! loop.

use crate::blockattributes::BlockAttributes;
use crate::delimitedblocks;
use crate::delimitedblocks::DelimitedBlockRegistry;
use crate::io::{Reader, Writer};
use crate::lineblocks;
use crate::lists;
use crate::macros::MacroRegistry;
use crate::options::{Options, RenderOptions};
use crate::quotes::QuoteRegistry;
use crate::replacements::ReplacementRegistry;

/// A Rimu compiler instance.
///
/// The engine owns every piece of mutable rendering state: the quote,
/// replacement, macro, and delimited-block registries, the rendering
/// options, and the pending block attributes. Definitions embedded in a
/// document mutate the engine and stay visible to later [`render`]
/// calls on the same engine; [`reset`] restores factory defaults.
///
/// Rendering is strictly single-threaded and synchronous; an engine is
/// neither `Send` nor `Sync`. Render distinct documents concurrently by
/// giving each thread its own engine.
///
/// Allocated element ids are engine state too: rendering two documents
/// that use the same id without a [`reset`] in between reports a
/// duplicate id, by design.
///
/// [`render`]: Engine::render
/// [`reset`]: Engine::reset
///
/// # Examples
///
/// ```
/// let mut engine = rimu_core::Engine::new();
/// assert_eq!(engine.render("{greeting} = 'Hello'"), "");
/// assert_eq!(
///     engine.render("{greeting} *world*"),
///     "<p>Hello <strong>world</strong></p>"
/// );
/// ```
pub struct Engine {
    pub(crate) options: Options,
    pub(crate) quotes: QuoteRegistry,
    pub(crate) replacements: ReplacementRegistry,
    pub(crate) macros: MacroRegistry,
    pub(crate) blocks: DelimitedBlockRegistry,
    pub(crate) attrs: BlockAttributes,
    pub(crate) expansion_depth: usize,
}

impl Engine {
    /// Creates an engine with the built-in definitions and default
    /// options.
    pub fn new() -> Self {
        Engine {
            options: Options::new(),
            quotes: QuoteRegistry::new(),
            replacements: ReplacementRegistry::new(),
            macros: MacroRegistry::new(),
            blocks: DelimitedBlockRegistry::new(),
            attrs: BlockAttributes::new(),
            expansion_depth: 0,
        }
    }

    /// Restores factory defaults: built-in registries, default options,
    /// no callback, and no allocated ids.
    pub fn reset(&mut self) {
        *self = Engine::new();
    }

    /// Renders a Rimu source document to HTML.
    ///
    /// Rendering never fails; recoverable document problems are
    /// reported through the options callback. The placeholder
    /// characters U+0000 and U+0001 are reserved by the renderer and
    /// are stripped from `source`.
    pub fn render(&mut self, source: &str) -> String {
        log::debug!("rendering {} byte document", source.len());
        self.render_source(source)
    }

    /// Renders `source` as a block document. Also used for the content
    /// of container blocks.
    pub(crate) fn render_source(&mut self, source: &str) -> String {
        let mut reader = Reader::new(source);
        let mut writer = Writer::new();
        self.render_blocks(&mut reader, &mut writer);
        writer.into_string()
    }

    fn render_blocks(&mut self, reader: &mut Reader, writer: &mut Writer) {
        while !reader.eof() {
            reader.skip_blank_lines();
            if reader.eof() {
                break;
            }
            if lineblocks::render(self, reader, writer) {
                continue;
            }
            if lists::render(self, reader, writer) {
                continue;
            }
            if delimitedblocks::render(self, reader, writer, &[]) {
                continue;
            }
            // The normal paragraph matches anything.
            unreachable!("no matching delimited block found");
        }
    }

    /// Sets a named option from its string form. Names: `reset`,
    /// `safeMode`, `htmlReplacement`.
    ///
    /// # Panics
    ///
    /// Panics on an unknown option name or a malformed value. Options
    /// embedded in documents go through a lenient path that reports
    /// through the callback instead.
    pub fn set_option(&mut self, name: &str, value: &str) {
        match name {
            "reset" => {
                let reset: bool = value
                    .trim()
                    .parse()
                    .unwrap_or_else(|_| panic!("illegal reset value: {value}"));
                if reset {
                    self.reset();
                }
            }
            "safeMode" => {
                self.options.safe_mode = value
                    .trim()
                    .parse()
                    .unwrap_or_else(|_| panic!("illegal safeMode value: {value}"));
            }
            "htmlReplacement" => self.options.html_replacement = value.to_string(),
            _ => panic!("illegal API option name: {name}"),
        }
    }

    /// Document-embedded variant of [`set_option`](Engine::set_option):
    /// problems are reported through the callback and rendering
    /// continues.
    pub(crate) fn set_api_option(&mut self, name: &str, value: &str) {
        match name {
            "reset" => match value.trim().parse::<bool>() {
                Ok(true) => self.reset(),
                Ok(false) => {}
                Err(_) => {
                    let message = format!("illegal reset value: {value}");
                    self.error(&message);
                }
            },
            "safeMode" => match value.trim().parse::<u8>() {
                Ok(mode) => self.options.safe_mode = mode,
                Err(_) => {
                    let message = format!("illegal safeMode value: {value}");
                    self.error(&message);
                }
            },
            "htmlReplacement" => self.options.html_replacement = value.to_string(),
            _ => {
                let message = format!("illegal API option name: {name}");
                self.error(&message);
            }
        }
    }

    /// Applies every option the caller set, leaving the rest unchanged.
    pub fn update_options(&mut self, options: RenderOptions) {
        if options.reset {
            self.reset();
        }
        if let Some(safe_mode) = options.safe_mode {
            self.options.safe_mode = safe_mode;
        }
        if let Some(html_replacement) = options.html_replacement {
            self.options.html_replacement = html_replacement;
        }
        if let Some(callback) = options.callback {
            self.options.callback = Some(callback);
        }
    }

    /// Reports a recoverable document problem.
    pub(crate) fn error(&mut self, message: &str) {
        log::warn!("{message}");
        if let Some(callback) = self.options.callback.as_mut() {
            callback(message);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
