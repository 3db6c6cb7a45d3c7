//! Rendering options: safe mode, raw-HTML policy, and the error callback.

use crate::text::replace_special_chars;

/// Sink for recoverable document diagnostics (duplicate ids, undefined
/// macros, malformed definitions). Rendering always continues after a
/// callback invocation.
pub type Callback = Box<dyn FnMut(&str)>;

/// Caller-supplied option updates. Unset fields leave the current value
/// unchanged; `reset` restores factory defaults before the other fields
/// are applied.
#[derive(Default)]
pub struct RenderOptions {
    /// Reset the engine to factory defaults first.
    pub reset: bool,
    /// New safe mode bit set.
    pub safe_mode: Option<u8>,
    /// New replacement text for raw HTML under safe mode 2.
    pub html_replacement: Option<String>,
    /// New diagnostics callback.
    pub callback: Option<Callback>,
}

/// Safe mode bits 0-1 select the raw-HTML policy; bit 2 (mask 4) skips
/// block-attributes parsing; bit 3 (mask 8) permits macro definitions
/// despite a nonzero safe mode.
pub(crate) const SAFE_MODE_SKIP_BLOCK_ATTRIBUTES: u8 = 0x4;
pub(crate) const SAFE_MODE_MACRO_DEFS: u8 = 0x8;

/// Default replacement for raw HTML when `safe_mode & 3 == 2`.
pub const DEFAULT_HTML_REPLACEMENT: &str = "<mark>replaced HTML</mark>";

/// Mutable option state owned by an engine.
pub(crate) struct Options {
    pub(crate) safe_mode: u8,
    pub(crate) html_replacement: String,
    pub(crate) callback: Option<Callback>,
}

impl Options {
    pub(crate) fn new() -> Self {
        Options {
            safe_mode: 0,
            html_replacement: DEFAULT_HTML_REPLACEMENT.to_string(),
            callback: None,
        }
    }

    /// True when any safe mode restriction is active.
    pub(crate) fn is_safe_mode_nz(&self) -> bool {
        self.safe_mode > 0
    }

    /// True when macro definitions must be dropped: a nonzero safe mode
    /// without the trusted-macros bit.
    pub(crate) fn skip_macro_defs(&self) -> bool {
        self.safe_mode != 0 && self.safe_mode & SAFE_MODE_MACRO_DEFS == 0
    }

    /// True when block-attribute lines must not accumulate.
    pub(crate) fn skip_block_attributes(&self) -> bool {
        self.safe_mode & SAFE_MODE_SKIP_BLOCK_ATTRIBUTES != 0
    }

    /// Applies the bits 0-1 policy to a raw HTML string: render, drop,
    /// replace, or escape.
    pub(crate) fn html_safe_mode_filter(&self, html: &str) -> String {
        match self.safe_mode & 0x3 {
            0 => html.to_string(),
            1 => String::new(),
            2 => self.html_replacement.clone(),
            3 => replace_special_chars(html),
            _ => unreachable!(),
        }
    }
}
