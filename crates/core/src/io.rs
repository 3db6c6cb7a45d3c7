//! Line reader and output writer used by the block renderers.

/// Cursor over the lines of a source document.
///
/// The pipeline reserves U+0000 and U+0001 as replacement placeholders
/// (see [`crate::spans`]), so `Reader::new` strips them from the source.
pub(crate) struct Reader {
    lines: Vec<String>,
    pos: usize,
}

impl Reader {
    /// Splits `source` into lines, dropping `\r` line endings and the
    /// reserved placeholder characters.
    pub(crate) fn new(source: &str) -> Self {
        let sanitized: String = source
            .chars()
            .filter(|c| *c != '\u{0000}' && *c != '\u{0001}')
            .collect();
        let lines = sanitized
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Reader { lines, pos: 0 }
    }

    /// The current line. Must not be called at end of input.
    pub(crate) fn cursor(&self) -> &str {
        &self.lines[self.pos]
    }

    /// Advances the cursor one line.
    pub(crate) fn next(&mut self) {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
    }

    /// True once every line has been consumed.
    pub(crate) fn eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Advances the cursor past blank (all-whitespace) lines.
    pub(crate) fn skip_blank_lines(&mut self) {
        while !self.eof() && self.cursor().trim().is_empty() {
            self.next();
        }
    }

    /// Reads lines until `stop` matches, consuming but excluding the
    /// matching line. Returns the collected lines; at end of input the
    /// remainder is returned and `stop` is reported unmatched.
    pub(crate) fn read_until(&mut self, stop: impl Fn(&str) -> bool) -> (Vec<String>, bool) {
        let mut lines = Vec::new();
        while !self.eof() {
            let line = self.cursor().to_string();
            self.next();
            if stop(&line) {
                return (lines, true);
            }
            lines.push(line);
        }
        (lines, false)
    }
}

/// Append-only buffer accumulating the rendered HTML.
#[derive(Default)]
pub(crate) struct Writer {
    buffer: String,
}

impl Writer {
    /// Creates an empty writer.
    pub(crate) fn new() -> Self {
        Writer::default()
    }

    /// Appends `text` to the output.
    pub(crate) fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Consumes the writer, yielding the rendered document.
    pub(crate) fn into_string(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lines_and_skips_blanks() {
        let mut reader = Reader::new("one\n\n  \ntwo");
        assert_eq!(reader.cursor(), "one");
        reader.next();
        reader.skip_blank_lines();
        assert_eq!(reader.cursor(), "two");
        reader.next();
        assert!(reader.eof());
    }

    #[test]
    fn strips_crlf_and_reserved_placeholders() {
        let reader = Reader::new("a\u{0000}b\r\nc\u{0001}");
        assert_eq!(reader.cursor(), "ab");
        let mut reader = reader;
        reader.next();
        assert_eq!(reader.cursor(), "c");
    }

    #[test]
    fn read_until_consumes_the_stop_line() {
        let mut reader = Reader::new("a\nb\n--\nc");
        reader.next(); // skip "a"
        let (lines, found) = reader.read_until(|line| line == "--");
        assert!(found);
        assert_eq!(lines, vec!["b"]);
        assert_eq!(reader.cursor(), "c");
    }

    #[test]
    fn read_until_reports_missing_stop() {
        let mut reader = Reader::new("a\nb");
        let (lines, found) = reader.read_until(|line| line == "--");
        assert!(!found);
        assert_eq!(lines, vec!["a", "b"]);
        assert!(reader.eof());
    }

    #[test]
    fn writer_accumulates_in_order() {
        let mut writer = Writer::new();
        writer.write("<p>");
        writer.write("x");
        writer.write("</p>");
        assert_eq!(writer.into_string(), "<p>x</p>");
    }
}
