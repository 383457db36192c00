//! Line index for offset ↔ line/column conversion.

use crate::{ByteOffset, Position};
use std::sync::Arc;
use text_size::TextSize;

/// An index over a text for conversions between byte offsets and
/// character-based [`Position`]s.
///
/// The index keeps the text it was built from so character columns and
/// UTF-16 columns can be computed per line. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    /// `line_starts[i]` is the byte offset where line `i + 1` begins.
    line_starts: Arc<[ByteOffset]>,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                // Next line starts after the newline
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            text: Arc::from(text),
            line_starts: line_starts.into(),
        }
    }

    /// Returns the indexed text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the length of the indexed text in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        TextSize::from(self.text.len() as u32)
    }

    /// Returns true if the indexed text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the text of a 1-indexed line, without its line terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let (start, end) = self.line_bounds(line)?;
        let raw = &self.text[start..end];
        Some(raw.strip_suffix('\r').unwrap_or(raw))
    }

    /// Converts a byte offset to a 1-indexed character position.
    ///
    /// Returns `None` if the offset is past the end of the text or falls
    /// inside a multi-byte character.
    pub fn position(&self, offset: ByteOffset) -> Option<Position> {
        let offset_usize = u32::from(offset) as usize;
        if offset_usize > self.text.len() || !self.text.is_char_boundary(offset_usize) {
            return None;
        }

        // Binary search for the line containing this offset
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = u32::from(self.line_starts[line]) as usize;
        let column = self.text[line_start..offset_usize].chars().count() as u32 + 1;

        Some(Position::new(line as u32 + 1, column))
    }

    /// Converts a 1-indexed character position to a byte offset.
    ///
    /// Columns past the end of the line clamp to the line end. Returns `None`
    /// if the line is out of bounds.
    pub fn offset(&self, position: Position) -> Option<ByteOffset> {
        let (start, end) = self.line_bounds(position.line)?;
        let line = &self.text[start..end];
        let skip = position.column.saturating_sub(1) as usize;

        let within = line
            .char_indices()
            .nth(skip)
            .map(|(idx, _)| idx)
            .unwrap_or_else(|| line.strip_suffix('\r').unwrap_or(line).len());

        Some(TextSize::from((start + within) as u32))
    }

    /// Returns the byte offset where a 1-indexed line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        let idx = line.checked_sub(1)? as usize;
        self.line_starts.get(idx).copied()
    }

    /// Converts a UTF-16 code unit column (0-indexed, as used by LSP) on a
    /// 1-indexed line into a 1-indexed character column.
    pub fn utf16_to_column(&self, line: u32, utf16: u32) -> u32 {
        let Some(text) = self.line_text(line) else {
            return utf16 + 1;
        };

        let mut units = 0u32;
        let mut column = 1u32;
        for ch in text.chars() {
            if units >= utf16 {
                break;
            }
            units += ch.len_utf16() as u32;
            column += 1;
        }
        column
    }

    /// Converts a 1-indexed character column into a 0-indexed UTF-16 column.
    pub fn column_to_utf16(&self, line: u32, column: u32) -> u32 {
        let Some(text) = self.line_text(line) else {
            return column.saturating_sub(1);
        };

        text.chars()
            .take(column.saturating_sub(1) as usize)
            .map(|ch| ch.len_utf16() as u32)
            .sum()
    }

    fn line_bounds(&self, line: u32) -> Option<(usize, usize)> {
        let idx = line.checked_sub(1)? as usize;
        let start = u32::from(*self.line_starts.get(idx)?) as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| u32::from(next) as usize - 1) // Before newline
            .unwrap_or(self.text.len()); // End of file
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.position(TextSize::from(0)), Some(Position::new(1, 1)));
        assert_eq!(index.position(TextSize::from(5)), Some(Position::new(1, 6)));
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.position(TextSize::from(6)), Some(Position::new(2, 1)));
        assert_eq!(index.position(TextSize::from(10)), Some(Position::new(2, 5)));
        assert_eq!(index.position(TextSize::from(12)), Some(Position::new(3, 1)));
        assert_eq!(index.position(TextSize::from(99)), None);
    }

    #[test]
    fn test_character_columns() {
        // 'é' is two bytes but a single column
        let index = LineIndex::new("héllo = 1");
        assert_eq!(index.position(TextSize::from(3)), Some(Position::new(1, 3)));
        assert_eq!(index.offset(Position::new(1, 3)), Some(TextSize::from(3)));
        assert_eq!(index.position(TextSize::from(2)), None);
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "hello\nwörld\nfoo";
        let index = LineIndex::new(text);

        for (offset, _) in text.char_indices() {
            let offset = TextSize::from(offset as u32);
            let position = index.position(offset).unwrap();
            assert_eq!(index.offset(position), Some(offset));
        }
    }

    #[test]
    fn test_offset_clamps_to_line_end() {
        let index = LineIndex::new("ab\r\ncd");
        assert_eq!(index.offset(Position::new(1, 40)), Some(TextSize::from(2)));
        assert_eq!(index.line_text(1), Some("ab"));
        assert_eq!(index.offset(Position::new(3, 1)), None);
    }

    #[test]
    fn test_utf16_columns() {
        // '𝄞' is one character but two UTF-16 units
        let index = LineIndex::new("a𝄞b");
        assert_eq!(index.utf16_to_column(1, 3), 3);
        assert_eq!(index.column_to_utf16(1, 3), 3);
        assert_eq!(index.column_to_utf16(1, 2), 1);
    }

    #[test]
    fn test_line_start() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.line_start(1), Some(TextSize::from(0)));
        assert_eq!(index.line_start(2), Some(TextSize::from(6)));
        assert_eq!(index.line_start(3), Some(TextSize::from(12)));
        assert_eq!(index.line_start(0), None);
    }
}
