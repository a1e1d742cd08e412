//! Line/column to byte offset conversion.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed**, matching what C frontends report
//! - Columns count **bytes**, not characters (clang's convention)
//! - Byte offsets are **0-indexed**
//!
//! [`LineIndex`] is computed once per file so that every extent lookup
//! during CST construction is a table lookup rather than a rescan.

use memchr::memchr_iter;

/// Dense table of line start offsets for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build the index for `source`.
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = Vec::with_capacity(bytes.len() / 32 + 1);
        line_starts.push(0);
        line_starts.extend(memchr_iter(b'\n', bytes).map(|nl| nl + 1));
        LineIndex {
            line_starts,
            len: bytes.len(),
        }
    }

    /// Number of lines (a trailing newline opens one more, empty line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Total length of the indexed text in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the indexed text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Convert a 1-indexed line and byte column to a byte offset.
    ///
    /// Returns `None` when the line does not exist or the column runs past
    /// the end of the file. A column one past the last byte of a line is
    /// valid (it addresses the newline, or end of file).
    pub fn offset(&self, line: u32, col: u32) -> Option<usize> {
        let line = line.max(1) as usize;
        let col = col.max(1) as usize;
        let start = *self.line_starts.get(line - 1)?;
        let offset = start + (col - 1);
        if offset > self.len {
            return None;
        }
        Some(offset)
    }

    /// Convert a byte offset to a 1-indexed `(line, col)` pair.
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let col = offset - self.line_starts[line];
        ((line + 1) as u32, (col + 1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_of_first_byte() {
        let index = LineIndex::new("int a;\nint b;\n");
        assert_eq!(index.offset(1, 1), Some(0));
        assert_eq!(index.offset(2, 1), Some(7));
        assert_eq!(index.offset(2, 5), Some(11));
    }

    #[test]
    fn offset_at_end_of_file_is_valid() {
        let index = LineIndex::new("x\n");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.offset(2, 1), Some(2));
        assert_eq!(index.offset(2, 2), None);
        assert_eq!(index.offset(3, 1), None);
    }

    #[test]
    fn position_round_trips_offset() {
        let text = "int main() {\n  return 0;\n}\n";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            let (line, col) = index.position(offset);
            assert_eq!(index.offset(line, col), Some(offset), "offset {}", offset);
        }
    }

    #[test]
    fn columns_count_bytes() {
        let index = LineIndex::new("/* é */ int a;");
        // 'é' is two bytes, so `int` starts at byte 9.
        assert_eq!(index.offset(1, 10), Some(9));
    }
}
