use ropey::Rope;

/// Byte offset of a zero-based line and UTF-16 column.
///
/// Columns past the end of the line clamp to the line's end, excluding its
/// line break. `None` when the line does not exist.
pub fn rope_line_col_to_offset(rope: &Rope, line: u32, character: u32) -> Option<usize> {
    let line_idx = line as usize;
    if line_idx >= rope.len_lines() {
        return None;
    }

    let wanted = character as usize;
    let mut units = 0;
    let within_line: usize = rope
        .line(line_idx)
        .chars()
        .take_while(|&ch| ch != '\n' && ch != '\r')
        .take_while(|ch| {
            let fits = units < wanted;
            units += ch.len_utf16();
            fits
        })
        .map(char::len_utf8)
        .sum();

    Some(rope.line_to_byte(line_idx) + within_line)
}

/// [`rope_line_col_to_offset`] for a plain string.
pub fn line_col_to_offset(source: &str, line: u32, character: u32) -> Option<usize> {
    rope_line_col_to_offset(&Rope::from_str(source), line, character)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let src = "hello\nworld";
        assert_eq!(line_col_to_offset(src, 0, 5), Some(5));
        assert_eq!(line_col_to_offset(src, 1, 3), Some(9));
        assert_eq!(line_col_to_offset(src, 5, 0), None);
    }

    #[test]
    fn test_column_clamps_before_line_break() {
        assert_eq!(line_col_to_offset("ab\r\ncd", 0, 10), Some(2));
        assert_eq!(line_col_to_offset("ab\ncd", 1, 10), Some(5));
    }

    #[test]
    fn test_utf16_columns() {
        // 'é' is one UTF-16 unit and two bytes, '😀' is two units and four bytes.
        let src = "é😀x";
        assert_eq!(line_col_to_offset(src, 0, 1), Some(2));
        assert_eq!(line_col_to_offset(src, 0, 3), Some(6));
    }
}
