//! Small shared helpers.

use unicode_width::UnicodeWidthChar;

/// Display width of a single character in terminal columns (1 for most
/// characters, 2 for wide CJK/emoji, 0 for combining marks).
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}
