//! Printable-ASCII screening of decoded text

/// Lowest accepted code point (space)
pub const PRINTABLE_MIN: u32 = 32;

/// Highest accepted code point (tilde)
pub const PRINTABLE_MAX: u32 = 126;

fn is_printable(ch: char) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&u32::from(ch))
}

/// True if every character is printable ASCII. Empty text passes.
pub fn is_valid(text: &str) -> bool {
    text.chars().all(is_printable)
}

/// First character outside the printable range, with its character index
pub fn find_invalid(text: &str) -> Option<(usize, char)> {
    text.chars().enumerate().find(|&(_, ch)| !is_printable(ch))
}
