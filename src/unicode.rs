//! Named code points used by the tokenizer's classification rules.

#[allow(clippy::module_name_repetitions)]
pub struct UnicodeChar;

impl UnicodeChar {
    pub const NULL: char = '\u{0000}';
    pub const BACKSPACE: char = '\u{0008}';
    pub const TAB: char = '\u{0009}';
    pub const LINE_FEED: char = '\u{000A}';
    pub const FORM_FEED: char = '\u{000C}';
    pub const CARRIAGE_RETURN: char = '\u{000D}';
    pub const SHIFT_OUT: char = '\u{000E}';
    pub const INFORMATION_SEPARATOR_ONE: char = '\u{001F}';
    pub const VERTICAL_TAB: char = '\u{000B}';
    pub const SPACE: char = '\u{0020}';
    pub const DELETE: char = '\u{007F}';
    pub const C1_LAST: char = '\u{009F}';
    pub const MAX_ALLOWED: char = '\u{10FFFF}';
    pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';
}

/// Non-printable code points (CSS Syntax's `non-printable code point`):
/// C0 controls other than whitespace, `U+000B`, `U+007F`, and the C1
/// control block `U+0080..=U+009F`. Never part of an unquoted `url(...)`
/// body.
pub fn is_non_printable(c: char) -> bool {
    matches!(c, UnicodeChar::NULL..=UnicodeChar::BACKSPACE)
        || c == UnicodeChar::VERTICAL_TAB
        || matches!(c, UnicodeChar::SHIFT_OUT..=UnicodeChar::INFORMATION_SEPARATOR_ONE)
        || matches!(c, UnicodeChar::DELETE..=UnicodeChar::C1_LAST)
}

/// Whitespace as defined by the CSS Syntax grammar: space, tab, and the
/// three line terminators.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        UnicodeChar::SPACE | UnicodeChar::TAB | UnicodeChar::LINE_FEED | UnicodeChar::CARRIAGE_RETURN | UnicodeChar::FORM_FEED
    )
}
