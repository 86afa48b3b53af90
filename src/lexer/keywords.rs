//! Static lookup tables: keyword spellings and multi-character operators.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::token::TokenKind;

/// Maps a source spelling to its keyword token kind. Anything not in this
/// table that starts with an alphabetic character or `_` is an identifier.
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("vychod", TokenKind::Exit),
        ("hutor", TokenKind::Print),
        ("naj", TokenKind::InferDef),
        ("cif", TokenKind::IntDef),
        ("bul", TokenKind::BoolDef),
        ("znak", TokenKind::CharDef),
        ("lancok", TokenKind::StrDef),
        ("kec", TokenKind::If),
        ("ikec", TokenKind::Elif),
        ("inac", TokenKind::Else),
        ("kim", TokenKind::While),
        ("zrob", TokenKind::Do),
        ("furt", TokenKind::Const),
        ("sicke", TokenKind::For),
        ("konec", TokenKind::Break),
        ("pravda", TokenKind::True),
        ("klamstvo", TokenKind::False),
        ("aj", TokenKind::And),
        ("abo", TokenKind::Or),
        ("ne", TokenKind::Not),
    ])
});

/// Two-character operators, checked before falling back to the
/// single-character table below. Order doesn't matter, the lexer only ever
/// probes by exact two-character spelling.
pub static TWO_CHAR_SYMBOLS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("++", TokenKind::Increment),
        ("--", TokenKind::Decrement),
        ("==", TokenKind::IsEqual),
        ("!=", TokenKind::IsNotEqual),
        (">=", TokenKind::LargerThanOrEq),
        ("<=", TokenKind::LessThanOrEq),
        ("<<", TokenKind::ShiftLeft),
        (">>", TokenKind::ShiftRight),
        ("[]", TokenKind::ArrayDef),
    ])
});

/// Single-character symbols, probed after the two-character table misses.
pub static ONE_CHAR_SYMBOLS: Lazy<HashMap<char, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ('+', TokenKind::Plus),
        ('-', TokenKind::Minus),
        ('*', TokenKind::Star),
        ('/', TokenKind::Slash),
        ('%', TokenKind::Percent),
        ('=', TokenKind::Equals),
        ('>', TokenKind::LargerThan),
        ('<', TokenKind::LessThan),
        (',', TokenKind::Comma),
        ('\n', TokenKind::Newline),
        ('(', TokenKind::LeftParen),
        (')', TokenKind::RightParen),
        ('{', TokenKind::LeftCurly),
        ('}', TokenKind::RightCurly),
        ('[', TokenKind::LeftBracket),
        (']', TokenKind::RightBracket),
        ('&', TokenKind::BAnd),
        ('|', TokenKind::BOr),
        ('^', TokenKind::Xor),
        ('~', TokenKind::BNot),
    ])
});
