//! Unicode normalization and folding for path text.
//!
//! Two different comparisons happen on file names:
//!
//! - Exact title lookup compares NFC-normalized text, so a title typed in
//!   composed form finds a file whose name the filesystem stored decomposed
//!   (macOS stores NFD).
//! - Fuzzy search compares *folded* text: NFKD-decomposed, combining marks
//!   removed, lowercased. `"Beyoncé"` and `"BEYONCE"` fold to the same string.
//!
//! # Example
//!
//! ```
//! use trackcache::scanner::path_utils::{fold_for_match, normalize_path_str};
//!
//! assert_eq!(normalize_path_str("cafe\u{0301}"), "café");
//! assert_eq!(fold_for_match("Café Del Mar"), "cafe del mar");
//! ```

use std::borrow::Cow;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Normalize a string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Check if a character is a Unicode combining mark (diacritical mark).
#[must_use]
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold text for fuzzy comparison.
///
/// Applies NFKD decomposition, drops combining marks, and lowercases.
/// Characters without an ASCII equivalent (CJK, Cyrillic) pass through
/// lowercased but otherwise intact.
#[must_use]
pub fn fold_for_match(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Path text relative to `base`, with separators unified to `/`.
///
/// Falls back to the full path when `path` is not under `base`. Non-UTF-8
/// components are converted lossily.
#[must_use]
pub fn relative_str<'a>(path: &'a Path, base: Option<&Path>) -> Cow<'a, str> {
    let relative = base
        .and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path);
    let text = relative.to_string_lossy();
    if cfg!(windows) {
        Cow::Owned(text.replace('\\', "/"))
    } else {
        text
    }
}
