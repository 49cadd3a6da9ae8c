//! Comparison-safe text folding.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Letters carrying a built-in stroke or slash that canonical decomposition leaves intact.
const FOLDED_LETTERS: &[(char, char)] = &[('đ', 'd'), ('ł', 'l'), ('ø', 'o'), ('ħ', 'h')];

/// Folds `s` for case- and accent-insensitive comparison.
///
/// Lower-cases, decomposes, drops combining marks, then maps stroked letters
/// such as `đ` onto their base Latin letter.
pub fn normalize(s: &str) -> String {
	if s.is_ascii() {
		return s.to_ascii_lowercase();
	}

	let lowered: String = s.chars().flat_map(char::to_lowercase).collect();
	lowered.nfd().filter(|c| !is_combining_mark(*c)).map(fold_letter).collect()
}

fn fold_letter(c: char) -> char {
	FOLDED_LETTERS.iter().find_map(|&(from, to)| (from == c).then_some(to)).unwrap_or(c)
}

/// Returns only the ASCII digits of `s`.
pub fn digits_only(s: &str) -> String {
	s.chars().filter(char::is_ascii_digit).collect()
}

/// Returns true when `s` is non-empty and made of ASCII digits only.
pub fn is_all_digits(s: &str) -> bool {
	!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
