//! Whole-word text matching.
//!
//! Store queries only narrow candidates with a cheap substring test; the
//! functions here decide whether a candidate really matches. A haystack is
//! split on runs of whitespace and commas (so "Melville, Herman" yields two
//! tokens) and a needle matches when its tokens appear as a contiguous run
//! of whole haystack tokens, compared case-insensitively.

/// Normalize a name or keyword: trim surrounding whitespace and lower-case.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Split text into lower-cased tokens.
///
/// Separators are whitespace and commas; everything else, punctuation
/// included, stays part of its token ("Dune." is the token "dune.").
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Pick the text used for the cheap substring pre-filter of a keyword.
///
/// Every whole-word match of `keyword` contains its longest token as a plain
/// substring, so candidates fetched with it never miss a real match even when
/// the keyword spans a comma ("melville herman" vs "melville, herman").
pub fn candidate_needle(keyword: &str) -> Option<String> {
    tokenize(keyword)
        .into_iter()
        .reduce(|longest, token| if token.len() > longest.len() { token } else { longest })
}

/// Check whether `needle` occurs in `haystack` as whole words.
///
/// "Alice" matches "Alice and Bob" but not "Malice". An empty needle never
/// matches.
pub fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let needle = tokenize(needle);
    if needle.is_empty() {
        return false;
    }

    let haystack = tokenize(haystack);
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}
