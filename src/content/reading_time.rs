//! Reading time estimate

/// Average reading speed used for estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-delimited words in `text`
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed to read `words` words, rounded up
pub fn minutes_for_words(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}
