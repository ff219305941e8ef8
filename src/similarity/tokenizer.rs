/// Tokens this short or shorter carry too little signal to compare titles on.
const MIN_TOKEN_LEN: usize = 3;

/// Normalize raw text into lowercase tokens.
///
/// Everything except ASCII lowercase letters, digits, whitespace and hyphens is
/// stripped after lowercasing, so "Let's go!" becomes `["lets"]`. Tokens of two
/// characters or fewer are discarded.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
