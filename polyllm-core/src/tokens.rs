//! Rough token estimation
//!
//! Whitespace-separated words plus one token per punctuation mark. Good
//! enough for budgeting `max_tokens`; not a substitute for a model tokenizer.

const PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Approximate number of tokens in `text`
pub fn count_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    let punctuation = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
    words + punctuation
}

/// Tokens left for the completion once the prompt is in the context window
pub fn estimate_max_tokens(prompt_tokens: usize, context_window: usize) -> usize {
    context_window.saturating_sub(prompt_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", 0 ; "empty")]
    #[test_case("   \n\t ", 0 ; "whitespace only")]
    #[test_case("hello", 1 ; "single word")]
    #[test_case("Hello, world!", 4 ; "words and punctuation")]
    #[test_case("one two  three", 3 ; "repeated spaces")]
    #[test_case("Wait... what?", 6 ; "ellipsis counts each dot")]
    fn test_count_tokens(text: &str, expected: usize) {
        assert_eq!(count_tokens(text), expected);
    }

    #[test_case(100, 4096, 3996 ; "room left")]
    #[test_case(4096, 4096, 0 ; "exactly full")]
    #[test_case(5000, 4096, 0 ; "overflow")]
    fn test_estimate_max_tokens(prompt: usize, window: usize, expected: usize) {
        assert_eq!(estimate_max_tokens(prompt, window), expected);
    }
}
