//! Token estimation utilities.
//!
//! Character-based heuristic: ~4 characters per token, rounded up. Counts
//! characters rather than bytes so Thai text is not overestimated threefold.

use tablechat_core::message::ChatTurn;

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Estimate tokens for one turn, including ~4 tokens of role/framing overhead.
pub fn estimate_turn_tokens(turn: &ChatTurn) -> usize {
    4 + turn.parts.iter().map(|p| estimate_tokens(p)).sum::<usize>()
}

pub fn estimate_turns_tokens(turns: &[ChatTurn]) -> usize {
    turns.iter().map(estimate_turn_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablechat_core::message::Role;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 8 Thai characters, 24 bytes
        assert_eq!(estimate_tokens("สวัสดีคะ"), 2);
    }

    #[test]
    fn turns_include_overhead() {
        let turns = vec![
            ChatTurn::text(Role::User, "test"),
            ChatTurn::text(Role::Model, "hello"),
        ];
        assert_eq!(estimate_turns_tokens(&turns), (4 + 1) + (4 + 2));
    }
}
