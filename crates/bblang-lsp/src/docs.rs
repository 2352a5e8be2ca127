//! Documentation comments.
//!
//! A definition is documented by the comment directly in front of it. Block
//! comments may use a leading `*` on each line, which is stripped.

use bblang_core::{SinglePosition, Token, TokenType};

/// The comment directly preceding `position`, if the nearest token before
/// it is a comment.
pub fn comment_documentation(tokens: &[Token], position: SinglePosition) -> Option<String> {
    let token = tokens
        .iter()
        .rev()
        .filter(|token| !matches!(token.token_type, TokenType::Whitespace | TokenType::LineBreak))
        .find(|token| token.range.start < position)?;

    let text = match token.token_type {
        TokenType::CommentMultiline => {
            let mut text = String::new();
            for line in token.content.split('\n') {
                let line = line.trim();
                let line = line.strip_prefix('*').unwrap_or(line).trim_start();
                text.push_str(line);
                text.push('\n');
            }
            text.trim().to_string()
        }
        TokenType::Comment => token.content.trim().to_string(),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}
