//! Semantic tokens handler for enhanced syntax highlighting.
//!
//! Token kinds come from the compiler's analysis of each token:
//! - Types, structs and template parameters
//! - Functions, variables, constants, parameters and fields
//! - Keywords, builtin types and operators
//! - Numbers the compiler left unanalysed
//! - Code skipped by the preprocessor, shown as comments

use bblang_core::{AnalyzedType, Token, TokenType};
use lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens,
    SemanticTokensFullOptions, SemanticTokensLegend, SemanticTokensOptions, SemanticTokensParams,
    SemanticTokensResult, SemanticTokensServerCapabilities,
};

use super::utils::utf16_len;
use crate::snapshot::Snapshot;

/// Token types we support.
pub const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::TYPE,           // 0: attributes, types, aliases
    SemanticTokenType::STRUCT,         // 1
    SemanticTokenType::FUNCTION,       // 2
    SemanticTokenType::VARIABLE,       // 3: variables and constants
    SemanticTokenType::PARAMETER,      // 4
    SemanticTokenType::TYPE_PARAMETER, // 5
    SemanticTokenType::KEYWORD,        // 6: keywords and builtin types
    SemanticTokenType::PROPERTY,       // 7: fields
    SemanticTokenType::OPERATOR,       // 8
    SemanticTokenType::NUMBER,         // 9
    SemanticTokenType::COMMENT,        // 10: preprocessor-skipped code
];

/// Token modifiers we support.
pub const TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::READONLY, // 0: constants
];

/// Get the semantic tokens legend for capability registration.
pub fn get_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.to_vec(),
        token_modifiers: TOKEN_MODIFIERS.to_vec(),
    }
}

/// Get the semantic tokens server capabilities.
pub fn get_capabilities() -> SemanticTokensServerCapabilities {
    SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
        legend: get_legend(),
        full: Some(SemanticTokensFullOptions::Bool(true)),
        range: None,
        work_done_progress_options: Default::default(),
    })
}

/// Token type indices.
mod token_type {
    pub const TYPE: u32 = 0;
    pub const STRUCT: u32 = 1;
    pub const FUNCTION: u32 = 2;
    pub const VARIABLE: u32 = 3;
    pub const PARAMETER: u32 = 4;
    pub const TYPE_PARAMETER: u32 = 5;
    pub const KEYWORD: u32 = 6;
    pub const PROPERTY: u32 = 7;
    pub const OPERATOR: u32 = 8;
    pub const NUMBER: u32 = 9;
    pub const COMMENT: u32 = 10;
}

/// Token modifier bits.
mod token_modifier {
    pub const READONLY: u32 = 1 << 0;
}

/// Handle a semantic tokens request.
pub fn handle_semantic_tokens(
    _params: &SemanticTokensParams,
    snapshot: &Snapshot,
) -> Option<SemanticTokensResult> {
    let mut raw_tokens: Vec<RawToken> = Vec::new();
    for token in snapshot.tokens() {
        if let Some((token_type, modifiers)) = classify(token) {
            push_token(token, token_type, modifiers, &mut raw_tokens);
        }
    }

    raw_tokens.sort_by_key(|t| (t.line, t.start));

    Some(SemanticTokensResult::Tokens(SemanticTokens {
        result_id: None,
        data: encode(&raw_tokens),
    }))
}

/// A token with absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawToken {
    line: u32,
    start: u32,
    length: u32,
    token_type: u32,
    modifiers: u32,
}

/// Token type and modifier bits for `token`, or `None` when it is left to
/// the client's grammar.
fn classify(token: &Token) -> Option<(u32, u32)> {
    let token_type = match token.analyzed_type {
        AnalyzedType::Attribute | AnalyzedType::Type | AnalyzedType::TypeAlias => token_type::TYPE,
        AnalyzedType::Struct => token_type::STRUCT,
        AnalyzedType::FunctionName => token_type::FUNCTION,
        AnalyzedType::VariableName => token_type::VARIABLE,
        AnalyzedType::ConstantName => {
            return Some((token_type::VARIABLE, token_modifier::READONLY));
        }
        AnalyzedType::ParameterName => token_type::PARAMETER,
        AnalyzedType::TypeParameter => token_type::TYPE_PARAMETER,
        AnalyzedType::Keyword | AnalyzedType::BuiltinType => token_type::KEYWORD,
        AnalyzedType::FieldName => token_type::PROPERTY,
        AnalyzedType::MathOperator | AnalyzedType::OtherOperator | AnalyzedType::TypeModifier => {
            token_type::OPERATOR
        }
        AnalyzedType::CompileTag
        | AnalyzedType::CompileTagParameter
        | AnalyzedType::Statement
        | AnalyzedType::InstructionLabel => return None,
        AnalyzedType::None => match token.token_type {
            _ if token.is_numeric_literal() => token_type::NUMBER,
            TokenType::PreprocessSkipped => token_type::COMMENT,
            _ => return None,
        },
    };
    Some((token_type, 0))
}

/// Push `token`, one entry per line it covers.
fn push_token(token: &Token, token_type: u32, modifiers: u32, out: &mut Vec<RawToken>) {
    let range = token.range;
    if range.start.line == range.end.line {
        let length = range.end.character.saturating_sub(range.start.character);
        if length > 0 {
            out.push(RawToken {
                line: range.start.line,
                start: range.start.character,
                length,
                token_type,
                modifiers,
            });
        }
        return;
    }

    for (offset, text) in token.content.split('\n').enumerate() {
        let text = text.strip_suffix('\r').unwrap_or(text);
        let length = utf16_len(text);
        if length == 0 {
            continue;
        }
        let line = range.start.line + offset as u32;
        out.push(RawToken {
            line,
            start: if offset == 0 { range.start.character } else { 0 },
            length,
            token_type,
            modifiers,
        });
    }
}

/// Delta-encode sorted tokens.
fn encode(raw_tokens: &[RawToken]) -> Vec<SemanticToken> {
    let mut tokens = Vec::with_capacity(raw_tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for raw in raw_tokens {
        let delta_line = raw.line - prev_line;
        let delta_start = if delta_line == 0 {
            raw.start - prev_start
        } else {
            raw.start
        };

        tokens.push(SemanticToken {
            delta_line,
            delta_start,
            length: raw.length,
            token_type: raw.token_type,
            token_modifiers_bitset: raw.modifiers,
        });

        prev_line = raw.line;
        prev_start = raw.start;
    }
    tokens
}
