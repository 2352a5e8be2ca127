//! Tokens produced by the tokenizer and annotated by the compiler.

use serde::{Deserialize, Serialize};

use crate::{Range, SinglePosition};

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Names and keywords.
    Identifier,
    /// Decimal integer literal.
    LiteralNumber,
    /// `0x` integer literal.
    LiteralHex,
    /// `0b` integer literal.
    LiteralBinary,
    /// Floating point literal.
    LiteralFloat,
    /// String literal, without quotes.
    LiteralString,
    /// Character literal, without quotes.
    LiteralCharacter,
    /// Punctuation and operators.
    Operator,
    /// Line comment. Content excludes the `//` marker.
    Comment,
    /// Block comment. Content excludes the `/*` and `*/` delimiters.
    CommentMultiline,
    /// Preprocessor directive name.
    PreprocessIdentifier,
    /// Preprocessor directive argument.
    PreprocessArgument,
    /// Source excluded by a preprocessor condition.
    PreprocessSkipped,
    /// Spaces and tabs.
    Whitespace,
    /// Line terminator.
    LineBreak,
}

/// What the compiler decided a token means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyzedType {
    /// Not analysed.
    #[default]
    None,
    /// Attribute name.
    Attribute,
    /// Type name.
    Type,
    /// Alias name.
    TypeAlias,
    /// Struct name.
    Struct,
    /// Function name.
    FunctionName,
    /// Variable name.
    VariableName,
    /// Constant name.
    ConstantName,
    /// Parameter name.
    ParameterName,
    /// Template parameter name.
    TypeParameter,
    /// Language keyword.
    Keyword,
    /// Struct field name.
    FieldName,
    /// Compile-time tag.
    CompileTag,
    /// Compile-time tag parameter.
    CompileTagParameter,
    /// Statement keyword.
    Statement,
    /// Builtin type keyword.
    BuiltinType,
    /// Arithmetic operator.
    MathOperator,
    /// Any other operator.
    OtherOperator,
    /// Type modifier such as `*`.
    TypeModifier,
    /// Label target.
    InstructionLabel,
}

/// A token with its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Lexical class.
    pub token_type: TokenType,
    /// Compiler annotation.
    pub analyzed_type: AnalyzedType,
    /// Source text of the token.
    pub content: String,
    /// Where the token is.
    pub range: Range,
}

impl Token {
    /// Create an unanalysed token.
    pub fn new(token_type: TokenType, content: impl Into<String>, range: Range) -> Self {
        Self {
            token_type,
            analyzed_type: AnalyzedType::None,
            content: content.into(),
            range,
        }
    }

    /// Shorthand for an identifier token.
    pub fn identifier(content: impl Into<String>, range: Range) -> Self {
        Self::new(TokenType::Identifier, content, range)
    }

    /// Shorthand for an operator token.
    pub fn operator(content: impl Into<String>, range: Range) -> Self {
        Self::new(TokenType::Operator, content, range)
    }

    /// Attach the compiler's annotation.
    #[must_use]
    pub fn analyzed(mut self, analyzed_type: AnalyzedType) -> Self {
        self.analyzed_type = analyzed_type;
        self
    }

    /// Whether this is any kind of numeric literal.
    pub const fn is_numeric_literal(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::LiteralNumber
                | TokenType::LiteralHex
                | TokenType::LiteralBinary
                | TokenType::LiteralFloat
        )
    }
}

/// Find the token under `position`.
pub fn token_at(tokens: &[Token], position: SinglePosition) -> Option<&Token> {
    tokens.iter().find(|token| token.range.contains(position))
}
