//! Compiler boundary types for the BBLang language server.
//!
//! The language server never tokenizes, parses or type-checks on its own. It
//! drives an implementation of [`Compiler`] and answers editor queries from
//! what the compiler hands back:
//!
//! - [`Token`] - Tokens with the compiler's semantic annotation
//! - [`ParserResult`] - Per-file syntax tree
//! - [`GeneralType`] - Resolved types
//! - [`CompilerResult`] - Resolved definitions across every compiled file
//! - [`Diagnostic`] - Errors, warnings and notes
//! - [`SourceProvider`] - How `using` paths are turned into source text
//! - [`CompilationCache`] - Parses shared between compilations
//!
//! # Example
//!
//! ```
//! use bblang_core::{FileUri, FileSourceProvider, SourceProvider};
//!
//! let current = FileUri::new("file:///project/main.bbc");
//! let provider = FileSourceProvider::default();
//! let candidates = provider.get_query("lib/math", Some(&current));
//! assert_eq!(candidates[0].as_str(), "file:///project/lib/math.bbc");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod compiler;
pub mod definitions;
pub mod diagnostics;
pub mod keywords;
pub mod position;
pub mod settings;
pub mod source;
pub mod syntax;
pub mod token;
pub mod types;
pub mod uri;
pub mod walk;

pub use cache::{CacheEntry, CompilationCache};
pub use compiler::Compiler;
pub use definitions::{
    Accessible, CompiledAlias, CompiledConstant, CompiledField, CompiledFunction,
    CompiledParameter, CompiledStruct, CompilerResult, ConstantValue, ParsedFile, Reference,
    ReferenceSite, VariableReference,
};
pub use diagnostics::{
    Diagnostic, DiagnosticWithoutContext, DiagnosticsCollection, DiagnosticsLevel, LanguageError,
};
pub use position::{Location, Range, SinglePosition};
pub use settings::{
    CompilerSettings, ExternalConstant, ExternalFunction, OptimizationLevel,
    PreprocessorVariables, TokenizerSettings,
};
pub use source::{
    with_source_extension, FileSourceProvider, SourceProvider, SourceProviderResult,
    VersionProvider,
};
pub use syntax::{
    AliasDefinition, ArgumentList, AttributeUsage, Block, Branch, Brackets, Expression,
    ExpressionKind, FieldDefinition, FunctionDefinition, FunctionKind, KeywordCall,
    ParameterDefinition, ParserResult, Statement, StructDefinition, TypeSyntax, UsingDefinition,
    VariableDefinition,
};
pub use token::{token_at, AnalyzedType, Token, TokenType};
pub use types::{AliasType, BuiltinType, GeneralType, GenericType, StructType};
pub use uri::FileUri;
pub use walk::Node;
