//! The compiler the language server drives.

use crate::{
    CompilerResult, CompilerSettings, DiagnosticsCollection, FileUri, LanguageError,
    ParserResult, PreprocessorVariables, Token, TokenizerSettings,
};

/// Tokenizer, parser and type checker behind one interface.
///
/// Implementations are synchronous and may take a while; the server runs them
/// off the async runtime. A file that fails to parse must not stop the other
/// files of the batch from compiling: its problems belong in `diagnostics`.
pub trait Compiler: Send + Sync + 'static {
    /// Compile `files` and everything they import.
    ///
    /// An `Err` aborts the whole compilation; the server reports it as a
    /// diagnostic and keeps the previous analysis.
    fn compile(
        &self,
        files: &[FileUri],
        settings: &CompilerSettings,
        diagnostics: &mut DiagnosticsCollection,
    ) -> Result<CompilerResult, LanguageError>;

    /// Split `text` into tokens.
    fn tokenize(
        &self,
        text: &str,
        diagnostics: &mut DiagnosticsCollection,
        variables: &PreprocessorVariables,
        uri: &FileUri,
        settings: &TokenizerSettings,
    ) -> Vec<Token>;

    /// Build a syntax tree from `tokens`.
    fn parse(
        &self,
        tokens: &[Token],
        uri: &FileUri,
        diagnostics: &mut DiagnosticsCollection,
    ) -> ParserResult;
}
