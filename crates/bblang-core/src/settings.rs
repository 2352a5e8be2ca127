//! Settings passed to each compilation.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::{CompilationCache, ConstantValue, SourceProvider, VersionProvider};

/// How hard the compiler optimises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptimizationLevel {
    /// No optimisation.
    #[default]
    None,
    /// Every optimisation.
    All,
}

/// Symbols defined for `#if` style preprocessor conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessorVariables(BTreeSet<String>);

impl PreprocessorVariables {
    /// The variables of a regular build.
    pub fn normal() -> Self {
        Self::default()
    }

    /// Define a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into());
        self
    }

    /// Whether `name` is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

/// Tokenizer switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerSettings {
    /// Emit comment tokens instead of dropping them.
    pub tokenize_comments: bool,
    /// Emit whitespace and line-break tokens.
    pub tokenize_whitespaces: bool,
}

/// A function supplied by the host instead of source code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFunction {
    /// Name the source refers to it by.
    pub name: String,
    /// Return type keyword.
    #[serde(default = "void_type")]
    pub return_type: String,
    /// Parameter type keywords.
    #[serde(default)]
    pub parameters: Vec<String>,
}

fn void_type() -> String {
    "void".to_string()
}

/// A constant supplied by the host instead of source code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalConstant {
    /// Name the source refers to it by.
    pub name: String,
    /// Its value.
    pub value: ConstantValue,
}

/// Everything one compilation needs besides the file list.
#[derive(Clone)]
pub struct CompilerSettings {
    /// Optimisation level.
    pub optimizations: OptimizationLevel,
    /// Compile every definition, not only those reachable from top-level code.
    pub compile_everything: bool,
    /// Preprocessor symbols.
    pub preprocessor_variables: PreprocessorVariables,
    /// Source providers, asked in order.
    pub source_providers: Vec<Arc<dyn SourceProvider>>,
    /// Files implicitly imported by every file.
    pub additional_imports: Vec<String>,
    /// Host-supplied functions.
    pub external_functions: Vec<ExternalFunction>,
    /// Host-supplied constants.
    pub external_constants: Vec<ExternalConstant>,
    /// Tokenizer switches.
    pub tokenizer: TokenizerSettings,
    /// Shared parse cache.
    pub cache: Arc<CompilationCache>,
    /// Reports which files are open in the editor, for cache validation.
    pub version_provider: Option<Arc<dyn VersionProvider>>,
}

impl CompilerSettings {
    /// Settings for the given cache with everything else at its default.
    pub fn new(cache: Arc<CompilationCache>) -> Self {
        Self {
            optimizations: OptimizationLevel::None,
            compile_everything: false,
            preprocessor_variables: PreprocessorVariables::normal(),
            source_providers: Vec::new(),
            additional_imports: Vec::new(),
            external_functions: Vec::new(),
            external_constants: Vec::new(),
            tokenizer: TokenizerSettings::default(),
            cache,
            version_provider: None,
        }
    }
}

impl fmt::Debug for CompilerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerSettings")
            .field("optimizations", &self.optimizations)
            .field("compile_everything", &self.compile_everything)
            .field("preprocessor_variables", &self.preprocessor_variables)
            .field("source_providers", &self.source_providers.len())
            .field("additional_imports", &self.additional_imports)
            .field("external_functions", &self.external_functions)
            .field("external_constants", &self.external_constants)
            .field("tokenizer", &self.tokenizer)
            .field("cache_entries", &self.cache.len())
            .field("version_provider", &self.version_provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_function_defaults() {
        let function: ExternalFunction = serde_json::from_str(r#"{"name": "beep"}"#).unwrap();
        assert_eq!(function.return_type, "void");
        assert!(function.parameters.is_empty());

        let function: ExternalFunction = serde_json::from_str(
            r#"{"name": "print", "returnType": "void", "parameters": ["char"]}"#,
        )
        .unwrap();
        assert_eq!(function.parameters, vec!["char".to_string()]);
    }

    #[test]
    fn test_preprocessor_variables() {
        let variables = PreprocessorVariables::normal().with("DEBUG");
        assert!(variables.is_defined("DEBUG"));
        assert!(!PreprocessorVariables::normal().is_defined("DEBUG"));
    }
}
