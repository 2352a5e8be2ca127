//! The compiler's output: resolved definitions and per-file syntax trees.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keywords::{has_modifier, EXPORT_MODIFIER};
use crate::syntax::{
    AliasDefinition, FieldDefinition, FunctionDefinition, FunctionKind, ParameterDefinition,
    ParserResult, Statement, StructDefinition, VariableDefinition,
};
use crate::{FileUri, GeneralType, Range, SinglePosition, Token};

/// What a syntax node refers to, as decided by the compiler.
///
/// Indices point into the tables of the [`CompilerResult`] the node came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// A function, operator, general function or constructor.
    Function {
        /// Index into [`CompilerResult::functions`].
        index: usize,
        /// Template arguments inferred at the call site.
        type_arguments: Option<Vec<(String, GeneralType)>>,
    },
    /// A struct, by index into [`CompilerResult::structs`].
    Struct(usize),
    /// A struct field.
    Field {
        /// Index into [`CompilerResult::structs`].
        structure: usize,
        /// Index into the struct's fields.
        field: usize,
    },
    /// A function parameter.
    Parameter {
        /// Index into [`CompilerResult::functions`].
        function: usize,
        /// Index into the function's parameters.
        parameter: usize,
    },
    /// A local or global variable.
    Variable(VariableReference),
    /// A compiled constant, by index into [`CompilerResult::constants`].
    Constant(usize),
    /// An alias, by index into [`CompilerResult::aliases`].
    Alias(usize),
}

/// Enough of a variable's declaration to describe and locate it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableReference {
    /// File the variable is declared in.
    pub file: Option<FileUri>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Variable type.
    pub ty: GeneralType,
    /// Variable name.
    pub identifier: Token,
}

/// A place in source that uses a definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSite {
    /// The using expression's span.
    pub source: Range,
    /// File containing the use.
    pub file: Option<FileUri>,
}

/// A parameter together with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledParameter {
    /// The declaration.
    pub definition: ParameterDefinition,
    /// Resolved type.
    pub ty: GeneralType,
}

/// A function with resolved types.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    /// The declaration.
    pub definition: FunctionDefinition,
    /// Resolved return type.
    pub return_type: GeneralType,
    /// Parameters with resolved types.
    pub parameters: Vec<CompiledParameter>,
    /// Every use of the function.
    pub references: Vec<ReferenceSite>,
}

impl CompiledFunction {
    /// Function name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Kind of callable.
    pub const fn kind(&self) -> FunctionKind {
        self.definition.kind
    }

    /// Whether the first parameter is a `this` receiver.
    pub fn is_extension(&self) -> bool {
        self.definition.is_extension()
    }
}

/// A field with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    /// The declaration.
    pub definition: FieldDefinition,
    /// Resolved type.
    pub ty: GeneralType,
}

/// A struct with resolved field types.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStruct {
    /// The declaration.
    pub definition: StructDefinition,
    /// Fields with resolved types.
    pub fields: Vec<CompiledField>,
    /// Every use of the struct.
    pub references: Vec<ReferenceSite>,
}

impl CompiledStruct {
    /// Struct name.
    pub fn name(&self) -> &str {
        &self.definition.identifier.content
    }
}

/// An alias with its resolved value.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAlias {
    /// The declaration.
    pub definition: AliasDefinition,
    /// Resolved aliased type.
    pub value: GeneralType,
}

/// A value known at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// String.
    String(String),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// A constant evaluated by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConstant {
    /// File the constant is declared in. `None` for externally supplied constants.
    pub file: Option<FileUri>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Constant name.
    pub identifier: Token,
    /// Constant type.
    pub ty: GeneralType,
    /// Evaluated value.
    pub value: ConstantValue,
    /// Whole span.
    pub range: Range,
}

/// The tokens and syntax tree of one compiled file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    /// The file.
    pub file: FileUri,
    /// Its tokens, comments included.
    pub tokens: Vec<Token>,
    /// Its syntax tree.
    pub ast: ParserResult,
}

/// Everything a compilation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerResult {
    /// Functions, operators, general functions and constructors of every file.
    pub functions: Vec<CompiledFunction>,
    /// Structs of every file.
    pub structs: Vec<CompiledStruct>,
    /// Aliases of every file.
    pub aliases: Vec<CompiledAlias>,
    /// Constants of every file, plus externally supplied ones.
    pub constants: Vec<CompiledConstant>,
    /// Per-file tokens and syntax trees.
    pub files: Vec<ParsedFile>,
}

impl CompilerResult {
    /// An empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tokens and syntax tree of `uri`, if it was part of the compilation.
    pub fn file(&self, uri: &FileUri) -> Option<&ParsedFile> {
        self.files.iter().find(|parsed| &parsed.file == uri)
    }

    /// Top-level statements of every compiled file.
    pub fn raw_statements(&self) -> impl Iterator<Item = (&FileUri, &Statement)> {
        self.files.iter().flat_map(|parsed| {
            parsed
                .ast
                .top_level_statements
                .iter()
                .map(move |statement| (&parsed.file, statement))
        })
    }

    /// Functions of the given kinds defined in `file`.
    pub fn functions_in(
        &self,
        file: &FileUri,
        kinds: &[FunctionKind],
    ) -> Vec<(usize, &CompiledFunction)> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, function)| {
                kinds.contains(&function.kind()) && function.definition.file.as_ref() == Some(file)
            })
            .collect()
    }

    /// Structs defined in `file`.
    pub fn structs_in(&self, file: &FileUri) -> Vec<(usize, &CompiledStruct)> {
        self.structs
            .iter()
            .enumerate()
            .filter(|(_, structure)| structure.definition.file.as_ref() == Some(file))
            .collect()
    }

    /// Aliases defined in `file`.
    pub fn aliases_in(&self, file: &FileUri) -> Vec<(usize, &CompiledAlias)> {
        self.aliases
            .iter()
            .enumerate()
            .filter(|(_, alias)| alias.definition.file.as_ref() == Some(file))
            .collect()
    }

    /// The function of one of `kinds` in `file` whose name is under `position`.
    pub fn function_at(
        &self,
        file: &FileUri,
        position: SinglePosition,
        kinds: &[FunctionKind],
    ) -> Option<(usize, &CompiledFunction)> {
        self.functions_in(file, kinds)
            .into_iter()
            .find(|(_, function)| function.definition.identifier.range.contains(position))
    }

    /// The struct in `file` whose name is under `position`.
    pub fn struct_at(
        &self,
        file: &FileUri,
        position: SinglePosition,
    ) -> Option<(usize, &CompiledStruct)> {
        self.structs_in(file)
            .into_iter()
            .find(|(_, structure)| structure.definition.identifier.range.contains(position))
    }
}

/// Visibility of a definition from another file.
pub trait Accessible {
    /// File the definition lives in.
    fn defined_in(&self) -> Option<&FileUri>;

    /// Modifier keywords of the definition.
    fn modifiers(&self) -> &[Token];

    /// Whether code in `from` may refer to this definition: it lives in the
    /// same file, is exported, or comes from outside any file.
    fn can_use(&self, from: &FileUri) -> bool {
        match self.defined_in() {
            None => true,
            Some(file) => file == from || has_modifier(self.modifiers(), EXPORT_MODIFIER),
        }
    }
}

macro_rules! impl_accessible {
    ($($ty:ty => $definition:ident),* $(,)?) => {
        $(
            impl Accessible for $ty {
                fn defined_in(&self) -> Option<&FileUri> {
                    self.$definition.file.as_ref()
                }

                fn modifiers(&self) -> &[Token] {
                    &self.$definition.modifiers
                }
            }
        )*
    };
}

impl_accessible!(
    CompiledFunction => definition,
    CompiledStruct => definition,
    CompiledAlias => definition,
);

impl Accessible for VariableDefinition {
    fn defined_in(&self) -> Option<&FileUri> {
        self.file.as_ref()
    }

    fn modifiers(&self) -> &[Token] {
        &self.modifiers
    }
}
