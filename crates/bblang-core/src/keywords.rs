//! Language keywords and builtin attribute names.

use crate::{BuiltinType, Token};

/// Language id editors use for BBLang documents.
pub const LANGUAGE_ID: &str = "bbc";

/// Extension of BBLang source files, without the dot.
pub const SOURCE_EXTENSION: &str = "bbc";

/// Makes a definition visible to other files.
pub const EXPORT_MODIFIER: &str = "export";
/// Marks an extension-method receiver.
pub const THIS_MODIFIER: &str = "this";
/// Passes an argument by reference.
pub const REF_MODIFIER: &str = "ref";
/// Declares a constant.
pub const CONST_MODIFIER: &str = "const";

/// Keywords that start a declaration.
pub const DECLARATION_KEYWORDS: &[&str] = &["struct", "alias", "using", "template"];

/// Visibility keywords.
pub const PROTECTION_KEYWORDS: &[&str] = &["private", EXPORT_MODIFIER];

/// Keywords modifying parameters, variables and functions.
pub const MODIFIER_KEYWORDS: &[&str] = &[
    THIS_MODIFIER,
    REF_MODIFIER,
    "temp",
    CONST_MODIFIER,
    "inline",
];

/// Statement keywords.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "elseif", "else", "while", "for", "return", "break", "delete", "new", "sizeof", "as",
    "var", "goto", "crash",
];

/// Keywords naming builtin types.
pub fn type_keywords() -> impl Iterator<Item = &'static str> {
    BuiltinType::ALL.into_iter().map(BuiltinType::keyword)
}

/// Marks a function as unsuitable for the IL generator.
pub const ATTRIBUTE_MSIL_INCOMPATIBLE: &str = "MSILIncompatible";
/// Marks a function as a compiler builtin.
pub const ATTRIBUTE_BUILTIN: &str = "Builtin";
/// Marks a function as callable from outside the interpreter.
pub const ATTRIBUTE_EXPOSE: &str = "Expose";
/// Marks a function as implemented outside the interpreter.
pub const ATTRIBUTE_EXTERNAL: &str = "External";
/// Marks a type as the default for a kind of value.
pub const ATTRIBUTE_INTERNAL_TYPE: &str = "InternalType";

/// Every builtin attribute with its description.
pub const ATTRIBUTES: &[(&str, &str)] = &[
    (
        ATTRIBUTE_MSIL_INCOMPATIBLE,
        "Marks the function not compatible with MSIL, therefore it won't be optimized using the IL generator",
    ),
    (
        ATTRIBUTE_BUILTIN,
        "Marks the function as built-in, so it will be used by the compiler to generate code for syntax sugars",
    ),
    (
        ATTRIBUTE_EXPOSE,
        "Marks the function as exposable, so it can be called from outside the interpreter",
    ),
    (
        ATTRIBUTE_EXTERNAL,
        "Marks the function as external, as it's implementation is defined outside the interpreter",
    ),
    (
        ATTRIBUTE_INTERNAL_TYPE,
        "Marks the type as the default one for the specified kind of values",
    ),
];

/// Description of a builtin attribute.
pub fn attribute_description(name: &str) -> Option<&'static str> {
    ATTRIBUTES
        .iter()
        .find(|(attribute, _)| *attribute == name)
        .map(|(_, description)| *description)
}

/// Whether `modifiers` contains the keyword `name`.
pub fn has_modifier(modifiers: &[Token], name: &str) -> bool {
    modifiers.iter().any(|modifier| modifier.content == name)
}
