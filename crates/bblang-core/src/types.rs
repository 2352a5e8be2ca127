//! Types as resolved by the compiler.

use std::fmt;

use crate::Location;

/// A type built into the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// No value.
    Void,
    /// Any value.
    Any,
    /// 8-bit unsigned integer.
    Byte,
    /// 16-bit character.
    Char,
    /// 32-bit signed integer.
    Int,
    /// 32-bit float.
    Float,
}

impl BuiltinType {
    /// Every builtin type, in keyword-list order.
    pub const ALL: [Self; 6] = [
        Self::Void,
        Self::Any,
        Self::Byte,
        Self::Char,
        Self::Int,
        Self::Float,
    ];

    /// The keyword naming this type.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Any => "any",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Int => "int",
            Self::Float => "float",
        }
    }

    /// Look a builtin type up by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == keyword)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An instantiated struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    /// Index into [`CompilerResult::structs`](crate::CompilerResult::structs).
    pub index: usize,
    /// Struct name.
    pub name: String,
    /// Template arguments in template-parameter order.
    pub type_arguments: Vec<(String, GeneralType)>,
}

/// A template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericType {
    /// Parameter name.
    pub identifier: String,
    /// Where the parameter is declared.
    pub definition: Option<Location>,
}

/// A named alias of another type.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasType {
    /// Index into [`CompilerResult::aliases`](crate::CompilerResult::aliases),
    /// when the alias is user-defined.
    pub index: Option<usize>,
    /// Alias name.
    pub name: String,
    /// The aliased type.
    pub value: Box<GeneralType>,
    /// Where the alias is declared.
    pub definition: Option<Location>,
}

/// A fully resolved type.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralType {
    /// Builtin type.
    Builtin(BuiltinType),
    /// Struct type.
    Struct(StructType),
    /// Pointer to a type.
    Pointer(Box<GeneralType>),
    /// Fixed-size array.
    Array {
        /// Element type.
        of: Box<GeneralType>,
        /// Element count, when known.
        length: Option<usize>,
    },
    /// Function pointer type.
    Function {
        /// Return type.
        return_type: Box<GeneralType>,
        /// Parameter types.
        parameters: Vec<GeneralType>,
    },
    /// Unsubstituted template parameter.
    Generic(GenericType),
    /// Alias of another type.
    Alias(AliasType),
}

impl GeneralType {
    /// A pointer to `to`.
    pub fn pointer(to: Self) -> Self {
        Self::Pointer(Box::new(to))
    }

    /// Follow aliases down to the aliased type.
    pub fn resolve_alias(&self) -> &Self {
        let mut current = self;
        while let Self::Alias(alias) = current {
            current = &alias.value;
        }
        current
    }

    /// The pointed-to type, looking through aliases.
    pub fn as_pointer(&self) -> Option<&Self> {
        match self.resolve_alias() {
            Self::Pointer(to) => Some(to),
            _ => None,
        }
    }

    /// The struct type, looking through aliases.
    pub fn as_struct(&self) -> Option<&StructType> {
        match self.resolve_alias() {
            Self::Struct(struct_type) => Some(struct_type),
            _ => None,
        }
    }

    /// Structural equality, with aliases transparent.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self.resolve_alias(), other.resolve_alias()) {
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => {
                a.index == b.index
                    && a.type_arguments.len() == b.type_arguments.len()
                    && a.type_arguments
                        .iter()
                        .zip(&b.type_arguments)
                        .all(|((_, a), (_, b))| a.same_as(b))
            }
            (Self::Pointer(a), Self::Pointer(b)) => a.same_as(b),
            (
                Self::Array {
                    of: a,
                    length: a_length,
                },
                Self::Array {
                    of: b,
                    length: b_length,
                },
            ) => a_length == b_length && a.same_as(b),
            (
                Self::Function {
                    return_type: a_return,
                    parameters: a_parameters,
                },
                Self::Function {
                    return_type: b_return,
                    parameters: b_parameters,
                },
            ) => {
                a_return.same_as(b_return)
                    && a_parameters.len() == b_parameters.len()
                    && a_parameters
                        .iter()
                        .zip(b_parameters)
                        .all(|(a, b)| a.same_as(b))
            }
            (Self::Generic(a), Self::Generic(b)) => a.identifier == b.identifier,
            _ => false,
        }
    }

    /// Replace template parameters that have a matching argument.
    #[must_use]
    pub fn substitute(&self, arguments: &[(String, Self)]) -> Self {
        match self {
            Self::Generic(generic) => arguments
                .iter()
                .find(|(name, _)| *name == generic.identifier)
                .map_or_else(|| self.clone(), |(_, value)| value.clone()),
            Self::Struct(struct_type) => Self::Struct(StructType {
                index: struct_type.index,
                name: struct_type.name.clone(),
                type_arguments: struct_type
                    .type_arguments
                    .iter()
                    .map(|(name, value)| (name.clone(), value.substitute(arguments)))
                    .collect(),
            }),
            Self::Pointer(to) => Self::pointer(to.substitute(arguments)),
            Self::Array { of, length } => Self::Array {
                of: Box::new(of.substitute(arguments)),
                length: *length,
            },
            Self::Function {
                return_type,
                parameters,
            } => Self::Function {
                return_type: Box::new(return_type.substitute(arguments)),
                parameters: parameters
                    .iter()
                    .map(|p| p.substitute(arguments))
                    .collect(),
            },
            Self::Builtin(_) | Self::Alias(_) => self.clone(),
        }
    }
}

impl From<BuiltinType> for GeneralType {
    fn from(value: BuiltinType) -> Self {
        Self::Builtin(value)
    }
}

impl fmt::Display for GeneralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "{builtin}"),
            Self::Struct(struct_type) => {
                f.write_str(&struct_type.name)?;
                if !struct_type.type_arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, (_, argument)) in struct_type.type_arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{argument}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Pointer(to) => write!(f, "{to}*"),
            Self::Array {
                of,
                length: Some(length),
            } => write!(f, "{of}[{length}]"),
            Self::Array { of, length: None } => write!(f, "{of}[]"),
            Self::Function {
                return_type,
                parameters,
            } => {
                write!(f, "{return_type}(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                f.write_str(")")
            }
            Self::Generic(generic) => f.write_str(&generic.identifier),
            Self::Alias(alias) => f.write_str(&alias.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(element: GeneralType) -> GeneralType {
        GeneralType::Struct(StructType {
            index: 0,
            name: "List".to_string(),
            type_arguments: vec![("T".to_string(), element)],
        })
    }

    fn generic(name: &str) -> GeneralType {
        GeneralType::Generic(GenericType {
            identifier: name.to_string(),
            definition: None,
        })
    }

    #[test]
    fn test_display() {
        let ty = GeneralType::pointer(list_of(BuiltinType::Int.into()));
        assert_eq!(ty.to_string(), "List<int>*");

        let function = GeneralType::Function {
            return_type: Box::new(BuiltinType::Void.into()),
            parameters: vec![BuiltinType::Char.into(), BuiltinType::Float.into()],
        };
        assert_eq!(function.to_string(), "void(char, float)");

        let array = GeneralType::Array {
            of: Box::new(BuiltinType::Byte.into()),
            length: Some(4),
        };
        assert_eq!(array.to_string(), "byte[4]");
    }

    #[test]
    fn test_same_as_looks_through_aliases() {
        let alias = GeneralType::Alias(AliasType {
            index: Some(0),
            name: "Number".to_string(),
            value: Box::new(BuiltinType::Int.into()),
            definition: None,
        });
        assert!(alias.same_as(&BuiltinType::Int.into()));
        assert!(!alias.same_as(&BuiltinType::Float.into()));
        assert_eq!(alias.to_string(), "Number");
    }

    #[test]
    fn test_same_as_struct_arguments() {
        assert!(list_of(BuiltinType::Int.into()).same_as(&list_of(BuiltinType::Int.into())));
        assert!(!list_of(BuiltinType::Int.into()).same_as(&list_of(BuiltinType::Char.into())));
    }

    #[test]
    fn test_substitute() {
        let ty = GeneralType::pointer(list_of(generic("T")));
        let substituted = ty.substitute(&[("T".to_string(), BuiltinType::Float.into())]);
        assert_eq!(substituted.to_string(), "List<float>*");

        let untouched = generic("U").substitute(&[("T".to_string(), BuiltinType::Float.into())]);
        assert_eq!(untouched.to_string(), "U");
    }

    #[test]
    fn test_builtin_keywords() {
        assert_eq!(BuiltinType::from_keyword("int"), Some(BuiltinType::Int));
        assert_eq!(BuiltinType::from_keyword("Int"), None);
    }
}
