//! Position-indexed lookups over a compiled document.
//!
//! Every feature handler starts here: find the statement under the cursor,
//! walk the nodes inside it, and map what the compiler resolved back to a
//! definition. Lookups that find nothing return `None`.

use bblang_core::keywords::{has_modifier, EXPORT_MODIFIER};
use bblang_core::walk::{self, Node};
use bblang_core::{
    CompiledAlias, CompiledConstant, CompiledField, CompiledFunction, CompiledParameter,
    CompiledStruct, CompilerResult, ExpressionKind, FileUri, FunctionKind, GeneralType, Location,
    ParserResult, Reference, SinglePosition, Statement, Token, TypeSyntax, VariableReference,
};
use std::fmt::Write as _;

/// The innermost statement containing `position`.
///
/// Statements are listed parents first, so the last match is the deepest.
pub fn statement_at(ast: &ParserResult, position: SinglePosition) -> Option<&Statement> {
    ast.statements()
        .into_iter()
        .rev()
        .find(|statement| statement.range().contains(position))
}

/// The part of a node the user points at to mean the node itself.
pub fn interactive_range(node: Node<'_>) -> bblang_core::Range {
    match node {
        Node::Expression(expression) => match &expression.kind {
            ExpressionKind::Call { callee, .. } => match &callee.kind {
                ExpressionKind::Field { identifier, .. } => identifier.range,
                _ => callee.range,
            },
            ExpressionKind::BinaryOperator { operator, .. }
            | ExpressionKind::UnaryOperator { operator, .. } => operator.range,
            ExpressionKind::Field { identifier, .. } => identifier.range,
            ExpressionKind::ConstructorCall {
                keyword,
                type_syntax,
                ..
            } => keyword.range.union(type_syntax.range()),
            ExpressionKind::ManagedTypeCast {
                type_syntax,
                brackets,
                ..
            } => type_syntax.range().union(brackets.range()),
            _ => expression.range,
        },
        Node::Statement(Statement::VariableDefinition(definition)) => definition.identifier.range,
        Node::Statement(statement) => statement.range(),
    }
}

/// Nodes of the statement under `position` whose range and interactive
/// range both contain it, outermost first.
pub fn nodes_at(ast: &ParserResult, position: SinglePosition) -> Vec<Node<'_>> {
    let Some(statement) = statement_at(ast, position) else {
        return Vec::new();
    };
    walk::descendants(statement)
        .into_iter()
        .filter(|node| node.range().contains(position) && interactive_range(*node).contains(position))
        .collect()
}

/// The deepest node under `position` that refers to a definition.
pub fn reference_at(ast: &ParserResult, position: SinglePosition) -> Option<(Node<'_>, &Reference)> {
    nodes_at(ast, position)
        .into_iter()
        .rev()
        .find_map(|node| node.reference().map(|reference| (node, reference)))
}

/// Descend from a written type to the part of it under `position`, keeping
/// the resolved type in lock step.
///
/// Aliases are looked through to find structure, but the type returned for
/// the final node is the one found at that level, alias included.
pub fn narrow<'a>(
    syntax: &'a TypeSyntax,
    ty: &'a GeneralType,
    position: SinglePosition,
) -> (&'a TypeSyntax, &'a GeneralType) {
    match (syntax, ty.resolve_alias()) {
        (
            TypeSyntax::Simple {
                type_arguments: Some(arguments),
                ..
            },
            GeneralType::Struct(structure),
        ) => {
            for (argument, (_, value)) in arguments.iter().zip(&structure.type_arguments) {
                if argument.range().contains(position) {
                    return narrow(argument, value, position);
                }
            }
        }
        (TypeSyntax::Pointer { to, .. }, GeneralType::Pointer(target)) => {
            if to.range().contains(position) {
                return narrow(to, target, position);
            }
        }
        (TypeSyntax::StackArray { of, .. }, GeneralType::Array { of: element, .. }) => {
            if of.range().contains(position) {
                return narrow(of, element, position);
            }
        }
        (
            TypeSyntax::Function {
                return_type,
                parameters,
                ..
            },
            GeneralType::Function {
                return_type: returns,
                parameters: parameter_types,
            },
        ) if parameters.len() == parameter_types.len() => {
            if return_type.range().contains(position) {
                return narrow(return_type, returns, position);
            }
            for (parameter, parameter_type) in parameters.iter().zip(parameter_types) {
                if parameter.range().contains(position) {
                    return narrow(parameter, parameter_type, position);
                }
            }
        }
        _ => {}
    }
    (syntax, ty)
}

/// The written type under `position` in `file`, with its resolved type.
///
/// Declaration sites are checked first (parameters, return types, fields
/// and alias values), then types written inside statements.
pub fn type_instance_at<'a>(
    result: &'a CompilerResult,
    ast: &'a ParserResult,
    file: &FileUri,
    position: SinglePosition,
) -> Option<(&'a TypeSyntax, &'a GeneralType)> {
    let mut declarations: Vec<(&TypeSyntax, &GeneralType)> = Vec::new();
    for function in &result.functions {
        if function.definition.file.as_ref() != Some(file) {
            continue;
        }
        for parameter in &function.parameters {
            declarations.push((&parameter.definition.type_syntax, &parameter.ty));
        }
        if function.kind() != FunctionKind::GeneralFunction {
            declarations.push((&function.definition.return_type, &function.return_type));
        }
    }
    for (_, structure) in result.structs_in(file) {
        for field in &structure.fields {
            declarations.push((&field.definition.type_syntax, &field.ty));
        }
    }
    for (_, alias) in result.aliases_in(file) {
        declarations.push((&alias.definition.value, &alias.value));
    }

    if let Some((syntax, ty)) = declarations
        .into_iter()
        .find(|(syntax, _)| syntax.range().contains(position))
    {
        return Some(narrow(syntax, ty, position));
    }

    let statement = statement_at(ast, position)?;
    let mut found = None;
    for node in walk::descendants(statement) {
        if !node.range().contains(position) {
            continue;
        }
        let Some(syntax) = node.type_syntax() else {
            continue;
        };
        if !syntax.range().contains(position) {
            continue;
        }
        if let Some(ty) = node.compiled_type() {
            found = Some(narrow(syntax, ty, position));
        }
    }
    found.filter(|(syntax, _)| syntax.range().contains(position))
}

/// A definition a [`Reference`] resolved to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedSymbol<'a> {
    /// A function, operator, general function or constructor.
    Function {
        /// The function.
        function: &'a CompiledFunction,
        /// Template arguments at the use site.
        type_arguments: Option<&'a [(String, GeneralType)]>,
    },
    /// A struct.
    Struct(&'a CompiledStruct),
    /// A struct field.
    Field {
        /// The owning struct.
        structure: &'a CompiledStruct,
        /// The field.
        field: &'a CompiledField,
    },
    /// A function parameter.
    Parameter {
        /// The owning function.
        function: &'a CompiledFunction,
        /// The parameter.
        parameter: &'a CompiledParameter,
    },
    /// A local or global variable.
    Variable(&'a VariableReference),
    /// A compiled constant.
    Constant(&'a CompiledConstant),
    /// An alias.
    Alias(&'a CompiledAlias),
}

impl<'a> ResolvedSymbol<'a> {
    /// Look `reference` up in the tables of `result`.
    pub fn resolve(result: &'a CompilerResult, reference: &'a Reference) -> Option<Self> {
        Some(match reference {
            Reference::Function {
                index,
                type_arguments,
            } => Self::Function {
                function: result.functions.get(*index)?,
                type_arguments: type_arguments.as_deref(),
            },
            Reference::Struct(index) => Self::Struct(result.structs.get(*index)?),
            Reference::Field { structure, field } => {
                let structure = result.structs.get(*structure)?;
                Self::Field {
                    structure,
                    field: structure.fields.get(*field)?,
                }
            }
            Reference::Parameter {
                function,
                parameter,
            } => {
                let function = result.functions.get(*function)?;
                Self::Parameter {
                    function,
                    parameter: function.parameters.get(*parameter)?,
                }
            }
            Reference::Variable(variable) => Self::Variable(variable),
            Reference::Constant(index) => Self::Constant(result.constants.get(*index)?),
            Reference::Alias(index) => Self::Alias(result.aliases.get(*index)?),
        })
    }

    /// One-line description in source syntax.
    pub fn render(&self) -> String {
        match *self {
            Self::Function {
                function,
                type_arguments,
            } => render_function(function, type_arguments),
            Self::Struct(structure) => format!(
                "{}struct {}",
                modifiers_prefix(&structure.definition.modifiers, false),
                structure.name()
            ),
            Self::Field { field, .. } => {
                format!("(field) {} {}", field.ty, field.definition.identifier.content)
            }
            Self::Parameter { parameter, .. } => format!(
                "(parameter) {}{} {}",
                modifiers_prefix(&parameter.definition.modifiers, false),
                parameter.ty,
                parameter.definition.identifier.content
            ),
            Self::Variable(variable) => {
                let label = if has_modifier(&variable.modifiers, bblang_core::keywords::CONST_MODIFIER)
                {
                    "(constant)"
                } else {
                    "(variable)"
                };
                format!(
                    "{label} {}{} {}",
                    modifiers_prefix(&variable.modifiers, false),
                    variable.ty,
                    variable.identifier.content
                )
            }
            Self::Constant(constant) => format!(
                "(constant) {} {} = {}",
                constant.ty, constant.identifier.content, constant.value
            ),
            Self::Alias(alias) => format!(
                "{}alias {}",
                modifiers_prefix(&alias.definition.modifiers, false),
                alias.definition.identifier.content
            ),
        }
    }

    /// Where the symbol's name is declared.
    pub fn definition(&self) -> Option<Location> {
        let (file, identifier) = match *self {
            Self::Function { function, .. } => {
                (function.definition.file.as_ref(), &function.definition.identifier)
            }
            Self::Struct(structure) => {
                (structure.definition.file.as_ref(), &structure.definition.identifier)
            }
            Self::Field { structure, field } => {
                (structure.definition.file.as_ref(), &field.definition.identifier)
            }
            Self::Parameter {
                function,
                parameter,
            } => (function.definition.file.as_ref(), &parameter.definition.identifier),
            Self::Variable(variable) => (variable.file.as_ref(), &variable.identifier),
            Self::Constant(constant) => (constant.file.as_ref(), &constant.identifier),
            Self::Alias(alias) => (alias.definition.file.as_ref(), &alias.definition.identifier),
        };
        Some(Location::new(file?.clone(), identifier.range))
    }

    /// Where comment documentation for the symbol ends: the start of its
    /// declaration, attributes included. `None` for symbols that are not
    /// documented.
    pub fn documentation_anchor(&self) -> Option<Location> {
        let (file, start) = match *self {
            Self::Function { function, .. } => {
                let definition = &function.definition;
                let start = definition
                    .attributes
                    .first()
                    .map_or(definition.range.start, |attribute| {
                        attribute.range.start.min(definition.range.start)
                    });
                (definition.file.as_ref(), start)
            }
            Self::Struct(structure) => {
                let definition = &structure.definition;
                let start = definition
                    .attributes
                    .first()
                    .map_or(definition.range.start, |attribute| {
                        attribute.range.start.min(definition.range.start)
                    });
                (definition.file.as_ref(), start)
            }
            Self::Field { structure, field } => {
                (structure.definition.file.as_ref(), field.definition.range.start)
            }
            Self::Constant(constant) => (constant.file.as_ref(), constant.range.start),
            Self::Alias(alias) => (alias.definition.file.as_ref(), alias.definition.range.start),
            Self::Parameter { .. } | Self::Variable(_) => return None,
        };
        Some(Location::new(
            file?.clone(),
            bblang_core::Range::new(start, start),
        ))
    }
}

/// `mods ` with a trailing space, or nothing.
pub fn modifiers_prefix(modifiers: &[Token], hide_export: bool) -> String {
    let mut result = String::new();
    for modifier in modifiers {
        if hide_export && modifier.content == EXPORT_MODIFIER {
            continue;
        }
        result.push_str(&modifier.content);
        result.push(' ');
    }
    result
}

fn render_function(
    function: &CompiledFunction,
    type_arguments: Option<&[(String, GeneralType)]>,
) -> String {
    let definition = &function.definition;
    let substitute = |ty: &GeneralType| match type_arguments {
        Some(arguments) => ty.substitute(arguments),
        None => ty.clone(),
    };

    let mut result = modifiers_prefix(&definition.modifiers, true);
    let _ = write!(result, "{} {}", substitute(&function.return_type), definition.name());

    match (type_arguments, &definition.template) {
        (Some(arguments), _) if !arguments.is_empty() => {
            let arguments: Vec<String> = arguments.iter().map(|(_, ty)| ty.to_string()).collect();
            let _ = write!(result, "<{}>", arguments.join(", "));
        }
        (_, Some(template)) if !template.is_empty() => {
            let names: Vec<&str> = template.iter().map(|token| token.content.as_str()).collect();
            let _ = write!(result, "<{}>", names.join(", "));
        }
        _ => {}
    }

    let parameters: Vec<String> = function
        .parameters
        .iter()
        .map(|parameter| {
            format!(
                "{}{} {}",
                modifiers_prefix(&parameter.definition.modifiers, false),
                substitute(&parameter.ty),
                parameter.definition.identifier.content
            )
        })
        .collect();
    let _ = write!(result, "({})", parameters.join(", "));
    result
}
