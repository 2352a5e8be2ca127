//! Hover handler for displaying information about symbols.
//!
//! Provides hover information for:
//! - Builtin attributes: what they do
//! - Definitions and references: the declaration in source syntax plus its
//!   comment documentation
//! - Literals: the value in every base
//! - Builtin operators: their signature
//! - `using` paths: the resolved file
//! - Written types: what the name refers to

use bblang_core::keywords::{attribute_description, has_modifier, CONST_MODIFIER, LANGUAGE_ID};
use bblang_core::walk::{self, Node};
use bblang_core::{
    token_at, ExpressionKind, FunctionKind, GeneralType, SinglePosition, Statement, TypeSyntax,
    VariableDefinition,
};
use lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use super::utils::{from_lsp_position, to_lsp_range, type_prefix};
use crate::docs::comment_documentation;
use crate::query::{
    interactive_range, modifiers_prefix, statement_at, type_instance_at, ResolvedSymbol,
};
use crate::snapshot::Snapshot;

const ALL_FUNCTION_KINDS: &[FunctionKind] = &[
    FunctionKind::Function,
    FunctionKind::GeneralFunction,
    FunctionKind::Operator,
    FunctionKind::Constructor,
];

/// What the hover shows, gathered before formatting.
#[derive(Debug, Default)]
struct HoverInfo {
    definition: Option<String>,
    ty: Option<String>,
    docs: Option<String>,
}

impl HoverInfo {
    fn symbol(&mut self, symbol: &ResolvedSymbol<'_>, snapshot: &Snapshot) {
        self.definition = Some(symbol.render());
        self.docs = symbol_documentation(symbol, snapshot);
    }

    fn to_markdown(&self) -> Option<String> {
        let mut sections = Vec::new();
        if let Some(code) = self.definition.as_ref().or(self.ty.as_ref()) {
            sections.push(format!("```{LANGUAGE_ID}\n{code}\n```"));
        }
        if let Some(docs) = &self.docs {
            sections.push(docs.clone());
        }
        (!sections.is_empty()).then(|| sections.join("\n---\n"))
    }
}

/// Handle a hover request.
pub fn handle_hover(params: &HoverParams, snapshot: &Snapshot) -> Option<Hover> {
    let position = from_lsp_position(params.text_document_position_params.position);

    let Some(token) = token_at(snapshot.tokens(), position) else {
        tracing::debug!("No token at {} ({} tokens)", position, snapshot.tokens().len());
        return None;
    };
    let mut range = token.range;

    if let Some(hover) = attribute_hover(snapshot, position) {
        return Some(hover);
    }

    let mut info = HoverInfo::default();

    if let Some(symbol) = definition_site_at(snapshot, position) {
        info.symbol(&symbol, snapshot);
    } else if let Some(statement) = statement_at(snapshot.ast(), position) {
        for node in walk::descendants(statement) {
            if !node.range().contains(position) {
                continue;
            }
            let interactive = interactive_range(node);
            if !interactive.contains(position) {
                continue;
            }
            range = interactive;
            node_hover(node, snapshot, &mut info);
        }
    } else if let Some(using) = snapshot.ast().usings.iter().find(|using| {
        using
            .path_range()
            .unwrap_or(using.keyword.range)
            .contains(position)
    }) {
        if let Some(uri) = &using.compiled_uri {
            info.definition = Some(format!("{} \"{}\"", using.keyword.content, uri));
        }
    }

    if info.ty.is_none() {
        if let Some((syntax, ty)) =
            type_instance_at(snapshot.result(), snapshot.ast(), snapshot.uri(), position)
        {
            range = syntax.range();
            info.ty = type_hover(syntax, ty);
        }
    }

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: info.to_markdown()?,
        }),
        range: Some(to_lsp_range(range)),
    })
}

fn attribute_hover(snapshot: &Snapshot, position: SinglePosition) -> Option<Hover> {
    let ast = snapshot.ast();
    let mut attributes = ast
        .functions
        .iter()
        .flat_map(|function| &function.attributes)
        .chain(ast.structs.iter().flat_map(|structure| &structure.attributes))
        .chain(ast.aliases.iter().flat_map(|alias| &alias.attributes));

    let attribute = attributes.find(|attribute| attribute.identifier.range.contains(position))?;
    let description = attribute_description(&attribute.identifier.content)?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: description.to_string(),
        }),
        range: Some(to_lsp_range(attribute.identifier.range)),
    })
}

/// A definition whose name is under `position` in this file.
fn definition_site_at(snapshot: &Snapshot, position: SinglePosition) -> Option<ResolvedSymbol<'_>> {
    let result = snapshot.result();
    let uri = snapshot.uri();

    if let Some((_, function)) = result.function_at(uri, position, ALL_FUNCTION_KINDS) {
        return Some(ResolvedSymbol::Function {
            function,
            type_arguments: None,
        });
    }
    if let Some((_, structure)) = result.struct_at(uri, position) {
        return Some(ResolvedSymbol::Struct(structure));
    }
    for (_, structure) in result.structs_in(uri) {
        if let Some(field) = structure
            .fields
            .iter()
            .find(|field| field.definition.identifier.range.contains(position))
        {
            return Some(ResolvedSymbol::Field { structure, field });
        }
    }
    for (_, function) in result.functions_in(uri, ALL_FUNCTION_KINDS) {
        if let Some(parameter) = function
            .parameters
            .iter()
            .find(|parameter| parameter.definition.identifier.range.contains(position))
        {
            return Some(ResolvedSymbol::Parameter {
                function,
                parameter,
            });
        }
    }
    None
}

fn node_hover(node: Node<'_>, snapshot: &Snapshot, info: &mut HoverInfo) {
    if let Node::Expression(expression) = node {
        let prefix = type_prefix(expression.compiled_type.as_ref());
        match &expression.kind {
            ExpressionKind::IntLiteral(value) => {
                info.definition = Some(integer_hover(i64::from(*value), &prefix));
            }
            ExpressionKind::CharLiteral(value) => {
                info.definition = Some(integer_hover(i64::from(u32::from(*value)), &prefix));
            }
            ExpressionKind::FloatLiteral(value) => {
                info.definition = Some(format!("{prefix}{value}"));
            }
            ExpressionKind::BinaryOperator {
                left,
                operator,
                right,
                reference: None,
            } => {
                if let (Some(ty), Some(left), Some(right)) = (
                    expression.compiled_type.as_ref(),
                    left.compiled_type.as_ref(),
                    right.compiled_type.as_ref(),
                ) {
                    info.definition =
                        Some(format!("{ty} {}({left} left, {right} right)", operator.content));
                }
            }
            ExpressionKind::UnaryOperator {
                operator,
                operand,
                reference: None,
            } => {
                if let (Some(ty), Some(value)) =
                    (expression.compiled_type.as_ref(), operand.compiled_type.as_ref())
                {
                    info.definition = Some(format!("{ty} {}({value} value)", operator.content));
                }
            }
            _ => {
                if let Some(ty) = &expression.compiled_type {
                    info.ty = Some(ty.to_string());
                }
            }
        }
    }

    if let Node::Statement(Statement::VariableDefinition(definition)) = node {
        info.definition = Some(variable_hover(definition));
        info.docs = comment_documentation(snapshot.tokens(), definition_start(definition));
    }

    if let Some(symbol) = node
        .reference()
        .and_then(|reference| ResolvedSymbol::resolve(snapshot.result(), reference))
    {
        info.symbol(&symbol, snapshot);
    }
}

fn definition_start(definition: &VariableDefinition) -> SinglePosition {
    definition
        .attributes
        .first()
        .map_or(definition.range.start, |attribute| {
            attribute.range.start.min(definition.range.start)
        })
}

fn variable_hover(definition: &VariableDefinition) -> String {
    let label = if has_modifier(&definition.modifiers, CONST_MODIFIER) {
        "(constant)"
    } else {
        "(variable)"
    };
    let ty = definition
        .compiled_type
        .as_ref()
        .map_or_else(|| definition.type_syntax.to_string(), ToString::to_string);
    format!(
        "{label} {}{ty} {}",
        modifiers_prefix(&definition.modifiers, false),
        definition.identifier.content
    )
}

/// A value in binary, decimal, hexadecimal and, when it is one, as a
/// character.
fn integer_hover(value: i64, prefix: &str) -> String {
    let mut lines = vec![
        format!("{prefix}0b{}", binary_digits(value)),
        format!("{prefix}{value}"),
        format!("{prefix}0x{}", hex_digits(value)),
    ];
    if let Some(character) = u32::try_from(value)
        .ok()
        .filter(|code| *code <= u32::from(u16::MAX))
        .and_then(char::from_u32)
    {
        lines.push(format!("{prefix}'{}'", character.escape_default()));
    }
    lines.join("\n")
}

/// Binary digits of a 32-bit value. Longer than 4 digits, they are padded to
/// whole bytes and each byte is prefixed with `_`.
fn binary_digits(value: i64) -> String {
    let digits = if value < 0 {
        format!("{:b}", value as i32)
    } else {
        format!("{value:b}")
    };
    if digits.len() <= 4 {
        return digits;
    }
    let padded = format!("{}{digits}", "0".repeat((8 - digits.len() % 8) % 8));
    let mut result = String::new();
    for (i, digit) in padded.chars().enumerate() {
        if i % 8 == 0 {
            result.push('_');
        }
        result.push(digit);
    }
    result
}

fn hex_digits(value: i64) -> String {
    if value < 0 {
        format!("{:x}", value as i32)
    } else {
        format!("{value:x}")
    }
}

/// What a written type refers to.
fn type_hover(syntax: &TypeSyntax, ty: &GeneralType) -> Option<String> {
    if !matches!(syntax, TypeSyntax::Simple { .. }) {
        return None;
    }
    match ty {
        GeneralType::Struct(structure) => Some(format!("struct {}", structure.name)),
        GeneralType::Alias(alias) => Some(format!("alias {}", alias.name)),
        GeneralType::Generic(generic) => Some(format!("(generic) {}", generic.identifier)),
        _ => None,
    }
}

/// Comment documentation of a resolved symbol.
pub fn symbol_documentation(symbol: &ResolvedSymbol<'_>, snapshot: &Snapshot) -> Option<String> {
    let anchor = symbol.documentation_anchor()?;
    let tokens = snapshot.tokens_of(&anchor.file)?;
    comment_documentation(tokens, anchor.range.start)
}
