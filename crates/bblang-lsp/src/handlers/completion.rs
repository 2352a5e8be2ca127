//! Completion handler for autocompletion.
//!
//! What is offered depends on where the cursor is:
//! - Attribute names: the builtin attributes
//! - `using` paths: folders and source files next to each candidate
//! - After `.`: fields and extension functions of the object's type
//! - After `new`: types
//! - Anywhere else: functions, globals, parameters, types and keywords

use bblang_core::keywords::{
    type_keywords, ATTRIBUTES, DECLARATION_KEYWORDS, MODIFIER_KEYWORDS, PROTECTION_KEYWORDS,
    SOURCE_EXTENSION, STATEMENT_KEYWORDS,
};
use bblang_core::walk::{self, Node};
use bblang_core::{
    Accessible, CompiledFunction, ExpressionKind, FunctionKind, GeneralType, SinglePosition,
    Statement,
};
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, CompletionParams,
    CompletionResponse,
};
use std::collections::BTreeMap;

use super::utils::from_lsp_position;
use crate::query::statement_at;
use crate::snapshot::Snapshot;

/// Handle a completion request.
pub fn handle_completion(params: &CompletionParams, snapshot: &Snapshot) -> Option<CompletionResponse> {
    let position = from_lsp_position(params.text_document_position.position);

    tracing::debug!(
        "Completion {}",
        params.context.as_ref().map_or_else(
            || "null".to_string(),
            |context| format!("{:?} {:?}", context.trigger_kind, context.trigger_character)
        )
    );

    Some(CompletionResponse::Array(completions_at(snapshot, position)))
}

/// Every completion item for `position`.
pub fn completions_at(snapshot: &Snapshot, position: SinglePosition) -> Vec<CompletionItem> {
    if let Some(items) = attribute_completions(snapshot, position) {
        return items;
    }
    if let Some(items) = using_completions(snapshot, position) {
        return items;
    }

    if let Some(statement) = statement_at(snapshot.ast(), position) {
        for node in walk::descendants(statement) {
            if !node.range().contains(position) {
                continue;
            }
            let Node::Expression(expression) = node else {
                continue;
            };
            match &expression.kind {
                ExpressionKind::Field {
                    object, identifier, ..
                } if identifier.range.contains(position) => match &object.compiled_type {
                    Some(ty) => return member_completions(snapshot, ty),
                    None => tracing::warn!("Missing type on field access object at {}", object.range),
                },
                ExpressionKind::NewInstance { type_syntax, .. }
                    if type_syntax.range().contains(position) =>
                {
                    let mut items = Vec::new();
                    add_type_items(snapshot, &mut items);
                    return items;
                }
                ExpressionKind::Missing => {
                    let mut items = Vec::new();
                    add_expression_items(snapshot, position, &mut items);
                    return items;
                }
                _ => {}
            }
        }
    }

    let mut items = Vec::new();
    add_expression_items(snapshot, position, &mut items);
    add_type_items(snapshot, &mut items);
    for keywords in [
        DECLARATION_KEYWORDS,
        PROTECTION_KEYWORDS,
        MODIFIER_KEYWORDS,
        STATEMENT_KEYWORDS,
    ] {
        items.extend(keywords.iter().map(|keyword| item(keyword, CompletionItemKind::KEYWORD)));
    }
    items
}

fn item(label: &str, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        ..Default::default()
    }
}

fn with_description(mut item: CompletionItem, description: Option<String>) -> CompletionItem {
    item.label_details = Some(CompletionItemLabelDetails {
        detail: None,
        description,
    });
    item
}

/// `Some` when the cursor is on an attribute: names on its identifier,
/// nothing inside its brackets.
fn attribute_completions(snapshot: &Snapshot, position: SinglePosition) -> Option<Vec<CompletionItem>> {
    let ast = snapshot.ast();
    let statement_attributes = ast.statements().into_iter().filter_map(|statement| match statement {
        Statement::VariableDefinition(definition) => Some(&definition.attributes),
        _ => None,
    });
    let attributes = ast
        .aliases
        .iter()
        .map(|alias| &alias.attributes)
        .chain(ast.structs.iter().map(|structure| &structure.attributes))
        .chain(ast.functions.iter().map(|function| &function.attributes))
        .chain(statement_attributes)
        .flatten();

    for attribute in attributes {
        if attribute.identifier.range.contains(position) {
            return Some(
                ATTRIBUTES
                    .iter()
                    .map(|(name, _)| item(name, CompletionItemKind::CLASS))
                    .collect(),
            );
        }
        if attribute
            .brackets
            .as_ref()
            .is_some_and(|brackets| brackets.range().contains(position))
        {
            return Some(Vec::new());
        }
    }
    None
}

/// `Some` when the cursor is on the path of a `using`.
fn using_completions(snapshot: &Snapshot, position: SinglePosition) -> Option<Vec<CompletionItem>> {
    let using = snapshot
        .ast()
        .usings
        .iter()
        .find(|using| using.range.contains(position) && position > using.keyword.range.end)?;

    let suffix = format!(".{SOURCE_EXTENSION}");
    let mut items = Vec::new();
    for candidate in snapshot.using_candidates(&using.path_string()) {
        let Some(directory) = candidate
            .to_file_path()
            .and_then(|path| path.parent().map(std::path::Path::to_path_buf))
        else {
            continue;
        };
        let entries = match std::fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot list {}: {}", directory.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if path.is_dir() {
                items.push(item(name, CompletionItemKind::FOLDER));
            } else if let Some(stem) = name.strip_suffix(&suffix) {
                items.push(item(stem, CompletionItemKind::FILE));
            }
        }
    }
    Some(items)
}

/// Fields and extension functions for an object of type `object`.
fn member_completions(snapshot: &Snapshot, object: &GeneralType) -> Vec<CompletionItem> {
    let result = snapshot.result();
    let uri = snapshot.uri();

    let mut check_types = vec![GeneralType::pointer(object.clone()), object.clone()];
    let mut current = object;
    while let Some(to) = current.as_pointer() {
        check_types.push(to.clone());
        current = to;
    }

    let mut items = Vec::new();
    let mut overloads: BTreeMap<&str, Vec<(&CompiledFunction, Option<&[(String, GeneralType)]>)>> =
        BTreeMap::new();

    for check_type in &check_types {
        let struct_type = check_type.as_struct();

        if let Some(struct_type) = struct_type {
            let fields = result
                .structs
                .get(struct_type.index)
                .map_or(&[][..], |structure| structure.fields.as_slice());
            for field in fields {
                items.push(with_description(
                    item(&field.definition.identifier.content, CompletionItemKind::FIELD),
                    Some(field.ty.substitute(&struct_type.type_arguments).to_string()),
                ));
            }
        }

        for function in &result.functions {
            if function.kind() != FunctionKind::Function || !function.can_use(uri) {
                continue;
            }
            let Some(this) = function.parameters.first() else {
                continue;
            };
            if !this.definition.is_this() || !this.ty.same_as(check_type) {
                continue;
            }
            let type_arguments = struct_type
                .filter(|ty| function.definition.context.as_deref() == Some(ty.name.as_str()))
                .map(|ty| ty.type_arguments.as_slice());
            overloads
                .entry(function.name())
                .or_default()
                .push((function, type_arguments));
        }
    }

    for (name, overloads) in overloads {
        let description = match overloads.as_slice() {
            [] => None,
            [(function, type_arguments)] => Some(match type_arguments {
                Some(arguments) => function.return_type.substitute(arguments).to_string(),
                None => function.return_type.to_string(),
            }),
            _ => Some(format!("{} overloads", overloads.len())),
        };
        items.push(with_description(item(name, CompletionItemKind::FUNCTION), description));
    }

    items
}

fn add_type_items(snapshot: &Snapshot, items: &mut Vec<CompletionItem>) {
    let result = snapshot.result();
    let uri = snapshot.uri();

    for structure in result.structs.iter().filter(|structure| structure.can_use(uri)) {
        items.push(item(structure.name(), CompletionItemKind::STRUCT));
    }
    for alias in result.aliases.iter().filter(|alias| alias.can_use(uri)) {
        let mut alias_item = item(&alias.definition.identifier.content, CompletionItemKind::CLASS);
        alias_item.label_details = Some(CompletionItemLabelDetails {
            detail: Some(format!(" = {}", alias.value)),
            description: None,
        });
        items.push(alias_item);
    }
    items.extend(type_keywords().map(|keyword| item(keyword, CompletionItemKind::KEYWORD)));
}

fn add_expression_items(snapshot: &Snapshot, position: SinglePosition, items: &mut Vec<CompletionItem>) {
    let result = snapshot.result();
    let uri = snapshot.uri();

    let mut overloads: BTreeMap<&str, Vec<&CompiledFunction>> = BTreeMap::new();
    for function in &result.functions {
        if function.kind() == FunctionKind::Function && function.can_use(uri) {
            overloads.entry(function.name()).or_default().push(function);
        }
    }
    for (name, overloads) in overloads {
        let description = match overloads.as_slice() {
            [] => None,
            [function] => Some(function.return_type.to_string()),
            _ => Some(format!("{} overloads", overloads.len())),
        };
        items.push(with_description(item(name, CompletionItemKind::FUNCTION), description));
    }

    for (_, statement) in result.raw_statements() {
        let Statement::VariableDefinition(definition) = statement else {
            continue;
        };
        if !definition.can_use(uri) {
            continue;
        }
        let kind = if definition.is_constant() {
            CompletionItemKind::CONSTANT
        } else {
            CompletionItemKind::VARIABLE
        };
        items.push(item(&definition.identifier.content, kind));
    }

    let enclosing = result
        .functions_in(uri, &[FunctionKind::Function])
        .into_iter()
        .find(|(_, function)| {
            function
                .definition
                .block
                .as_ref()
                .is_some_and(|block| block.range.contains(position))
        });
    if let Some((_, function)) = enclosing {
        for parameter in &function.parameters {
            items.push(with_description(
                item(&parameter.definition.identifier.content, CompletionItemKind::VARIABLE),
                Some(parameter.ty.to_string()),
            ));
        }
    }
}
