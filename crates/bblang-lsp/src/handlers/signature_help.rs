//! Signature help handler.
//!
//! Lists the overloads a call could resolve to while the cursor is inside
//! its argument list, with the resolved overload and the argument under the
//! cursor highlighted.

use bblang_core::walk::{self, Node};
use bblang_core::{
    Accessible, CompiledFunction, ExpressionKind, GeneralType, Reference, SinglePosition,
    Statement, Token, TypeSyntax,
};
use lsp_types::{
    Documentation, MarkupContent, MarkupKind, ParameterInformation, ParameterLabel,
    SignatureHelp, SignatureHelpParams, SignatureInformation,
};

use super::hover::symbol_documentation;
use super::utils::{from_lsp_position, utf16_len};
use crate::query::ResolvedSymbol;
use crate::snapshot::Snapshot;

/// The call the cursor is in.
struct CallSite<'a> {
    name: &'a str,
    /// `Some` for method calls, holding the receiver's type when known.
    receiver: Option<Option<&'a GeneralType>>,
    argument_count: usize,
    commas: &'a [Token],
    resolved: Option<usize>,
}

/// Handle a signature help request.
pub fn handle_signature_help(params: &SignatureHelpParams, snapshot: &Snapshot) -> Option<SignatureHelp> {
    let position = from_lsp_position(params.text_document_position_params.position);

    let Some(call) = call_at(snapshot, position) else {
        tracing::debug!("No call at {}", position);
        return None;
    };

    let active_parameter = call
        .commas
        .iter()
        .filter(|comma| position >= comma.range.end)
        .count() as u32;

    let candidates = candidates(snapshot, &call);
    let active_signature = call.resolved.and_then(|resolved| {
        candidates
            .iter()
            .position(|(index, _)| *index == resolved)
            .map(|position| position as u32)
    });

    let signatures = candidates
        .iter()
        .map(|(_, function)| signature(function, active_parameter, snapshot))
        .collect();

    Some(SignatureHelp {
        signatures,
        active_signature,
        active_parameter: Some(active_parameter),
    })
}

/// The innermost call whose argument brackets contain `position`.
///
/// A variable declared with a function type counts as a call to the
/// function named by its return type while the cursor is in its brackets.
fn call_at(snapshot: &Snapshot, position: SinglePosition) -> Option<CallSite<'_>> {
    let ast = snapshot.ast();
    let roots = ast.top_level_statements.iter().chain(
        ast.functions
            .iter()
            .filter_map(|function| function.block.as_ref())
            .flat_map(|block| &block.statements),
    );

    let mut found = None;
    for root in roots {
        for node in walk::descendants(root) {
            match node {
                Node::Expression(expression) => {
                    let ExpressionKind::Call {
                        callee,
                        arguments,
                        reference,
                    } = &expression.kind
                    else {
                        continue;
                    };
                    if !arguments.brackets.range().contains(position) {
                        continue;
                    }
                    let (name, receiver) = match &callee.kind {
                        ExpressionKind::Identifier { identifier, .. } => (identifier, None),
                        ExpressionKind::Field {
                            object, identifier, ..
                        } => (identifier, Some(object.compiled_type.as_ref())),
                        _ => {
                            tracing::warn!("Invalid call {}", expression.range);
                            continue;
                        }
                    };
                    let resolved = match reference {
                        Some(Reference::Function { index, .. }) => Some(*index),
                        _ => None,
                    };
                    found = Some(CallSite {
                        name: &name.content,
                        argument_count: arguments.arguments.len() + usize::from(receiver.is_some()),
                        receiver,
                        commas: &arguments.commas,
                        resolved,
                    });
                }
                Node::Statement(Statement::VariableDefinition(definition)) => {
                    let TypeSyntax::Function {
                        return_type,
                        brackets,
                        ..
                    } = &definition.type_syntax
                    else {
                        continue;
                    };
                    let TypeSyntax::Simple {
                        identifier,
                        type_arguments: None,
                        ..
                    } = return_type.as_ref()
                    else {
                        continue;
                    };
                    if !brackets.range().contains(position) {
                        continue;
                    }
                    tracing::debug!("Treating {} as a call to {}", definition.type_syntax, identifier.content);
                    found = Some(CallSite {
                        name: &identifier.content,
                        receiver: None,
                        argument_count: 0,
                        commas: &[],
                        resolved: None,
                    });
                }
                Node::Statement(_) => {}
            }
        }
    }
    found
}

/// Overloads `call` could resolve to, with their indices.
fn candidates<'a>(snapshot: &'a Snapshot, call: &CallSite<'_>) -> Vec<(usize, &'a CompiledFunction)> {
    let uri = snapshot.uri();
    snapshot
        .result()
        .functions
        .iter()
        .enumerate()
        .filter(|(_, function)| {
            function.name() == call.name
                && function.can_use(uri)
                && call.argument_count <= function.parameters.len()
        })
        .filter(|(_, function)| match call.receiver {
            None => true,
            Some(None) => {
                tracing::warn!("Method call receiver has no type");
                function.is_extension()
            }
            Some(Some(receiver)) => {
                function.is_extension()
                    && function.parameters.first().is_some_and(|this| {
                        this.ty.same_as(receiver)
                            || this.ty.same_as(&GeneralType::pointer(receiver.clone()))
                    })
            }
        })
        .collect()
}

fn signature(function: &CompiledFunction, active_parameter: u32, snapshot: &Snapshot) -> SignatureInformation {
    let definition = &function.definition;
    let mut label = format!("{} ", function.return_type);

    if function.is_extension() {
        if let Some(this) = function.parameters.first() {
            label.push_str(&format!("{}.", this.ty));
        }
    }
    label.push_str(definition.name());
    if let Some(template) = &definition.template {
        let names: Vec<&str> = template.iter().map(|token| token.content.as_str()).collect();
        label.push_str(&format!("<{}>", names.join(", ")));
    }

    label.push('(');
    let mut parameters = Vec::new();
    let mut first = true;
    for parameter in &function.parameters {
        if parameter.definition.is_this() {
            continue;
        }
        if !first {
            label.push_str(", ");
        }
        first = false;
        if parameter.definition.is_ref() {
            label.push_str("ref ");
        }
        label.push_str(&format!("{} ", parameter.ty));
        let name = &parameter.definition.identifier.content;
        let start = utf16_len(&label);
        parameters.push(ParameterInformation {
            label: ParameterLabel::LabelOffsets([start, start + utf16_len(name)]),
            documentation: None,
        });
        label.push_str(name);
    }
    label.push(')');

    let symbol = ResolvedSymbol::Function {
        function,
        type_arguments: None,
    };
    let documentation = symbol_documentation(&symbol, snapshot).map(|docs| {
        Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: docs,
        })
    });

    SignatureInformation {
        label,
        documentation,
        parameters: Some(parameters),
        active_parameter: ((active_parameter as usize) < function.parameters.len())
            .then_some(active_parameter),
    }
}
