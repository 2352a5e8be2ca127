//! Inlay hints handler.
//!
//! Shows the length the compiler inferred for stack arrays written as
//! `T[]`, with an edit that writes it in.

use bblang_core::TypeSyntax;
use lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, InlayHintParams, TextEdit};

use super::utils::{from_lsp_range, to_lsp_position, to_lsp_range};
use crate::snapshot::Snapshot;

/// Handle an inlay hints request.
pub fn handle_inlay_hints(params: &InlayHintParams, snapshot: &Snapshot) -> Option<Vec<InlayHint>> {
    let requested = from_lsp_range(params.range);

    let mut hints = Vec::new();
    for instance in snapshot.ast().type_instances() {
        if !requested.overlaps(&instance.range()) {
            continue;
        }
        for syntax in instance.descendants() {
            let TypeSyntax::StackArray {
                size: None,
                brackets,
                inferred_length: Some(length),
                ..
            } = syntax
            else {
                continue;
            };
            let at = brackets.open.range.end;
            hints.push(InlayHint {
                position: to_lsp_position(at),
                label: InlayHintLabel::String(length.to_string()),
                kind: Some(InlayHintKind::PARAMETER),
                text_edits: Some(vec![TextEdit {
                    range: to_lsp_range(bblang_core::Range::new(at, at)),
                    new_text: length.to_string(),
                }]),
                tooltip: None,
                padding_left: None,
                padding_right: None,
                data: None,
            });
        }
    }

    Some(hints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Analysis;
    use crate::handlers::fixtures::main_uri;
    use crate::handlers::utils::to_lsp_uri;
    use bblang_core::{
        Brackets, Expression, ExpressionKind, ParserResult, Range, Statement, Token,
        VariableDefinition,
    };
    use lsp_types::TextDocumentIdentifier;
    use std::sync::Arc;

    /// `int[] xs = "ab";`
    fn array_definition(inferred_length: Option<usize>) -> Statement {
        Statement::VariableDefinition(VariableDefinition {
            file: Some(main_uri()),
            attributes: Vec::new(),
            modifiers: Vec::new(),
            type_syntax: TypeSyntax::StackArray {
                of: Box::new(TypeSyntax::simple(Token::identifier("int", Range::on_line(0, 0, 3)))),
                size: None,
                brackets: Brackets {
                    open: Token::operator("[", Range::on_line(0, 3, 4)),
                    close: Token::operator("]", Range::on_line(0, 4, 5)),
                },
                inferred_length,
                range: Range::on_line(0, 0, 5),
            },
            identifier: Token::identifier("xs", Range::on_line(0, 6, 8)),
            initial_value: Some(Expression::new(
                ExpressionKind::StringLiteral("ab".to_string()),
                Range::on_line(0, 11, 15),
            )),
            compiled_type: None,
            range: Range::on_line(0, 0, 16),
        })
    }

    fn hints(statement: Statement, requested: Range) -> Vec<InlayHint> {
        let analysis = Analysis {
            ast: ParserResult {
                top_level_statements: vec![statement],
                ..Default::default()
            },
            ..Default::default()
        };
        let snapshot = Snapshot::new(main_uri(), Some(1), Arc::new(analysis));
        let params = InlayHintParams {
            work_done_progress_params: Default::default(),
            text_document: TextDocumentIdentifier {
                uri: to_lsp_uri(&main_uri()).unwrap(),
            },
            range: to_lsp_range(requested),
        };
        handle_inlay_hints(&params, &snapshot).unwrap()
    }

    #[test]
    fn test_inferred_length_hint() {
        let hints = hints(array_definition(Some(3)), Range::on_line(0, 0, 20));
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].position, lsp_types::Position::new(0, 4));
        match &hints[0].label {
            InlayHintLabel::String(label) => assert_eq!(label, "3"),
            other => panic!("unexpected label {other:?}"),
        }
        let edits = hints[0].text_edits.as_ref().unwrap();
        assert_eq!(edits[0].new_text, "3");
        assert_eq!(edits[0].range.start, edits[0].range.end);
    }

    #[test]
    fn test_no_hint_without_inferred_length() {
        assert!(hints(array_definition(None), Range::on_line(0, 0, 20)).is_empty());
    }

    #[test]
    fn test_hints_outside_requested_range_are_skipped() {
        assert!(hints(array_definition(Some(3)), Range::on_line(5, 0, 10)).is_empty());
    }
}
