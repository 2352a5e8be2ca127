//! Document symbols handler for outline view.
//!
//! Lists functions, operators, general functions and structs declared in
//! the document.

use bblang_core::{FileUri, FunctionKind, Range};
use lsp_types::{
    DocumentSymbolParams, DocumentSymbolResponse, Location, SymbolInformation, SymbolKind, Uri,
};

use super::utils::{to_lsp_range, to_lsp_uri};
use crate::snapshot::Snapshot;

/// Handle a document symbols request.
pub fn handle_document_symbols(
    params: &DocumentSymbolParams,
    snapshot: &Snapshot,
) -> Option<DocumentSymbolResponse> {
    let result = snapshot.result();
    let requested = &params.text_document.uri;
    let uri = snapshot.uri();

    let mut symbols = Vec::new();
    for function in &result.functions {
        if function.kind() == FunctionKind::Constructor {
            continue;
        }
        let definition = &function.definition;
        if let Some(symbol) = symbol(
            definition.name(),
            SymbolKind::FUNCTION,
            definition.file.as_ref(),
            uri,
            requested,
            definition.range,
        ) {
            symbols.push(symbol);
        }
    }
    for structure in &result.structs {
        let definition = &structure.definition;
        if let Some(symbol) = symbol(
            structure.name(),
            SymbolKind::STRUCT,
            definition.file.as_ref(),
            uri,
            requested,
            definition.range,
        ) {
            symbols.push(symbol);
        }
    }

    Some(DocumentSymbolResponse::Flat(symbols))
}

/// A symbol for a declaration in `file`, or `None` when it lives elsewhere.
/// Declarations without a file are listed under the requested document.
#[allow(deprecated)] // SymbolInformation::deprecated field is deprecated but required
fn symbol(
    name: &str,
    kind: SymbolKind,
    file: Option<&FileUri>,
    uri: &FileUri,
    requested: &Uri,
    range: Range,
) -> Option<SymbolInformation> {
    let target = match file {
        Some(file) if file != uri => return None,
        Some(file) => to_lsp_uri(file)?,
        None => requested.clone(),
    };
    Some(SymbolInformation {
        name: name.to_string(),
        kind,
        tags: None,
        deprecated: None,
        location: Location::new(target, to_lsp_range(range)),
        container_name: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Analysis;
    use crate::handlers::fixtures::{self, main_uri};
    use lsp_types::TextDocumentIdentifier;
    use std::sync::Arc;

    fn symbols_for(uri: FileUri) -> Vec<SymbolInformation> {
        let analysis = Analysis {
            version: Some(1),
            tokens: fixtures::tokens(),
            ast: fixtures::ast(),
            result: Arc::new(fixtures::result()),
            extra_directories: Vec::new(),
        };
        let snapshot = Snapshot::new(uri.clone(), Some(1), Arc::new(analysis));
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier {
                uri: to_lsp_uri(&uri).unwrap(),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        match handle_document_symbols(&params, &snapshot) {
            Some(DocumentSymbolResponse::Flat(symbols)) => symbols,
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_functions_and_structs() {
        let symbols = symbols_for(main_uri());
        let summary: Vec<(&str, SymbolKind)> = symbols
            .iter()
            .map(|symbol| (symbol.name.as_str(), symbol.kind))
            .collect();
        assert_eq!(
            summary,
            vec![("add", SymbolKind::FUNCTION), ("Point", SymbolKind::STRUCT)]
        );
        assert_eq!(symbols[0].location.range, to_lsp_range(Range::on_line(1, 0, 46)));
    }

    #[test]
    fn test_declarations_of_other_files_are_skipped() {
        assert!(symbols_for(FileUri::new("file:///project/other.bbc")).is_empty());
    }
}
