//! Code lens handler showing how often each declaration is used.
//!
//! Provides a `{n} reference` lens above:
//! - Functions, operators and general functions (on the name)
//! - Constructors (on the constructed type)
//! - Structs (on the name)

use bblang_core::{FunctionKind, Range, ReferenceSite};
use lsp_types::{CodeLens, CodeLensParams, Command};

use super::references::distinct_sites;
use super::utils::to_lsp_range;
use crate::snapshot::Snapshot;

/// Handle a code lens request.
pub fn handle_code_lens(_params: &CodeLensParams, snapshot: &Snapshot) -> Option<Vec<CodeLens>> {
    let result = snapshot.result();
    let uri = snapshot.uri();

    let mut lenses = Vec::new();
    for function in &result.functions {
        let definition = &function.definition;
        if definition.file.as_ref() != Some(uri) {
            continue;
        }
        let range = match function.kind() {
            FunctionKind::Constructor => definition.return_type.range(),
            _ => definition.identifier.range,
        };
        lenses.push(reference_lens(range, &function.references));
    }
    for (_, structure) in result.structs_in(uri) {
        lenses.push(reference_lens(
            structure.definition.identifier.range,
            &structure.references,
        ));
    }

    Some(lenses)
}

fn reference_lens(range: Range, sites: &[ReferenceSite]) -> CodeLens {
    CodeLens {
        range: to_lsp_range(range),
        command: Some(Command {
            title: format!("{} reference", distinct_sites(sites).len()),
            command: String::new(),
            arguments: None,
        }),
        data: None,
    }
}
