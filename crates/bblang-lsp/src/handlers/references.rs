//! Find references handler.
//!
//! Lists every use of the function, operator, general function or struct
//! whose name is under the cursor.

use bblang_core::{FunctionKind, ReferenceSite};
use lsp_types::{Location, ReferenceParams};

use super::utils::{from_lsp_position, to_lsp_range, to_lsp_uri};
use crate::snapshot::Snapshot;

/// Handle a find references request.
pub fn handle_references(params: &ReferenceParams, snapshot: &Snapshot) -> Option<Vec<Location>> {
    let position = from_lsp_position(params.text_document_position.position);
    let result = snapshot.result();
    let uri = snapshot.uri();

    let mut sites: Vec<&ReferenceSite> = Vec::new();
    if let Some((_, function)) = result.function_at(
        uri,
        position,
        &[
            FunctionKind::Function,
            FunctionKind::GeneralFunction,
            FunctionKind::Operator,
        ],
    ) {
        sites.extend(distinct_sites(&function.references));
    }
    if let Some((_, structure)) = result.struct_at(uri, position) {
        sites.extend(distinct_sites(&structure.references));
    }

    let locations: Vec<Location> = sites
        .into_iter()
        .filter_map(|site| {
            Some(Location::new(
                to_lsp_uri(site.file.as_ref()?)?,
                to_lsp_range(site.source),
            ))
        })
        .collect();

    tracing::debug!("Found {} references at {}", locations.len(), position);
    Some(locations)
}

/// Sites that name a file, keeping the first of each span.
pub fn distinct_sites(sites: &[ReferenceSite]) -> Vec<&ReferenceSite> {
    let mut result: Vec<&ReferenceSite> = Vec::new();
    for site in sites {
        if site.file.is_none() || result.iter().any(|seen| seen.source == site.source) {
            continue;
        }
        result.push(site);
    }
    result
}
