//! Go-to-definition handler.
//!
//! Provides navigation to:
//! - `using` paths → the file the compiler resolved
//! - Any resolved reference → the identifier of its declaration

use bblang_core::{Location, Range, SinglePosition};
use lsp_types::{GotoDefinitionParams, GotoDefinitionResponse, LocationLink};

use super::utils::{from_lsp_position, to_location_link};
use crate::query::{interactive_range, reference_at, ResolvedSymbol};
use crate::snapshot::Snapshot;

/// Handle a go-to-definition request.
pub fn handle_goto_definition(
    params: &GotoDefinitionParams,
    snapshot: &Snapshot,
) -> Option<GotoDefinitionResponse> {
    let position = from_lsp_position(params.text_document_position_params.position);

    let mut links = Vec::new();
    if let Some(link) = using_link(snapshot, position) {
        links.push(link);
    }
    if let Some(link) = reference_link(snapshot, position) {
        links.push(link);
    }

    tracing::debug!("Go-to-definition at {}: {} link(s)", position, links.len());
    Some(GotoDefinitionResponse::Link(links))
}

fn using_link(snapshot: &Snapshot, position: SinglePosition) -> Option<LocationLink> {
    let using = snapshot
        .ast()
        .usings
        .iter()
        .find(|using| using.range.contains(position))?;
    let target = using.compiled_uri.as_ref()?;
    let origin = using.path_range().unwrap_or(using.keyword.range);
    to_location_link(origin, &Location::new(target.clone(), Range::default()))
}

fn reference_link(snapshot: &Snapshot, position: SinglePosition) -> Option<LocationLink> {
    let (node, reference) = reference_at(snapshot.ast(), position)?;
    let symbol = ResolvedSymbol::resolve(snapshot.result(), reference)?;
    let target = symbol.definition()?;
    to_location_link(interactive_range(node), &target)
}
