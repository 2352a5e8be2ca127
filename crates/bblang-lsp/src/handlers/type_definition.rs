//! Go-to-type-definition handler.
//!
//! Narrows the written type under the cursor and jumps to the struct,
//! template parameter or alias it names.

use bblang_core::{GeneralType, Location, TypeSyntax};
use lsp_types::request::{GotoTypeDefinitionParams, GotoTypeDefinitionResponse};

use super::utils::{from_lsp_position, to_location_link};
use crate::query::type_instance_at;
use crate::snapshot::Snapshot;

/// Handle a go-to-type-definition request.
pub fn handle_goto_type_definition(
    params: &GotoTypeDefinitionParams,
    snapshot: &Snapshot,
) -> Option<GotoTypeDefinitionResponse> {
    let position = from_lsp_position(params.text_document_position_params.position);
    let result = snapshot.result();

    let mut links = Vec::new();
    if let Some((syntax, ty)) = type_instance_at(result, snapshot.ast(), snapshot.uri(), position) {
        let origin = match syntax {
            TypeSyntax::Simple { identifier, .. } => identifier.range,
            _ => syntax.range(),
        };
        if let Some(link) = type_location(snapshot, ty).and_then(|target| to_location_link(origin, &target)) {
            links.push(link);
        }
    }

    Some(GotoTypeDefinitionResponse::Link(links))
}

fn type_location(snapshot: &Snapshot, ty: &GeneralType) -> Option<Location> {
    if let Some(struct_type) = ty.as_struct() {
        let definition = &snapshot.result().structs.get(struct_type.index)?.definition;
        return Some(Location::new(definition.file.clone()?, definition.identifier.range));
    }
    match ty {
        GeneralType::Generic(generic) => generic.definition.clone(),
        GeneralType::Alias(alias) => alias.definition.clone(),
        _ => None,
    }
}
