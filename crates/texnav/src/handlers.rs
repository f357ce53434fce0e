//
// handlers.rs
//
// LSP request handlers built on navigation markers
//

use serde_json::json;
use tower_lsp::lsp_types::{
    DocumentLink, GotoDefinitionResponse, Location, Position, Range, Url,
};

use crate::navigation::paths::path_to_uri;
use crate::navigation::NavigationMarker;
use crate::state::WorldState;

fn range_contains(range: &Range, position: Position) -> bool {
    (range.start.line, range.start.character) <= (position.line, position.character)
        && (position.line, position.character) <= (range.end.line, range.end.character)
}

pub fn marker_to_link(marker: &NavigationMarker) -> Option<DocumentLink> {
    let target = path_to_uri(&marker.target)?;
    Some(DocumentLink {
        range: marker.argument_range,
        target: Some(target),
        tooltip: Some(marker.tooltip.clone()),
        data: Some(json!({ "icon": marker.icon })),
    })
}

pub fn document_link(state: &WorldState, uri: &Url) -> Option<Vec<DocumentLink>> {
    let markers = state.markers_for(uri)?;
    log::trace!("{} document link(s) for {}", markers.len(), uri);
    Some(markers.iter().filter_map(marker_to_link).collect())
}

pub fn goto_definition(
    state: &WorldState,
    uri: &Url,
    position: Position,
) -> Option<GotoDefinitionResponse> {
    let markers = state.markers_for(uri)?;
    let marker = markers
        .iter()
        .find(|m| range_contains(&m.origin, position))?;
    let target = path_to_uri(&marker.target)?;
    Some(GotoDefinitionResponse::Scalar(Location {
        uri: target,
        range: Range::new(Position::new(0, 0), Position::new(0, 0)),
    }))
}
