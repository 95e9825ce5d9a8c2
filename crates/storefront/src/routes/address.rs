//! Address lookup endpoints used by the checkout address field.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tienda_core::AddressResult;

use crate::geocoding::{AddressSelection, Resolution};
use crate::state::AppState;

/// Body of `POST /api/address/resolve`: a tagged selection or bare `{query}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResolveRequest {
    Selection(AddressSelection),
    Query { query: String },
}

impl From<ResolveRequest> for AddressSelection {
    fn from(request: ResolveRequest) -> Self {
        match request {
            ResolveRequest::Selection(selection) => selection,
            ResolveRequest::Query { query } => Self::Text { query },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
    pub address: Option<AddressResult>,
    pub raw: String,
}

impl From<Resolution> for ResolveResponse {
    fn from(resolution: Resolution) -> Self {
        let raw = resolution.display_text().to_owned();
        match resolution {
            Resolution::Resolved(address) => Self {
                resolved: true,
                address: Some(address),
                raw,
            },
            Resolution::Unresolved(_) => Self {
                resolved: false,
                address: None,
                raw,
            },
        }
    }
}

/// `POST /api/address/resolve`
///
/// Always 200: an address no provider understands comes back with
/// `resolved: false` and the raw text.
#[instrument(skip(state))]
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let selection = AddressSelection::from(request);
    let resolution = state.pipeline().resolver().resolve(&selection).await;
    Json(resolution.into())
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/address/suggest?q=`
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<AddressResult>> {
    Json(state.pipeline().resolver().suggest(&query.q).await)
}
