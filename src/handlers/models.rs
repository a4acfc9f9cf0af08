//! Model listing endpoint.

use axum::Json;
use axum::extract::State;

use crate::api::ModelsResponse;
use crate::server::AppState;

/// `GET /models`
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.engine.models(),
        default_model: state.default_model.clone(),
    })
}
