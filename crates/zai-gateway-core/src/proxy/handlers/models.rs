// OpenAI models listing
use axum::extract::State;
use axum::Json;
use zai_gateway_types::protocol::{ModelCard, ModelList};

use crate::proxy::server::AppState;
use crate::proxy::transformer::MODEL_OWNER;

pub async fn handle_list_models(State(state): State<AppState>) -> Json<ModelList> {
    let created = chrono::Utc::now().timestamp();
    let data = state
        .config
        .models
        .aliases()
        .into_iter()
        .map(|id| ModelCard {
            id: id.to_string(),
            object: "model".to_string(),
            created,
            owned_by: MODEL_OWNER.to_string(),
        })
        .collect();

    Json(ModelList { object: "list".to_string(), data })
}
