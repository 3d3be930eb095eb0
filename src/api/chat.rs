//! Chat endpoint

use crate::api::{GatewayJson, method_not_allowed};
use crate::core::error::GatewayResult;
use crate::core::models::TutorReply;
use crate::core::traits::TutorService;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;
use log::debug;

pub fn router() -> Router {
    Router::new().route("/chat", post(post_chat).fallback(method_not_allowed))
}

async fn post_chat(
    Inject(tutor_service): Inject<dyn TutorService>,
    GatewayJson(request): GatewayJson<schemas::ChatRequest>,
) -> GatewayResult<Json<TutorReply>> {
    let history = request.conversation_history.unwrap_or_default();
    let options = request.user_profile.unwrap_or_default();
    let goals = request.learning_goals.unwrap_or_default();
    let message = request.message.unwrap_or_default();

    debug!(
        "chat request: {} history entries, language {}",
        history.len(),
        options.selected_language.key()
    );

    tutor_service
        .reply_to_message(&message, &history, &options, &goals)
        .await
        .map(Json)
}

pub mod schemas {
    use crate::core::models::{HistoryEntry, TutorOptions};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Default, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct ChatRequest {
        pub message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub conversation_history: Option<Vec<HistoryEntry>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user_profile: Option<TutorOptions>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub learning_goals: Option<Vec<String>>,
    }
}
