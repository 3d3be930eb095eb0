//! Free-text prompt and proficiency assessment endpoints

use crate::api::{GatewayJson, method_not_allowed};
use crate::core::error::GatewayResult;
use crate::core::models::{ProficiencyAnalysis, TutorReply};
use crate::core::traits::TutorService;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/claude", post(post_prompt).fallback(method_not_allowed))
        .route("/assess", post(post_assessment).fallback(method_not_allowed))
}

async fn post_prompt(
    Inject(tutor_service): Inject<dyn TutorService>,
    GatewayJson(request): GatewayJson<schemas::PromptRequest>,
) -> GatewayResult<Json<TutorReply>> {
    let prompt = request.prompt.unwrap_or_default();
    tutor_service.reply_to_prompt(&prompt).await.map(Json)
}

async fn post_assessment(
    Inject(tutor_service): Inject<dyn TutorService>,
    GatewayJson(request): GatewayJson<schemas::AssessRequest>,
) -> GatewayResult<Json<ProficiencyAnalysis>> {
    let messages = request.messages.unwrap_or_default();
    let language = request.target_language.unwrap_or_default();
    tutor_service.assess(&messages, language).await.map(Json)
}

pub mod schemas {
    use crate::core::models::Language;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Default)]
    pub struct PromptRequest {
        pub prompt: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct AssessRequest {
        pub messages: Option<Vec<String>>,
        pub target_language: Option<Language>,
    }
}
