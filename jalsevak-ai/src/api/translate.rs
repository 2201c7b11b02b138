//! Translation endpoint
//!
//! POST /api/translate accepts either a keyed object or an ordered array of
//! strings and answers in the same shape.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::translation::{TranslationPayload, TranslationReport};
use crate::types::TargetLanguage;
use crate::{ApiResult, AppState};

/// Request body
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Code ("hi") or name ("Hindi"), forwarded as given
    pub target_language: String,
    pub items: TranslationPayload,
}

/// Response body
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub target_language: String,
    /// Same shape and ids as the request's `items`
    pub translations: TranslationPayload,
    pub report: TranslationReport,
}

/// POST /api/translate
///
/// **Errors:**
/// - 400 Bad Request: empty target language
/// - 503 Service Unavailable: provider credential missing
///
/// Provider failures do not fail the request; affected items come back
/// untranslated and are counted in `report.items_fallback`.
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    let target = TargetLanguage::new(request.target_language)?;

    let outcome = state
        .coordinator
        .translate_items(request.items.to_items(), &target, None)
        .await?;

    Ok(Json(TranslateResponse {
        target_language: target.to_string(),
        translations: request.items.with_items(outcome.items),
        report: outcome.report,
    }))
}

/// Build translation routes
pub fn translate_routes() -> Router<AppState> {
    Router::new().route("/api/translate", post(translate))
}
