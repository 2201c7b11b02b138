//! Advisory endpoints (crop suggestion, irrigation, soil, schemes)

use axum::{extract::State, routing::post, Json, Router};

use crate::inference::{
    AdvisoryPrompt, CropSuggestionRequest, CropSuggestions, IrrigationSchedule,
    IrrigationScheduleRequest, SchemeList, SchemeLookupRequest, SoilAdvice, SoilAdviceRequest,
};
use crate::{ApiResult, AppState};

async fn run_advisory<P: AdvisoryPrompt>(state: &AppState, request: P) -> ApiResult<Json<P::Output>> {
    Ok(Json(state.advisory.run(&request).await?))
}

/// POST /api/advisory/crops
pub async fn suggest_crops(
    State(state): State<AppState>,
    Json(request): Json<CropSuggestionRequest>,
) -> ApiResult<Json<CropSuggestions>> {
    run_advisory(&state, request).await
}

/// POST /api/advisory/irrigation
pub async fn irrigation_schedule(
    State(state): State<AppState>,
    Json(request): Json<IrrigationScheduleRequest>,
) -> ApiResult<Json<IrrigationSchedule>> {
    run_advisory(&state, request).await
}

/// POST /api/advisory/soil
pub async fn soil_advice(
    State(state): State<AppState>,
    Json(request): Json<SoilAdviceRequest>,
) -> ApiResult<Json<SoilAdvice>> {
    run_advisory(&state, request).await
}

/// POST /api/advisory/schemes
pub async fn lookup_schemes(
    State(state): State<AppState>,
    Json(request): Json<SchemeLookupRequest>,
) -> ApiResult<Json<SchemeList>> {
    run_advisory(&state, request).await
}

/// Build advisory routes
pub fn advisory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advisory/crops", post(suggest_crops))
        .route("/api/advisory/irrigation", post(irrigation_schedule))
        .route("/api/advisory/soil", post(soil_advice))
        .route("/api/advisory/schemes", post(lookup_schemes))
}
