use axum::{Router, middleware::from_fn_with_state};

use crate::{
    answer, auth,
    auth::middleware::require_auth,
    favorite,
    middleware::rate_limit::{self, AI_BURST_SIZE, AI_REPLENISH_MS},
    mistake, mock_interview, practice_set, question,
    state::ApiState,
    statistics, upload,
};

/// V1 API routes. Everything except the credential endpoints requires a
/// bearer token.
pub fn routes(state: ApiState) -> Router<ApiState> {
    // One bucket per client across every AI backed route
    let ai_routes = rate_limit::limit(
        Router::new()
            .merge(question::ai_routes(&state))
            .merge(answer::ai_routes())
            .merge(mock_interview::ai_routes()),
        AI_REPLENISH_MS,
        AI_BURST_SIZE,
    );

    let protected = Router::new()
        .merge(question::routes())
        .merge(answer::routes())
        .merge(favorite::routes())
        .merge(mistake::routes())
        .merge(practice_set::routes())
        .merge(mock_interview::routes())
        .merge(upload::routes(&state))
        .merge(statistics::routes())
        .merge(ai_routes)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(auth::routes(state)).merge(protected)
}
