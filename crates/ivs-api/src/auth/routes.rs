use axum::{
    Router,
    body::Bytes,
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use super::{
    client::ClientInfo,
    middleware::{AuthUser, require_auth},
    models::{
        AuthResponse, LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest,
        RegisterRequest, TokenPair, UserResponse,
    },
    service,
};
use crate::{
    ApiState,
    error::ApiError,
    extract::AppJson,
    middleware::rate_limit::{self, AUTH_BURST_SIZE, AUTH_REPLENISH_MS},
    response::ApiResponse,
};

pub fn routes(state: ApiState) -> Router<ApiState> {
    // Credential endpoints, limited per client IP
    let public_routes = rate_limit::limit(
        Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh)),
        AUTH_REPLENISH_MS,
        AUTH_BURST_SIZE,
    );

    let protected_routes = Router::new()
        .route("/auth/profile", get(profile))
        .route("/auth/logout", post(logout))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid username, email or password"),
        (status = 409, description = "Email or username already taken"),
    )
)]
pub async fn register(
    State(state): State<ApiState>,
    ClientInfo(device): ClientInfo,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let response = service::register(&state, request, &device).await?;
    Ok(ApiResponse::created(response).with_message("User registered successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(state): State<ApiState>,
    ClientInfo(device): ClientInfo,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let response = service::login(&state, request, &device).await?;
    Ok(ApiResponse::ok(response).with_message("Login successful"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPair),
        (status = 401, description = "Unknown or expired refresh token"),
    )
)]
pub async fn refresh(
    State(state): State<ApiState>,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<ApiResponse<TokenPair>, ApiError> {
    let tokens = service::refresh(&state, request).await?;
    Ok(ApiResponse::ok(tokens).with_message("Token refreshed successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn profile(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = service::profile(&state, auth_user.user_id).await?;
    Ok(ApiResponse::ok(user))
}

/// The body is optional, so it is read as bytes rather than through `AppJson`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    request_body(content = LogoutRequest, description = "Optional"),
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<ApiResponse<LogoutResponse>, ApiError> {
    let request = parse_logout_body(&body)?;
    let response = service::logout(&state, &auth_user, request).await?;
    Ok(ApiResponse::ok(response).with_message("Logged out successfully"))
}

fn parse_logout_body(body: &[u8]) -> Result<LogoutRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogoutRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_logout_body() {
        let empty = parse_logout_body(b"").expect("empty body is accepted");
        assert!(empty.refresh_token.is_none());
        assert!(!empty.all_devices);

        let all = parse_logout_body(br#"{"allDevices":true}"#).expect("valid body");
        assert!(all.all_devices);

        assert!(matches!(
            parse_logout_body(b"{not json"),
            Err(ApiError::Validation(_))
        ));
    }
}
