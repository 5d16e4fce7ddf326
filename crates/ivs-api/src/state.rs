use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{ApiConfig, ai::AiClient, cache::TokenCache, config::Environment};

/// Token settings shared by the auth handlers and the bearer middleware
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub refresh_token_expiry_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    /// Token deny-list, disabled without `REDIS_URL`
    pub cache: Option<TokenCache>,
    /// LLM provider, disabled without `AI_API_KEY`
    pub ai: Option<AiClient>,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub environment: Environment,
}

impl ApiState {
    /// Build the state from config. Fails when the configured cache cannot be
    /// reached or the AI client cannot be built.
    pub async fn new(config: &ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let cache = match config.redis_url.as_deref() {
            Some(url) => {
                let cache = TokenCache::connect(url)
                    .await
                    .context("failed to connect to Redis")?;
                tracing::info!("Token deny-list enabled");
                Some(cache)
            }
            None => {
                tracing::warn!("REDIS_URL not set, revoked access tokens stay valid until expiry");
                None
            }
        };

        let ai = match config.ai_api_key.clone() {
            Some(api_key) => {
                let client = AiClient::new(
                    api_key,
                    &config.ai_base_url,
                    config.ai_model.clone(),
                    Duration::from_secs(config.ai_timeout_secs),
                )
                .context("failed to build AI client")?;
                tracing::info!(model = %config.ai_model, "AI provider enabled");
                Some(client)
            }
            None => {
                tracing::warn!("AI_API_KEY not set, using the local keyword scorer");
                None
            }
        };

        Ok(Self {
            pool,
            cache,
            ai,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                jwt_expiry_hours: config.jwt_expiry_hours,
                refresh_token_expiry_days: config.refresh_token_expiry_days,
                bcrypt_cost: config.bcrypt_cost,
            },
            upload: UploadConfig {
                dir: config.upload_dir.clone(),
                max_bytes: config.max_upload_bytes,
            },
            environment: config.env,
        })
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<ApiState> for PgPool {
    fn from_ref(state: &ApiState) -> Self {
        state.pool.clone()
    }
}
