pub mod ai;
pub mod answer;
pub mod auth;
pub mod cache;
pub mod config;
pub mod docs;
pub mod error;
pub mod export;
pub mod extract;
pub mod favorite;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod mistake;
pub mod mock_interview;
pub mod practice_set;
pub mod question;
pub mod response;
pub mod router;
pub mod state;
pub mod statistics;
pub mod tracing;
pub mod upload;
pub mod v1;
pub mod validation;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig, UploadConfig};
