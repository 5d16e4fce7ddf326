pub mod client;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod refresh_token;
pub mod routes;
pub mod service;

pub use middleware::AuthUser;
pub use routes::routes;
