pub mod model;
pub mod routes;
pub mod service;

pub use routes::{ai_routes, routes};
