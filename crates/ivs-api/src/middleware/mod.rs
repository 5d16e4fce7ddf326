pub mod cors;
pub mod rate_limit;
pub mod recovery;
pub mod request_id;
pub mod security_headers;
