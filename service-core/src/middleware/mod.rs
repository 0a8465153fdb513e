pub mod allowed_hosts;
pub mod metrics;
pub mod security_headers;
pub mod tracing;
