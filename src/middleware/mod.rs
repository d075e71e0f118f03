pub mod cors;
pub mod json;
pub mod rate_limit;
pub mod session;
