pub mod math;
pub mod serde_ext;
pub mod time;
