pub mod docs;
pub mod evaluation;
pub mod export;
pub mod health;
