pub mod answer;
pub mod evaluation;
pub mod message;
pub mod question;
pub mod socket_event;
pub mod summary;
