pub mod aggregation_service;
pub mod api_client;
pub mod chat_service;
pub mod evaluation_service;
pub mod export_service;
pub mod presenter_service;
pub mod report_layout;
