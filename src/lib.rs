pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::services::{api_client::ApiClient, evaluation_service::EvaluationService};

#[derive(Clone)]
pub struct AppState {
    pub evaluation_service: EvaluationService,
    pub report_title: String,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let api_client = ApiClient::new(
            http_client,
            config.api_base_url.clone(),
            config.api_service_token.clone(),
            config.tunnel_bypass_header.clone(),
        );
        let evaluation_service =
            EvaluationService::new(api_client, config.remarks_question_ids.clone());

        Ok(Self {
            evaluation_service,
            report_title: config.report_title.clone(),
        })
    }
}

pub fn build_router(state: AppState, public_rps: u32) -> Router {
    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/openapi.json", get(routes::docs::openapi_json));

    let evaluation_api = Router::new()
        .route(
            "/api/evaluations",
            post(routes::evaluation::create_evaluation),
        )
        .route(
            "/api/evaluations/:id",
            get(routes::evaluation::get_evaluation),
        )
        .route(
            "/api/evaluations/:id/summary",
            get(routes::evaluation::get_summary),
        )
        .route(
            "/api/evaluations/:id/view",
            get(routes::evaluation::get_summary_view),
        )
        .route(
            "/api/evaluations/:id/answers",
            post(routes::evaluation::submit_answers),
        )
        .route(
            "/api/evaluations/:id/export/:format",
            get(routes::export::export_evaluation),
        )
        .route(
            "/api/reports/:format",
            post(routes::export::export_report),
        )
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::RateLimiter::new(public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    base_routes
        .merge(evaluation_api)
        .with_state(state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
}
