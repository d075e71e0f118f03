use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::middleware::session::SessionContext;
use crate::models::answer::Answer;
use crate::models::evaluation::{EvaluationSession, NewEvaluationSession};
use crate::models::question::Question;
use crate::models::summary::SummaryDocument;

/// Thin client for the remote HRMS JSON API.
///
/// Every call takes the caller's [`SessionContext`]; the client itself holds
/// no credentials beyond the configured fallback service token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    service_token: Option<String>,
    bypass_header: Option<(String, String)>,
}

impl ApiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        service_token: Option<String>,
        bypass_header: Option<(String, String)>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_token,
            bypass_header,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, ctx: &SessionContext, builder: RequestBuilder) -> RequestBuilder {
        let mut builder = builder;
        if let Some(token) = ctx.bearer_token().or(self.service_token.as_deref()) {
            builder = builder.bearer_auth(token);
        }
        if let Some((name, value)) = &self.bypass_header {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    async fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{} not found", what)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET upstream");
        let response = self
            .prepare(ctx, self.client.get(&url).query(query))
            .send()
            .await?;
        let response = Self::check(response, what).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST upstream");
        let response = self
            .prepare(ctx, self.client.post(&url).json(body))
            .send()
            .await?;
        let response = Self::check(response, what).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn fetch_session(&self, ctx: &SessionContext, id: i64) -> Result<EvaluationSession> {
        self.get_json(ctx, &format!("/evaluation/{}", id), &[], "Evaluation")
            .await
    }

    pub async fn fetch_summary_document(
        &self,
        ctx: &SessionContext,
        id: i64,
    ) -> Result<SummaryDocument> {
        self.get_json(
            ctx,
            &format!("/evaluation/{}/summary", id),
            &[],
            "Evaluation summary",
        )
        .await
    }

    pub async fn fetch_questions(&self, ctx: &SessionContext) -> Result<Vec<Question>> {
        self.get_json(ctx, "/evaluation_questions", &[], "Evaluation questions")
            .await
    }

    pub async fn fetch_answers(&self, ctx: &SessionContext, evaluation_id: i64) -> Result<Vec<Answer>> {
        self.get_json(
            ctx,
            "/evaluation_answers",
            &[("evaluation_id", evaluation_id.to_string())],
            "Evaluation answers",
        )
        .await
    }

    pub async fn create_answers(&self, ctx: &SessionContext, answers: &[Answer]) -> Result<Vec<Answer>> {
        self.post_json(ctx, "/evaluation_answers", answers, "Evaluation answers")
            .await
    }

    pub async fn create_session(
        &self,
        ctx: &SessionContext,
        session: &NewEvaluationSession,
    ) -> Result<EvaluationSession> {
        self.post_json(ctx, "/evaluation", session, "Evaluation").await
    }
}
