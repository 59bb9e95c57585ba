use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::ApiError,
    models::{ListQuery, Movie, MovieDraft},
    sequence::SequenceGate,
};

const COLLECTION: &str = "Movies";

pub struct MovieApi {
    client: reqwest::Client,
    base_url: String,
}

impl MovieApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Movie>, ApiError> {
        let req = self.request(Method::GET, self.collection_url()).query(&query.pairs());
        Ok(self.send::<Vec<Movie>>(req).await?.unwrap_or_default())
    }

    // None when a newer sequence reached the gate first.
    pub async fn list_latest(
        &self,
        gate: &SequenceGate,
        seq: u64,
        query: &ListQuery,
    ) -> Result<Option<Vec<Movie>>, ApiError> {
        if !gate.register(seq) {
            debug!(seq, "skipping superseded list request");
            return Ok(None);
        }
        let result = self.list(query).await;
        if !gate.is_current(seq) {
            debug!(seq, "discarding stale list response");
            return Ok(None);
        }
        result.map(Some)
    }

    pub async fn get(&self, id: i64) -> Result<Movie, ApiError> {
        let req = self.request(Method::GET, self.item_url(id)?);
        self.send(req).await?.ok_or(ApiError::EmptyBody)
    }

    pub async fn create(&self, draft: &MovieDraft) -> Result<Option<Movie>, ApiError> {
        let req = self.request(Method::POST, self.collection_url()).json(draft);
        self.send(req).await
    }

    pub async fn update(&self, id: i64, draft: &MovieDraft) -> Result<Option<Movie>, ApiError> {
        let req = self.request(Method::PUT, self.item_url(id)?).json(draft);
        self.send(req).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, self.item_url(id)?);
        let resp = req.send().await.map_err(ApiError::Transport)?;
        let status = resp.status();
        debug!(%status, id, "delete response");
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    fn collection_url(&self) -> String {
        format!("{}/{COLLECTION}", self.base_url.trim_end_matches('/'))
    }

    fn item_url(&self, id: i64) -> Result<String, ApiError> {
        if id <= 0 {
            return Err(ApiError::InvalidId(id));
        }
        Ok(format!("{}/{id}", self.collection_url()))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let req = self.client.request(method.clone(), url).header(CONTENT_TYPE, "application/json");
        if method == Method::GET { req.header(CACHE_CONTROL, "no-store") } else { req }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, ApiError> {
        let resp = req.send().await.map_err(ApiError::Transport)?;
        handle_response(resp).await
    }
}

// 204 and empty bodies resolve to None.
pub async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, ApiError> {
    let status = resp.status();
    debug!(%status, url = %resp.url(), "backend response");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = resp.text().await.map_err(ApiError::Transport)?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body).map(Some).map_err(ApiError::Decode)
}
