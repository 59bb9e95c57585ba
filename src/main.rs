mod api;
mod config;
mod error;
mod models;
mod proxy;
mod routes;
mod sequence;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{api::MovieApi, config::Config, sequence::ViewGates};

pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub api: MovieApi,
    pub views: ViewGates,
}

impl AppState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        let api = MovieApi::new(http.clone(), config.client_base_url());
        Self { config: Arc::new(config), http, api, views: ViewGates::default() }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let proxy_route = format!("{}/{{*path}}", config::PROXY_PREFIX);

    Router::new()
        .route("/", get(routes::index))
        .route("/movies/results", get(routes::results))
        .route("/create", get(routes::new_movie).post(routes::create_movie))
        .route("/edit/{id}", get(routes::edit_movie).post(routes::update_movie))
        .route("/movies/{id}/delete", post(routes::delete_movie))
        .route(
            &proxy_route,
            get(proxy::forward)
                .post(proxy::forward)
                .put(proxy::forward)
                .delete(proxy::forward)
                .options(proxy::preflight),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reelshelf=debug".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder().user_agent("reelshelf/0.1").build()?;

    let addr = config.addr;
    let state = Arc::new(AppState::new(config, http));

    tracing::info!(
        backend = %state.config.backend_origin(),
        client_base = %state.api.base_url(),
        proxy_mode = state.config.use_api_proxy,
        "configured"
    );

    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_state(backend: &str) -> Arc<AppState> {
    let config = Config::from_lookup(|key| match key {
        "API_URL" | "BACKEND_API_URL" => Some(backend.to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(AppState::new(config, reqwest::Client::new()))
}
