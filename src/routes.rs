use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    AppState,
    error::AppResult,
    models::{FieldErrors, ListFilters, MovieForm},
    templates::{self, FormMode, Listing},
};

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    notice: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
    Query(q): Query<NoticeQuery>,
) -> Html<String> {
    let listing = match state.api.list(&filters.list_query()).await {
        Ok(movies) => {
            debug!(count = movies.len(), "loaded movies");
            Listing::Movies(movies)
        },
        Err(err) => {
            warn!(error = %err, "failed to load movies");
            Listing::Failed
        },
    };

    let view_id = state.views.new_view_id();
    Html(templates::index_page(&filters, &view_id, &listing, q.notice.as_deref()))
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    view: String,
    #[serde(default)]
    seq: u64,
}

pub async fn results(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
    Query(q): Query<ResultsQuery>,
) -> AppResult<Response> {
    let view = q.view.trim();
    if view.is_empty() {
        return Err(anyhow::anyhow!("view is required").into());
    }

    let gate = state.views.gate(view);
    let listing = match state.api.list_latest(&gate, q.seq, &filters.list_query()).await {
        Ok(None) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(Some(movies)) => Listing::Movies(movies),
        Err(err) => {
            warn!(view, seq = q.seq, error = %err, "failed to refresh movies");
            Listing::Failed
        },
    };

    let mut resp = Html(templates::results_fragment(&filters, &listing)).into_response();
    resp.headers_mut().insert("datastar-selector", HeaderValue::from_static("#results"));
    resp.headers_mut().insert("datastar-mode", HeaderValue::from_static("outer"));
    Ok(resp)
}

pub async fn new_movie() -> Html<String> {
    Html(templates::movie_form_page(
        FormMode::Create,
        &MovieForm::default(),
        &FieldErrors::default(),
        None,
    ))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MovieForm>,
) -> Response {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(errors) => return invalid_form(FormMode::Create, &form, &errors),
    };

    match state.api.create(&draft).await {
        Ok(created) => {
            debug!(id = ?created.map(|m| m.id), title = %draft.title, "created movie");
            Redirect::to("/").into_response()
        },
        Err(err) => {
            warn!(error = %err, status = ?err.status(), "failed to create movie");
            let alert = format!("Failed to create movie. Please try again. ({})", err.message());
            form_with_alert(FormMode::Create, &form, &alert)
        },
    }
}

pub async fn edit_movie(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.api.get(id).await {
        Ok(movie) => Html(templates::movie_form_page(
            FormMode::Edit(id),
            &MovieForm::from_movie(&movie),
            &FieldErrors::default(),
            None,
        ))
        .into_response(),
        Err(err) => {
            warn!(id, error = %err, "failed to load movie for editing");
            redirect_with_notice(&format!("Movie not found: {}", err.message()))
        },
    }
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<MovieForm>,
) -> Response {
    let mode = FormMode::Edit(id);
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(errors) => return invalid_form(mode, &form, &errors),
    };

    match state.api.update(id, &draft).await {
        Ok(_) => {
            debug!(id, "updated movie");
            Redirect::to("/").into_response()
        },
        Err(err) => {
            warn!(id, error = %err, status = ?err.status(), "failed to update movie");
            let alert = format!("Failed to update movie. Please try again. ({})", err.message());
            form_with_alert(mode, &form, &alert)
        },
    }
}

pub async fn delete_movie(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.api.delete(id).await {
        Ok(()) => {
            debug!(id, "deleted movie");
            Redirect::to("/").into_response()
        },
        Err(err) => {
            warn!(id, error = %err, "failed to delete movie");
            redirect_with_notice("Failed to delete movie. Please try again.")
        },
    }
}

fn invalid_form(mode: FormMode, form: &MovieForm, errors: &FieldErrors) -> Response {
    let html = templates::movie_form_page(mode, form, errors, Some("Please fix the highlighted fields."));
    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
}

fn form_with_alert(mode: FormMode, form: &MovieForm, alert: &str) -> Response {
    Html(templates::movie_form_page(mode, form, &FieldErrors::default(), Some(alert)))
        .into_response()
}

fn redirect_with_notice(notice: &str) -> Response {
    Redirect::to(&format!("/?notice={}", urlencoding::encode(notice))).into_response()
}
