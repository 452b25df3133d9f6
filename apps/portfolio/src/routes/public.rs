use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::content::find_post;
use crate::models::inbox::{CommentDraft, MessageDraft};
use crate::state::AppState;
use crate::views;

/// Status flags set by the redirect after a successful form post.
#[derive(Debug, Default, Deserialize)]
pub struct Notice {
    pub newsletter: Option<String>,
    pub sent: Option<String>,
    pub commented: Option<String>,
    pub category: Option<String>,
}

fn notice(flag: &Option<String>, text: &str) -> Option<Result<String, String>> {
    flag.as_ref().map(|_| Ok(text.to_string()))
}

/// GET /
pub async fn home(State(state): State<AppState>, Query(q): Query<Notice>) -> Html<String> {
    let data = state.data.current();
    let message = notice(&q.newsletter, "Thanks for subscribing!");
    Html(views::public::home(&data, message.as_ref()))
}

/// GET /projects
pub async fn projects(State(state): State<AppState>, Query(q): Query<Notice>) -> Html<String> {
    let data = state.data.current();
    Html(views::public::projects(&data, q.category.as_deref()))
}

/// GET /blog
pub async fn blog(State(state): State<AppState>) -> Html<String> {
    Html(views::public::blog(&state.data.current()))
}

async fn render_post(
    state: &AppState,
    address: &str,
    message: Option<Result<String, String>>,
) -> Result<Html<String>, AppError> {
    let data = state.data.current();
    let post = find_post(&data.posts, address)
        .ok_or_else(|| AppError::NotFound(format!("No post at '{address}'")))?;
    let comments = match post.id.as_existing() {
        Some(id) => state.repo.get_comments(id).await,
        None => Vec::new(),
    };
    Ok(Html(views::public::blog_detail(&data, post, &comments, message.as_ref())))
}

/// GET /blog/:slug
pub async fn blog_post(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<Notice>,
) -> Result<Html<String>, AppError> {
    render_post(&state, &address, notice(&q.commented, "Comment posted.")).await
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub content: String,
}

/// POST /blog/:slug/comments
pub async fn post_comment(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let post_id = {
        let data = state.data.current();
        let post = find_post(&data.posts, &address)
            .ok_or_else(|| AppError::NotFound(format!("No post at '{address}'")))?;
        post.id.to_string()
    };
    let draft = CommentDraft {
        post_id,
        user_name: form.user_name,
        content: form.content,
    };
    match state.repo.save_comment(draft).await {
        Ok(()) => {
            state.data.reload(&state.repo).await;
            let to = format!("/blog/{}?commented=1#comments", urlencoding::encode(&address));
            Ok(Redirect::to(&to).into_response())
        }
        Err(e) => {
            let page = render_post(&state, &address, Some(Err(e.to_string()))).await?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
    }
}

/// GET /contact
pub async fn contact_page(State(state): State<AppState>, Query(q): Query<Notice>) -> Html<String> {
    let message = notice(&q.sent, "Message sent. I'll get back to you soon.");
    Html(views::public::contact(&state.data.current(), message.as_ref()))
}

/// POST /contact
pub async fn contact(State(state): State<AppState>, Form(draft): Form<MessageDraft>) -> Response {
    match state.repo.save_message(draft).await {
        Ok(()) => {
            state.data.reload(&state.repo).await;
            Redirect::to("/contact?sent=1").into_response()
        }
        Err(e) => {
            let page = views::public::contact(&state.data.current(), Some(&Err(e.to_string())));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// POST /subscribe
pub async fn subscribe(State(state): State<AppState>, Form(form): Form<SubscribeForm>) -> Response {
    match state.repo.save_subscriber(&form.email).await {
        Ok(()) => {
            state.data.reload(&state.repo).await;
            Redirect::to("/?newsletter=ok#newsletter").into_response()
        }
        Err(e) => {
            let page = views::public::home(&state.data.current(), Some(&Err(e.to_string())));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.data.current();
    (
        StatusCode::NOT_FOUND,
        Html(views::public::not_found(&data.profile.name, "That page does not exist.")),
    )
}
