use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tower_http::services::ServeDir;

use crate::auth::session::Session;
use crate::auth::MaybeSession;
use crate::models::post::ExtendedPost;
use crate::AppState;

pub const SITE_TITLE: &str = "Lithub";
pub const SITE_DESCRIPTION: &str = "A reddit clone built with Next.js and Typescript";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/sign-in", get(serve_sign_in))
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new("static"))
}

/// Shared page shell: navbar, auth modal slot, then the page body
fn layout(session: Option<&Session>, auth_modal: &str, children: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" class="bg-white text-slate-900 antialiased light">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <link rel="stylesheet" href="/static/globals.css">
</head>
<body class="min-h-screen pt-12 bg-slate-50 antialiased">
    {navbar}
    {auth_modal}
    <div class="container max-w-7xl mx-auto h-full pt-12">
        {children}
    </div>
    <div id="toaster"></div>
</body>
</html>"#,
        title = SITE_TITLE,
        description = encode_double_quoted_attribute(SITE_DESCRIPTION),
        navbar = navbar(session),
        auth_modal = auth_modal,
        children = children,
    )
}

fn navbar(session: Option<&Session>) -> String {
    let account = match session {
        Some(session) => {
            let user = &session.user;
            let label = user
                .username
                .as_deref()
                .map(|u| format!("u/{}", u))
                .or_else(|| user.name.clone())
                .unwrap_or_else(|| "Account".to_string());
            format!(
                r#"<span class="user">{}</span>
        <button type="button" onclick="fetch('/api/auth/signout', {{ method: 'POST' }}).then(() => location.href = '/')">Sign out</button>"#,
                encode_text(&label)
            )
        }
        None => r#"<a href="/sign-in" class="sign-in">Sign In</a>"#.to_string(),
    };

    format!(
        r#"<nav class="fixed top-0 inset-x-0 h-fit bg-zinc-100 border-b border-zinc-300 z-10 py-2">
        <a href="/" class="logo">{}</a>
        {}
    </nav>"#,
        SITE_TITLE, account
    )
}

fn render_post(post: &ExtendedPost) -> String {
    let author = post
        .author
        .username
        .as_deref()
        .or(post.author.name.as_deref())
        .unwrap_or("unknown");
    format!(
        r#"<article class="post" data-post-id="{id}">
            <div class="votes">{votes}</div>
            <p class="meta">r/{subreddit} · posted by u/{author}</p>
            <h2>{title}</h2>
            <p class="comments">{comments} comments</p>
        </article>"#,
        id = post.id,
        votes = post.votes_amt,
        subreddit = encode_text(&post.subreddit.name),
        author = encode_text(author),
        title = encode_text(&post.title),
        comments = post.comments.len(),
    )
}

async fn serve_index(State(app_state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    let feed = match &session {
        Some(session) => app_state.post_service.custom_feed(session.user.id).await,
        None => app_state.post_service.general_feed().await,
    };

    let body = match feed {
        Ok(posts) if posts.is_empty() => r#"<p class="empty">No posts yet.</p>"#.to_string(),
        Ok(posts) => {
            let items: Vec<String> = posts.iter().map(render_post).collect();
            format!(r#"<ul class="feed">{}</ul>"#, items.join("\n"))
        }
        Err(e) => {
            tracing::error!("❌ FEED: Failed to load home feed: {}", e);
            r#"<p class="error">Could not load posts.</p>"#.to_string()
        }
    };

    no_store(Html(layout(session.as_ref(), "", &body)).into_response())
}

async fn serve_sign_in(MaybeSession(session): MaybeSession) -> Response {
    let modal = r#"<div class="auth-modal">
        <h1>Welcome back</h1>
        <p>By continuing, you are setting up a Lithub account and agree to our User Agreement and Privacy Policy.</p>
        <a class="google" href="/api/auth/signin/google">Google</a>
        <button type="button" onclick="history.back()">Close</button>
    </div>"#;
    no_store(Html(layout(session.as_ref(), modal, "")).into_response())
}

fn no_store(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    response
}

async fn health_check() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Health Check - {}</title></head>
<body><h1>✅ Server Status: Healthy</h1><p><a href="/">← Back to App</a></p></body>
</html>"#,
        SITE_TITLE
    ))
}
