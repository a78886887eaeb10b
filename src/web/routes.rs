use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::catalog::{category_listing, load_sidebar, product_detail};
use crate::constants::{CACHE_CONTROL_NO_CACHE, CACHE_CONTROL_NO_STORE, CATEGORY_PAGE_SIZE};
use crate::wordpress::{Order, OrderBy, PostQuery};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/admin", get(admin))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:id", get(post_by_id))
        .route("/api/search", get(search))
        .route("/api/products/:slug", get(product))
        .route("/api/categories", get(categories))
        .route("/api/categories/:slug", get(category))
        .route("/api/tags", get(tags))
        .route("/api/comments/recent", get(recent_comments))
        .route("/api/sidebar", get(sidebar))
}

// ========== Helpers ==========

/// `Cache-Control` matching the gateway's freshness window.
fn fresh_directive(state: &AppState) -> String {
    let ttl = state.config.cache_ttl.as_secs();
    if ttl == 0 {
        CACHE_CONTROL_NO_CACHE.to_string()
    } else {
        format!("public, max-age={ttl}")
    }
}

fn fresh_json<T: Serialize>(state: &AppState, value: T) -> Response {
    ([(header::CACHE_CONTROL, fresh_directive(state))], Json(value)).into_response()
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

// ========== Routes ==========

async fn health() -> &'static str {
    "ok"
}

async fn admin(State(state): State<AppState>) -> Redirect {
    Redirect::permanent(&format!("{}/wp-admin", state.gateway.base_url()))
}

async fn list_posts(State(state): State<AppState>, Query(query): Query<PostQuery>) -> Response {
    let page = state.gateway.get_all_posts(&query).await;
    fresh_json(&state, page)
}

async fn post_by_id(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.gateway.get_post_by_id(id).await {
        Some(post) => fresh_json(&state, post),
        None => not_found("Post not found"),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    q: Option<String>,
    per_page: Option<u32>,
    page: Option<u32>,
    orderby: Option<OrderBy>,
    order: Option<Order>,
    categories: Option<String>,
    tags: Option<String>,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();
    let options = PostQuery {
        per_page: params.per_page,
        page: params.page,
        orderby: params.orderby,
        order: params.order,
        categories: params.categories,
        tags: params.tags,
    };
    let page = state.gateway.search_posts(query.trim(), &options).await;
    (
        [(header::CACHE_CONTROL, CACHE_CONTROL_NO_STORE)],
        Json(page),
    )
        .into_response()
}

async fn product(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match product_detail(&state.gateway, &slug, state.config.related_posts).await {
        Some(detail) => fresh_json(&state, detail),
        None => not_found("Product not found"),
    }
}

async fn categories(State(state): State<AppState>) -> Response {
    let list = state.gateway.get_categories().await;
    fresh_json(&state, list)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    page: Option<u32>,
}

async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let page = params.page.unwrap_or(1);
    // The posts come from an uncached search, so clients revalidate too.
    match category_listing(&state.gateway, &slug, page, CATEGORY_PAGE_SIZE).await {
        Some(listing) => (
            [(header::CACHE_CONTROL, CACHE_CONTROL_NO_CACHE)],
            Json(listing),
        )
            .into_response(),
        None => not_found("Category not found"),
    }
}

async fn tags(State(state): State<AppState>) -> Response {
    let list = state.gateway.get_tags().await;
    fresh_json(&state, list)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LimitParams {
    limit: Option<u32>,
}

async fn recent_comments(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Response {
    let limit = params.limit.unwrap_or(state.config.sidebar_items);
    let comments = state.gateway.get_recent_comments_with_posts(limit).await;
    fresh_json(&state, comments)
}

async fn sidebar(State(state): State<AppState>) -> Response {
    let sidebar = load_sidebar(&state.gateway, state.config.sidebar_items).await;
    fresh_json(&state, sidebar)
}
