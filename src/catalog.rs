//! Page-level compositions of gateway calls.
//!
//! Each function gathers what one page region needs. Independent fetches run
//! concurrently, so a page waits for its slowest call rather than the sum.

use serde::Serialize;
use urlencoding::encode;

use crate::constants::{PAGE_WINDOW, WP_MAX_PER_PAGE};
use crate::text::{date_badge, decode_html_entities, DateBadge};
use crate::wordpress::{
    Category, CommentWithPost, ContentGateway, Order, OrderBy, Post, PostPage, PostQuery,
};

/// Data for the right-hand sidebar shown on every page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sidebar {
    pub recent_posts: Vec<Post>,
    pub recent_comments: Vec<CommentWithPost>,
}

/// Latest posts and latest comments (with their posts), fetched concurrently.
///
/// Either half comes back empty on failure without affecting the other.
pub async fn load_sidebar(gateway: &ContentGateway, count: u32) -> Sidebar {
    if count == 0 {
        return Sidebar::default();
    }
    let recent = PostQuery::new()
        .per_page(count)
        .orderby(OrderBy::Date)
        .order(Order::Desc);

    let (recent_posts, recent_comments) = tokio::join!(
        gateway.get_all_posts(&recent),
        gateway.get_recent_comments_with_posts(count),
    );

    Sidebar {
        recent_posts: recent_posts.items,
        recent_comments,
    }
}

/// Newest posts sharing a category with `post`, excluding `post` itself.
///
/// A post without categories draws from all posts.
pub async fn related_posts(gateway: &ContentGateway, post: &Post, limit: usize) -> Vec<Post> {
    if limit == 0 {
        return Vec::new();
    }
    // One extra so that dropping `post` still leaves `limit` candidates.
    let per_page = (limit as u32).saturating_add(1).min(WP_MAX_PER_PAGE);
    let query = PostQuery::new()
        .per_page(per_page)
        .orderby(OrderBy::Date)
        .order(Order::Desc)
        .categories(&post.categories);

    gateway
        .get_all_posts(&query)
        .await
        .items
        .into_iter()
        .filter(|candidate| candidate.id != post.id)
        .take(limit)
        .collect()
}

/// Everything the product page shows besides static chrome.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    /// Title with HTML entities decoded, for `<title>` and breadcrumbs.
    pub title: String,
    pub date: Option<DateBadge>,
    pub pdf_url: Option<String>,
    pub post: Post,
    pub related: Vec<Post>,
}

/// Look up a product by slug and gather its related posts.
pub async fn product_detail(
    gateway: &ContentGateway,
    slug: &str,
    related_limit: usize,
) -> Option<ProductDetail> {
    let post = gateway.get_post_by_slug(slug).await?;
    let related = related_posts(gateway, &post, related_limit).await;

    Some(ProductDetail {
        title: decode_html_entities(post.title.as_str()),
        date: date_badge(&post.date),
        pdf_url: post.pdf_url().map(String::from),
        post,
        related,
    })
}

/// One page of a category archive.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub category: Category,
    pub posts: PostPage,
    pub pagination: Pagination,
    /// The requested page lies beyond the last page of a non-empty category.
    pub past_last_page: bool,
}

/// Resolve a category by slug and fetch one page of its posts, newest first.
///
/// Returns `None` when no category has that slug.
pub async fn category_listing(
    gateway: &ContentGateway,
    slug: &str,
    page: u32,
    per_page: u32,
) -> Option<CategoryListing> {
    let category = gateway
        .get_categories()
        .await
        .items
        .into_iter()
        .find(|c| c.slug == slug)?;

    let page = page.max(1);
    let query = PostQuery::new()
        .per_page(per_page)
        .page(page)
        .orderby(OrderBy::Date)
        .categories(&[category.id]);
    let posts = gateway.search_posts("", &query).await;

    let base_url = format!("/categories/{}", encode(&category.slug));
    let pagination = Pagination::new(&base_url, page, posts.total_pages);
    let past_last_page = posts.is_empty() && posts.total_pages > 0 && page > posts.total_pages;

    Some(CategoryListing {
        category,
        posts,
        pagination,
        past_last_page,
    })
}

/// Up to `show` consecutive page numbers around `current`, kept within `1..=total`.
#[must_use]
pub fn page_window(current: u32, total: u32, show: u32) -> Vec<u32> {
    if total == 0 || show == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let mut start = current.saturating_sub(show / 2).max(1);
    let end = start.saturating_add(show - 1).min(total);
    if end - start < show - 1 {
        start = end.saturating_sub(show - 1).max(1);
    }
    (start..=end).collect()
}

/// A numbered link in a [`Pagination`] bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Previous / numbered / next links for a paged listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

impl Pagination {
    /// Build links of the form `{base_url}?page=N`.
    #[must_use]
    pub fn new(base_url: &str, current_page: u32, total_pages: u32) -> Self {
        let href = |page: u32| format!("{base_url}?page={page}");

        let pages = page_window(current_page, total_pages, PAGE_WINDOW)
            .into_iter()
            .map(|number| PageLink {
                number,
                href: href(number),
                current: number == current_page,
            })
            .collect();

        Self {
            current_page,
            total_pages,
            previous: (current_page > 1).then(|| href(current_page - 1)),
            next: (current_page < total_pages).then(|| href(current_page + 1)),
            pages,
        }
    }

    /// Only worth rendering when there is more than one page.
    #[must_use]
    pub fn should_display(&self) -> bool {
        self.total_pages > 1
    }
}
