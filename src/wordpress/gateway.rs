//! Read-only façade over the WordPress REST API.
//!
//! Every operation comes in two forms. `try_*` returns the cause of a failure
//! as a [`GatewayError`]. The plain form logs that cause and returns an empty
//! page, an empty list or `None`, so page rendering never has to handle
//! errors. "Nothing found" and "fetch failed" look the same from the plain
//! form; the logs tell them apart.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::cache::{Freshness, RawResponse, ResponseCache};
use super::error::GatewayError;
use super::models::{
    Category, CategoryList, Comment, CommentWithPost, Paginated, Post, PostPage, Tag, TagList,
};
use super::query::{join_ids, OrderBy, PostQuery};
use crate::config::Config;
use crate::constants::{
    GATEWAY_USER_AGENT, HEADER_WP_TOTAL, HEADER_WP_TOTAL_PAGES, WP_API_ROOT, WP_MAX_PER_PAGE,
};

/// A decoded response body with the pagination totals from its headers.
struct Fetched<T> {
    value: T,
    total: u32,
    total_pages: u32,
}

/// Typed read operations against one WordPress site.
///
/// Cheap to clone; clones share the HTTP connection pool and the freshness cache.
#[derive(Clone)]
pub struct ContentGateway {
    http: Client,
    base_url: String,
    api_root: String,
    cache: Arc<ResponseCache>,
}

impl ContentGateway {
    /// Build a gateway for the site in `config.wordpress_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationMissing`] when the URL is blank and
    /// [`GatewayError::InvalidUrl`] when it does not parse. Both are deployment
    /// defects; no request is ever attempted without a valid base URL.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let base_url = config.wordpress_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GatewayError::ConfigurationMissing);
        }
        Url::parse(base_url).map_err(|source| GatewayError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(GATEWAY_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_root: format!("{base_url}/{WP_API_ROOT}"),
            cache: Arc::new(ResponseCache::new(config.cache_ttl, config.cache_max_entries)),
        })
    }

    /// Site origin without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The freshness cache shared by this gateway and its clones.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    // ========== Posts ==========

    /// Full-text search over posts. Never served from the freshness cache.
    pub async fn search_posts(&self, query: &str, options: &PostQuery) -> PostPage {
        collapse("search_posts", self.try_search_posts(query, options).await)
    }

    /// # Errors
    ///
    /// Returns the reason the search could not be answered.
    pub async fn try_search_posts(
        &self,
        query: &str,
        options: &PostQuery,
    ) -> Result<PostPage, GatewayError> {
        let mut params = vec![("search", query.to_string())];
        params.extend(options.to_params(OrderBy::Relevance));
        params.push(("_embed", "true".to_string()));

        let fetched = self
            .get_json::<Vec<Post>>("posts", &params, Freshness::NoStore)
            .await?;
        Ok(into_page(fetched, options.effective_per_page()))
    }

    /// Post listing, newest first unless `options` says otherwise.
    pub async fn get_all_posts(&self, options: &PostQuery) -> PostPage {
        collapse("get_all_posts", self.try_get_all_posts(options).await)
    }

    /// # Errors
    ///
    /// Returns the reason the listing could not be fetched.
    pub async fn try_get_all_posts(&self, options: &PostQuery) -> Result<PostPage, GatewayError> {
        let mut params = options.to_params(OrderBy::Date);
        params.push(("_embed", "true".to_string()));

        let fetched = self
            .get_json::<Vec<Post>>("posts", &params, Freshness::Revalidate)
            .await?;
        Ok(into_page(fetched, options.effective_per_page()))
    }

    pub async fn get_post_by_id(&self, id: u64) -> Option<Post> {
        collapse("get_post_by_id", self.try_get_post_by_id(id).await)
    }

    /// `Ok(None)` when WordPress answers 404.
    ///
    /// # Errors
    ///
    /// Returns any other failure.
    pub async fn try_get_post_by_id(&self, id: u64) -> Result<Option<Post>, GatewayError> {
        let params = [("_embed", "true".to_string())];
        match self
            .get_json::<Post>(&format!("posts/{id}"), &params, Freshness::Revalidate)
            .await
        {
            Ok(fetched) => Ok(Some(fetched.value)),
            Err(e) if e.is_not_found() => {
                debug!(id, "Post not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        collapse("get_post_by_slug", self.try_get_post_by_slug(slug).await)
    }

    /// First post whose slug matches, `Ok(None)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns the reason the lookup could not be answered.
    pub async fn try_get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, GatewayError> {
        let slug = slug.trim();
        if slug.is_empty() {
            // WordPress ignores an empty slug filter and would return the latest posts.
            return Ok(None);
        }
        let params = [("slug", slug.to_string()), ("_embed", "true".to_string())];
        let fetched = self
            .get_json::<Vec<Post>>("posts", &params, Freshness::Revalidate)
            .await?;
        Ok(fetched.value.into_iter().next())
    }

    /// Fetch several posts in one request.
    pub async fn get_posts_by_ids(&self, ids: &[u64]) -> Vec<Post> {
        collapse("get_posts_by_ids", self.try_get_posts_by_ids(ids).await)
    }

    /// Posts whose id is in `ids`, in whatever order WordPress returns them.
    /// Ids that do not resolve are simply missing from the result.
    ///
    /// # Errors
    ///
    /// Returns the reason the batch could not be fetched.
    pub async fn try_get_posts_by_ids(&self, ids: &[u64]) -> Result<Vec<Post>, GatewayError> {
        let Some(include) = join_ids(ids) else {
            return Ok(Vec::new());
        };
        // WordPress pages `include=` results like any other listing.
        let per_page = (ids.len() as u32).clamp(1, WP_MAX_PER_PAGE);
        let params = [
            ("include", include),
            ("per_page", per_page.to_string()),
            ("_embed", "true".to_string()),
        ];
        let fetched = self
            .get_json::<Vec<Post>>("posts", &params, Freshness::Revalidate)
            .await?;
        Ok(fetched.value)
    }

    // ========== Taxonomies ==========

    pub async fn get_categories(&self) -> CategoryList {
        collapse("get_categories", self.try_get_categories().await)
    }

    /// Up to 100 categories with the site-wide totals.
    ///
    /// # Errors
    ///
    /// Returns the reason the categories could not be fetched.
    pub async fn try_get_categories(&self) -> Result<CategoryList, GatewayError> {
        let params = [("per_page", WP_MAX_PER_PAGE.to_string())];
        let fetched = self
            .get_json::<Vec<Category>>("categories", &params, Freshness::Revalidate)
            .await?;
        Ok(into_page(fetched, WP_MAX_PER_PAGE))
    }

    pub async fn get_tags(&self) -> TagList {
        collapse("get_tags", self.try_get_tags().await)
    }

    /// Up to 100 tags with the site-wide totals.
    ///
    /// # Errors
    ///
    /// Returns the reason the tags could not be fetched.
    pub async fn try_get_tags(&self) -> Result<TagList, GatewayError> {
        let params = [("per_page", WP_MAX_PER_PAGE.to_string())];
        let fetched = self
            .get_json::<Vec<Tag>>("tags", &params, Freshness::Revalidate)
            .await?;
        Ok(into_page(fetched, WP_MAX_PER_PAGE))
    }

    // ========== Comments ==========

    /// Most recent approved comments across all posts, newest first.
    pub async fn get_recent_comments(&self, limit: u32) -> Vec<Comment> {
        collapse("get_recent_comments", self.try_get_recent_comments(limit).await)
    }

    /// At most `limit` comments; a zero limit yields none without a request.
    ///
    /// # Errors
    ///
    /// Returns the reason the comments could not be fetched.
    pub async fn try_get_recent_comments(&self, limit: u32) -> Result<Vec<Comment>, GatewayError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(WP_MAX_PER_PAGE);
        let params = [
            ("per_page", limit.to_string()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
            ("status", "approve".to_string()),
        ];
        let mut comments = self
            .get_json::<Vec<Comment>>("comments", &params, Freshness::Revalidate)
            .await?
            .value;
        comments.truncate(limit as usize);
        Ok(comments)
    }

    /// Recent comments, each paired with its post.
    pub async fn get_recent_comments_with_posts(&self, limit: u32) -> Vec<CommentWithPost> {
        collapse(
            "get_recent_comments_with_posts",
            self.try_get_recent_comments_with_posts(limit).await,
        )
    }

    /// Recent comments joined with their posts using one batched post fetch.
    ///
    /// At most two requests are made whatever the number of distinct posts.
    /// If the batch fails the comments are still returned with `post: None`.
    ///
    /// # Errors
    ///
    /// Returns the reason the comments themselves could not be fetched.
    pub async fn try_get_recent_comments_with_posts(
        &self,
        limit: u32,
    ) -> Result<Vec<CommentWithPost>, GatewayError> {
        let comments = self.try_get_recent_comments(limit).await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let post_ids: Vec<u64> = comments
            .iter()
            .map(|c| c.post)
            .filter(|id| *id != 0 && seen.insert(*id))
            .collect();

        let posts = match self.try_get_posts_by_ids(&post_ids).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    posts = post_ids.len(),
                    "Failed to fetch posts for recent comments: {e}"
                );
                Vec::new()
            }
        };

        let by_id: HashMap<u64, Post> = posts.into_iter().map(|p| (p.id, p)).collect();
        let joined = comments
            .into_iter()
            .map(|comment| {
                let post = by_id.get(&comment.post).cloned();
                CommentWithPost { comment, post }
            })
            .collect();
        Ok(joined)
    }

    // ========== Transport ==========

    /// GET an API endpoint and decode its JSON body.
    ///
    /// With [`Freshness::Revalidate`] a cached response younger than the TTL is
    /// decoded instead of making a request, and a successful fresh response
    /// is stored.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        freshness: Freshness,
    ) -> Result<Fetched<T>, GatewayError> {
        let url = self.endpoint_url(endpoint, params)?;
        let key = url.to_string();

        if freshness == Freshness::Revalidate {
            if let Some(cached) = self.cache.get(&key) {
                debug!(url = %key, "Serving WordPress response from cache");
                return decode(&key, &cached);
            }
        }

        let raw = Arc::new(self.send(url, &key).await?);
        let fetched = decode(&key, &raw)?;
        if freshness == Freshness::Revalidate {
            self.cache.insert(key, raw);
        }
        Ok(fetched)
    }

    async fn send(&self, url: Url, key: &str) -> Result<RawResponse, GatewayError> {
        debug!(url = %key, "Fetching from WordPress");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::from_transport(key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: key.to_string(),
                status,
            });
        }

        let total = header_u32(response.headers(), HEADER_WP_TOTAL);
        let total_pages = header_u32(response.headers(), HEADER_WP_TOTAL_PAGES);
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_transport(key, e))?
            .to_vec();

        Ok(RawResponse {
            body,
            total,
            total_pages,
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, GatewayError> {
        let raw = format!("{}/{endpoint}", self.api_root);
        Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str())))
            .map_err(|source| GatewayError::InvalidUrl { url: raw, source })
    }
}

fn decode<T: DeserializeOwned>(url: &str, raw: &RawResponse) -> Result<Fetched<T>, GatewayError> {
    let value = serde_json::from_slice(&raw.body).map_err(|source| GatewayError::Malformed {
        url: url.to_string(),
        source,
    })?;
    Ok(Fetched {
        value,
        total: raw.total,
        total_pages: raw.total_pages,
    })
}

fn into_page<T>(fetched: Fetched<Vec<T>>, per_page: u32) -> Paginated<T> {
    let mut items = fetched.value;
    items.truncate(per_page as usize);
    Paginated {
        items,
        total: fetched.total,
        total_pages: fetched.total_pages,
    }
}

/// Integer header value; absent or unparseable values count as 0.
fn header_u32(headers: &HeaderMap, name: &str) -> u32 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Log a failure and substitute the empty value for the operation.
fn collapse<T: Default>(operation: &'static str, result: Result<T, GatewayError>) -> T {
    result.unwrap_or_else(|e| {
        if e.is_configuration() {
            error!(operation, kind = e.kind(), "WordPress gateway misconfigured: {e}");
        } else {
            warn!(
                operation,
                kind = e.kind(),
                status = ?e.status(),
                "WordPress request failed: {e}"
            );
        }
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gateway(url: &str) -> Result<ContentGateway, GatewayError> {
        let config = Config {
            wordpress_url: url.to_string(),
            ..Config::for_testing()
        };
        ContentGateway::new(&config)
    }

    #[test]
    fn test_blank_base_url_is_configuration_missing() {
        assert!(matches!(
            gateway("").err(),
            Some(GatewayError::ConfigurationMissing)
        ));
        assert!(matches!(
            gateway("   ").err(),
            Some(GatewayError::ConfigurationMissing)
        ));
    }

    #[test]
    fn test_unparseable_base_url_is_rejected() {
        assert!(matches!(
            gateway("cms.example.com").err(),
            Some(GatewayError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let gw = gateway("https://cms.example.com/").unwrap();
        assert_eq!(gw.base_url(), "https://cms.example.com");
        let url = gw
            .endpoint_url("posts/7", &[("_embed", "true".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/wp-json/wp/v2/posts/7?_embed=true"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_params() {
        let gw = gateway("https://cms.example.com/shop").unwrap();
        let url = gw
            .endpoint_url(
                "posts",
                &[
                    ("search", "fawkes & phoenix".to_string()),
                    ("include", "3,9".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/shop/wp-json/wp/v2/posts?search=fawkes+%26+phoenix&include=3%2C9"
        );
    }

    #[test]
    fn test_header_u32_defaults_to_zero() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_u32(&headers, HEADER_WP_TOTAL), 0);

        headers.insert(HEADER_WP_TOTAL, HeaderValue::from_static("25"));
        headers.insert(HEADER_WP_TOTAL_PAGES, HeaderValue::from_static("three"));
        assert_eq!(header_u32(&headers, HEADER_WP_TOTAL), 25);
        assert_eq!(header_u32(&headers, HEADER_WP_TOTAL_PAGES), 0);

        headers.insert(HEADER_WP_TOTAL_PAGES, HeaderValue::from_static("-1"));
        assert_eq!(header_u32(&headers, HEADER_WP_TOTAL_PAGES), 0);
    }

    #[test]
    fn test_into_page_truncates_to_per_page() {
        let fetched = Fetched {
            value: vec![1, 2, 3, 4],
            total: 40,
            total_pages: 20,
        };
        let page = into_page(fetched, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total, 40);
        assert_eq!(page.total_pages, 20);
    }

    #[test]
    fn test_collapse_substitutes_default() {
        let page: PostPage = collapse(
            "test",
            Err(GatewayError::Timeout {
                url: "http://cms".to_string(),
            }),
        );
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);

        let post: Option<Post> = collapse("test", Err(GatewayError::ConfigurationMissing));
        assert!(post.is_none());
    }

    #[test]
    fn test_cache_ttl_follows_config() {
        let config = Config {
            wordpress_url: "https://cms.example.com".to_string(),
            cache_ttl: Duration::from_secs(42),
            cache_max_entries: 7,
            ..Config::for_testing()
        };
        let gw = ContentGateway::new(&config).unwrap();
        assert_eq!(gw.cache().ttl(), Duration::from_secs(42));
        assert_eq!(gw.cache().max_entries(), 7);
    }
}
