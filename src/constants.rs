//! Shared constants used across the application.

/// User agent sent with every WordPress API request.
pub const GATEWAY_USER_AGENT: &str = concat!("brixspark-catalog/", env!("CARGO_PKG_VERSION"));

/// Path of the WordPress REST API v2 root, relative to the site origin.
pub const WP_API_ROOT: &str = "wp-json/wp/v2";

/// Response header carrying the total number of items in the filtered set.
pub const HEADER_WP_TOTAL: &str = "x-wp-total";

/// Response header carrying the total number of pages in the filtered set.
pub const HEADER_WP_TOTAL_PAGES: &str = "x-wp-totalpages";

/// Outbound request timeout. Exceeding it counts as a network failure.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// How long a successful list/detail response may be reused.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound on cached WordPress responses.
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;

/// Largest page WordPress will serve for any collection.
pub const WP_MAX_PER_PAGE: u32 = 100;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_SIDEBAR_ITEMS: u32 = 5;
pub const DEFAULT_RELATED_POSTS: usize = 3;

/// Posts per page on category listings.
pub const CATEGORY_PAGE_SIZE: u32 = 12;

/// Number of page links shown around the current page.
pub const PAGE_WINDOW: u32 = 5;

/// `Cache-Control` for search responses, which are always fetched fresh.
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Directive for responses built from live (uncached) upstream data.
pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache";
