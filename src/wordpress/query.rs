//! Listing options shared by search and plain post listings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PER_PAGE, WP_MAX_PER_PAGE};

/// Sort key accepted by the posts collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Date,
    Title,
    Relevance,
    Id,
    Include,
    Slug,
    Modified,
}

impl OrderBy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
            Self::Relevance => "relevance",
            Self::Id => "id",
            Self::Include => "include",
            Self::Slug => "slug",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for `search_posts` and `get_all_posts`.
///
/// Unset fields take the defaults of the operation they are passed to:
/// search sorts by relevance, listings by date, both descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub orderby: Option<OrderBy>,
    pub order: Option<Order>,
    /// Comma-joined category ids.
    pub categories: Option<String>,
    /// Comma-joined tag ids.
    pub tags: Option<String>,
}

impl PostQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn orderby(mut self, orderby: OrderBy) -> Self {
        self.orderby = Some(orderby);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn categories(mut self, ids: &[u64]) -> Self {
        self.categories = join_ids(ids);
        self
    }

    #[must_use]
    pub fn tags(mut self, ids: &[u64]) -> Self {
        self.tags = join_ids(ids);
        self
    }

    /// Page size after clamping to what WordPress will serve.
    #[must_use]
    pub fn effective_per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, WP_MAX_PER_PAGE)
    }

    #[must_use]
    pub fn effective_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Query-string pairs for the posts collection, excluding `search` and `_embed`.
    pub(crate) fn to_params(&self, default_orderby: OrderBy) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("per_page", self.effective_per_page().to_string()),
            ("page", self.effective_page().to_string()),
            (
                "orderby",
                self.orderby.unwrap_or(default_orderby).as_str().to_string(),
            ),
            ("order", self.order.unwrap_or(Order::Desc).as_str().to_string()),
        ];
        if let Some(categories) = non_empty(self.categories.as_deref()) {
            params.push(("categories", categories.to_string()));
        }
        if let Some(tags) = non_empty(self.tags.as_deref()) {
            params.push(("tags", tags.to_string()));
        }
        params
    }
}

/// Join ids the way WordPress list filters expect (`3,7,12`).
#[must_use]
pub fn join_ids(ids: &[u64]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(
        ids.iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_defaults_depend_on_operation() {
        let query = PostQuery::new();

        let search = query.to_params(OrderBy::Relevance);
        assert_eq!(param(&search, "per_page"), Some("10"));
        assert_eq!(param(&search, "page"), Some("1"));
        assert_eq!(param(&search, "orderby"), Some("relevance"));
        assert_eq!(param(&search, "order"), Some("desc"));
        assert_eq!(param(&search, "categories"), None);
        assert_eq!(param(&search, "tags"), None);

        let listing = query.to_params(OrderBy::Date);
        assert_eq!(param(&listing, "orderby"), Some("date"));
    }

    #[test]
    fn test_explicit_options() {
        let query = PostQuery::new()
            .per_page(12)
            .page(2)
            .orderby(OrderBy::Title)
            .order(Order::Asc)
            .categories(&[3, 9])
            .tags(&[7]);
        let params = query.to_params(OrderBy::Date);
        assert_eq!(param(&params, "per_page"), Some("12"));
        assert_eq!(param(&params, "page"), Some("2"));
        assert_eq!(param(&params, "orderby"), Some("title"));
        assert_eq!(param(&params, "order"), Some("asc"));
        assert_eq!(param(&params, "categories"), Some("3,9"));
        assert_eq!(param(&params, "tags"), Some("7"));
    }

    #[test]
    fn test_page_bounds_are_clamped() {
        let query = PostQuery::new().per_page(0).page(0);
        assert_eq!(query.effective_per_page(), 1);
        assert_eq!(query.effective_page(), 1);

        let query = PostQuery::new().per_page(500);
        assert_eq!(query.effective_per_page(), 100);
    }

    #[test]
    fn test_blank_filters_are_skipped() {
        let query = PostQuery {
            categories: Some("  ".to_string()),
            tags: Some(String::new()),
            ..PostQuery::default()
        };
        let params = query.to_params(OrderBy::Date);
        assert_eq!(param(&params, "categories"), None);
        assert_eq!(param(&params, "tags"), None);
        assert_eq!(PostQuery::new().categories(&[]).categories, None);
    }

    #[test]
    fn test_deserializes_from_query_string_shape() {
        let query: PostQuery = serde_json::from_value(serde_json::json!({
            "per_page": 5,
            "orderby": "modified",
            "order": "asc"
        }))
        .unwrap();
        assert_eq!(query.orderby, Some(OrderBy::Modified));
        assert_eq!(query.order, Some(Order::Asc));
        assert_eq!(query.page, None);

        assert!(serde_json::from_value::<PostQuery>(serde_json::json!({"orderby": "random"})).is_err());
    }
}
