//! Typed projections of WordPress REST API v2 resources.
//!
//! Everything here is read-only. Fields WordPress may omit (or replace with
//! an error object inside `_embedded`) default instead of failing the whole
//! response. Rendered fields are raw HTML and are never sanitized here.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Taxonomy name WordPress uses for post categories.
pub const TAXONOMY_CATEGORY: &str = "category";
/// Taxonomy name WordPress uses for post tags.
pub const TAXONOMY_TAG: &str = "post_tag";

/// Timestamp layout of `date`/`modified` (site-local, no offset).
const WP_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A pre-rendered HTML field (`{"rendered": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
    #[serde(default)]
    pub protected: bool,
}

impl Rendered {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

/// A WordPress post. Products in the catalog are ordinary posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default)]
    pub meta: PostMeta,
    #[serde(
        rename(deserialize = "_embedded", serialize = "embedded"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub embedded: Option<Embedded>,
}

impl Post {
    /// Publish time as WordPress reports it (site-local).
    #[must_use]
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, WP_DATE_FORMAT).ok()
    }

    #[must_use]
    pub fn modified_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.modified, WP_DATE_FORMAT).ok()
    }

    /// URL of the embedded featured image, if one was embedded.
    #[must_use]
    pub fn featured_image_url(&self) -> Option<&str> {
        self.embedded
            .as_ref()?
            .featured_media
            .first()
            .map(|m| m.source_url.as_str())
            .filter(|u| !u.is_empty())
    }

    /// Embedded author record.
    #[must_use]
    pub fn author_profile(&self) -> Option<&Author> {
        self.embedded.as_ref()?.author.first()
    }

    /// Embedded category terms. Empty when the post was fetched without embedding.
    #[must_use]
    pub fn category_terms(&self) -> &[Term] {
        self.embedded
            .as_ref()
            .map(|e| e.terms.categories())
            .unwrap_or_default()
    }

    /// Embedded tag terms. Empty when the post was fetched without embedding.
    #[must_use]
    pub fn tag_terms(&self) -> &[Term] {
        self.embedded
            .as_ref()
            .map(|e| e.terms.tags())
            .unwrap_or_default()
    }

    /// Embedded replies, flattened.
    #[must_use]
    pub fn replies(&self) -> &[Comment] {
        self.embedded
            .as_ref()
            .map(|e| e.replies.as_slice())
            .unwrap_or_default()
    }

    /// Instruction PDF attached through post meta.
    #[must_use]
    pub fn pdf_url(&self) -> Option<&str> {
        self.meta.pdf_url()
    }
}

/// Open key/value bag from the post's `meta` field.
///
/// Read it through the named accessors rather than indexing by string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PostMeta(Map<String, Value>);

impl PostMeta {
    pub const PDF_URL: &'static str = "pdf_url";

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A non-empty string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn pdf_url(&self) -> Option<&str> {
        self.get_str(Self::PDF_URL)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for PostMeta {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<'de> Deserialize<'de> for PostMeta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self(map)),
            // PHP encodes an empty registry as `[]`; older plugins send a list of objects.
            Value::Array(items) => {
                let mut merged = Map::new();
                for item in items {
                    if let Value::Object(map) = item {
                        merged.extend(map);
                    }
                }
                Ok(Self(merged))
            }
            Value::Null => Ok(Self::default()),
            other => Err(D::Error::custom(format!(
                "expected post meta object, got {other}"
            ))),
        }
    }
}

/// Related resources inlined by `_embed=true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEmbedded")]
pub struct Embedded {
    pub featured_media: Vec<Media>,
    pub terms: EmbeddedTerms,
    pub author: Vec<Author>,
    pub replies: Vec<Comment>,
}

#[derive(Deserialize)]
struct RawEmbedded {
    #[serde(rename = "wp:featuredmedia", default)]
    featured_media: Vec<Media>,
    #[serde(rename = "wp:term", default)]
    terms: Vec<Vec<Term>>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(default)]
    replies: Vec<Vec<Comment>>,
}

impl From<RawEmbedded> for Embedded {
    fn from(raw: RawEmbedded) -> Self {
        Self {
            featured_media: raw.featured_media,
            terms: EmbeddedTerms::from_groups(raw.terms),
            author: raw.author,
            replies: raw.replies.into_iter().flatten().collect(),
        }
    }
}

/// Embedded term groups keyed by taxonomy name.
///
/// `wp:term` is a list of groups where group 0 holds categories and group 1
/// holds tags. Terms are filed under their own `taxonomy` field; the
/// positional convention is only used for terms that do not carry one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddedTerms(BTreeMap<String, Vec<Term>>);

impl EmbeddedTerms {
    #[must_use]
    pub fn from_groups(groups: Vec<Vec<Term>>) -> Self {
        let mut by_taxonomy: BTreeMap<String, Vec<Term>> = BTreeMap::new();
        for (index, group) in groups.into_iter().enumerate() {
            for term in group {
                let taxonomy = if term.taxonomy.is_empty() {
                    match positional_taxonomy(index) {
                        Some(name) => name.to_string(),
                        None => continue,
                    }
                } else {
                    term.taxonomy.clone()
                };
                by_taxonomy.entry(taxonomy).or_default().push(term);
            }
        }
        Self(by_taxonomy)
    }

    #[must_use]
    pub fn taxonomy(&self, name: &str) -> &[Term] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn categories(&self) -> &[Term] {
        self.taxonomy(TAXONOMY_CATEGORY)
    }

    #[must_use]
    pub fn tags(&self) -> &[Term] {
        self.taxonomy(TAXONOMY_TAG)
    }
}

fn positional_taxonomy(index: usize) -> Option<&'static str> {
    match index {
        0 => Some(TAXONOMY_CATEGORY),
        1 => Some(TAXONOMY_TAG),
        _ => None,
    }
}

/// A taxonomy term as embedded in a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Term {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    pub link: String,
    /// Only present when WordPress embeds the full term.
    pub count: u32,
    pub parent: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
    #[serde(default)]
    pub parent: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
}

/// An approved comment. `parent` is the parent comment id, 0 for top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub post: u64,
    #[serde(default)]
    pub parent: u64,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub author_avatar_urls: BTreeMap<String, String>,
}

/// Post author as embedded under `_embedded.author`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub description: String,
    pub link: String,
    pub slug: String,
    /// Avatar URLs keyed by pixel size ("24", "48", "96").
    pub avatar_urls: BTreeMap<String, String>,
}

impl Author {
    /// Avatar at exactly `size` pixels, otherwise the largest one available.
    #[must_use]
    pub fn avatar_url(&self, size: u32) -> Option<&str> {
        self.avatar_urls
            .get(&size.to_string())
            .or_else(|| {
                self.avatar_urls
                    .iter()
                    .filter_map(|(k, v)| k.parse::<u32>().ok().map(|px| (px, v)))
                    .max_by_key(|(px, _)| *px)
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}

/// Attachment embedded under `wp:featuredmedia`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub id: u64,
    pub source_url: String,
    pub alt_text: String,
    pub media_type: String,
    pub mime_type: String,
    pub media_details: Option<MediaDetails>,
}

impl Media {
    /// URL of a named rendition (e.g. `medium`), falling back to the original.
    #[must_use]
    pub fn size_url(&self, name: &str) -> &str {
        self.media_details
            .as_ref()
            .and_then(|d| d.sizes.get(name))
            .map_or(self.source_url.as_str(), |s| s.source_url.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDetails {
    pub width: u32,
    pub height: u32,
    pub file: String,
    pub sizes: BTreeMap<String, MediaSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSize {
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub source_url: String,
}

/// One page of a collection plus the totals WordPress reports in headers.
///
/// `total` and `total_pages` describe the whole filtered set, not `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self::empty()
    }
}

pub type PostPage = Paginated<Post>;
pub type CategoryList = Paginated<Category>;
pub type TagList = Paginated<Tag>;

/// A recent comment joined with the post it belongs to.
///
/// `post` is `None` when the post could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithPost {
    pub comment: Comment,
    pub post: Option<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn embedded_post() -> Value {
        json!({
            "id": 42,
            "date": "2024-07-02T09:15:00",
            "date_gmt": "2024-07-02T07:15:00",
            "modified": "2024-07-03T10:00:00",
            "slug": "21358-minifigure-vending-machine-p90701",
            "status": "publish",
            "title": {"rendered": "21358 Minifigure Vending Machine &#8211; P90701"},
            "content": {"rendered": "<p>Lighting kit</p>", "protected": false},
            "excerpt": {"rendered": "<p>Kit</p>", "protected": false},
            "author": 1,
            "featured_media": 9,
            "categories": [3],
            "tags": [7, 8],
            "meta": {"pdf_url": "https://cdn.example.com/P90701.pdf"},
            "_embedded": {
                "author": [{
                    "id": 1,
                    "name": "admin",
                    "avatar_urls": {"24": "https://gravatar/24", "96": "https://gravatar/96"}
                }],
                "wp:featuredmedia": [{
                    "id": 9,
                    "source_url": "https://cdn.example.com/p90701.jpg",
                    "media_details": {
                        "width": 1200,
                        "height": 900,
                        "sizes": {"medium": {"source_url": "https://cdn.example.com/p90701-300.jpg", "width": 300, "height": 225}}
                    }
                }],
                "wp:term": [
                    [{"id": 3, "name": "LEGO Instructions", "slug": "lego-instructions", "taxonomy": "category"}],
                    [
                        {"id": 7, "name": "21358", "slug": "21358", "taxonomy": "post_tag"},
                        {"id": 8, "name": "LED", "slug": "led", "taxonomy": "post_tag"}
                    ]
                ]
            }
        })
    }

    #[test]
    fn test_post_with_embedded_resources() {
        let post: Post = serde_json::from_value(embedded_post()).unwrap();

        assert_eq!(post.id, 42);
        assert_eq!(post.category_terms().len(), 1);
        assert_eq!(post.category_terms()[0].slug, "lego-instructions");
        assert_eq!(post.tag_terms().len(), 2);
        assert_eq!(
            post.featured_image_url(),
            Some("https://cdn.example.com/p90701.jpg")
        );
        assert_eq!(post.pdf_url(), Some("https://cdn.example.com/P90701.pdf"));
        assert_eq!(post.author_profile().map(|a| a.name.as_str()), Some("admin"));
        assert_eq!(
            post.published_at().map(|d| d.to_string()),
            Some("2024-07-02 09:15:00".to_string())
        );
        assert_eq!(post.modified_gmt, None);
    }

    #[test]
    fn test_terms_resolved_by_taxonomy_not_position() {
        // Tags listed first: the taxonomy field wins over group position.
        let groups = vec![
            vec![Term {
                id: 7,
                name: "LED".to_string(),
                taxonomy: TAXONOMY_TAG.to_string(),
                ..Term::default()
            }],
            vec![Term {
                id: 3,
                name: "Harry Potter".to_string(),
                taxonomy: TAXONOMY_CATEGORY.to_string(),
                ..Term::default()
            }],
        ];
        let terms = EmbeddedTerms::from_groups(groups);
        assert_eq!(terms.categories()[0].id, 3);
        assert_eq!(terms.tags()[0].id, 7);
    }

    #[test]
    fn test_term_count_and_parent_are_optional() {
        let full: Term = serde_json::from_value(json!({
            "id": 4,
            "name": "Vending",
            "slug": "vending",
            "taxonomy": "category",
            "count": 12,
            "parent": 3
        }))
        .unwrap();
        assert_eq!(full.count, 12);
        assert_eq!(full.parent, 3);

        let embedded: Term = serde_json::from_value(json!({ "id": 7, "name": "LED" })).unwrap();
        assert_eq!(embedded.count, 0);
        assert_eq!(embedded.parent, 0);
    }

    #[test]
    fn test_terms_without_taxonomy_fall_back_to_position() {
        let groups = vec![
            vec![Term {
                id: 3,
                ..Term::default()
            }],
            vec![Term {
                id: 7,
                ..Term::default()
            }],
            vec![Term {
                id: 99,
                ..Term::default()
            }],
        ];
        let terms = EmbeddedTerms::from_groups(groups);
        assert_eq!(terms.categories()[0].id, 3);
        assert_eq!(terms.tags()[0].id, 7);
        assert!(terms.taxonomy("product_type").is_empty());
    }

    #[test]
    fn test_meta_shapes() {
        let empty_list: PostMeta = serde_json::from_value(json!([])).unwrap();
        assert!(empty_list.is_empty());
        assert_eq!(empty_list.pdf_url(), None);

        let listed: PostMeta =
            serde_json::from_value(json!([{"pdf_url": "https://cdn/a.pdf"}])).unwrap();
        assert_eq!(listed.pdf_url(), Some("https://cdn/a.pdf"));

        let blank: PostMeta = serde_json::from_value(json!({"pdf_url": "  "})).unwrap();
        assert_eq!(blank.pdf_url(), None);

        let not_string: PostMeta = serde_json::from_value(json!({"pdf_url": 12})).unwrap();
        assert_eq!(not_string.pdf_url(), None);

        assert!(serde_json::from_value::<PostMeta>(json!("oops")).is_err());
    }

    #[test]
    fn test_minimal_post_without_embedding() {
        let post: Post = serde_json::from_value(json!({"id": 5, "meta": []})).unwrap();
        assert!(post.embedded.is_none());
        assert!(post.category_terms().is_empty());
        assert!(post.replies().is_empty());
        assert_eq!(post.featured_image_url(), None);
        assert_eq!(post.published_at(), None);
    }

    #[test]
    fn test_embedded_error_objects_still_parse() {
        let post: Post = serde_json::from_value(json!({
            "id": 6,
            "_embedded": {
                "wp:featuredmedia": [{"code": "rest_forbidden", "message": "Sorry", "data": {"status": 403}}],
                "author": [{"code": "rest_user_invalid_id"}]
            }
        }))
        .unwrap();
        assert_eq!(post.featured_image_url(), None);
        assert_eq!(post.author_profile().map(|a| a.id), Some(0));
    }

    #[test]
    fn test_replies_are_flattened() {
        let post: Post = serde_json::from_value(json!({
            "id": 6,
            "_embedded": {
                "replies": [[
                    {"id": 1, "post": 6, "author_name": "A", "content": {"rendered": "<p>hi</p>"}},
                    {"id": 2, "post": 6, "parent": 1, "author_name": "B"}
                ]]
            }
        }))
        .unwrap();
        assert_eq!(post.replies().len(), 2);
        assert_eq!(post.replies()[1].parent, 1);
    }

    #[test]
    fn test_avatar_url_selection() {
        let post: Post = serde_json::from_value(embedded_post()).unwrap();
        let author = post.author_profile().unwrap();
        assert_eq!(author.avatar_url(24), Some("https://gravatar/24"));
        // No 48px rendition: the largest is used.
        assert_eq!(author.avatar_url(48), Some("https://gravatar/96"));
        assert_eq!(Author::default().avatar_url(96), None);
    }

    #[test]
    fn test_media_size_fallback() {
        let post: Post = serde_json::from_value(embedded_post()).unwrap();
        let media = &post.embedded.as_ref().unwrap().featured_media[0];
        assert_eq!(media.size_url("medium"), "https://cdn.example.com/p90701-300.jpg");
        assert_eq!(media.size_url("large"), "https://cdn.example.com/p90701.jpg");
    }

    #[test]
    fn test_serialized_post_uses_plain_embedded_key() {
        let post: Post = serde_json::from_value(embedded_post()).unwrap();
        let out = serde_json::to_value(&post).unwrap();
        assert!(out.get("_embedded").is_none());
        assert_eq!(out["embedded"]["terms"]["category"][0]["id"], 3);
    }
}
