//! WordPress REST API v2 client.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod models;
pub mod query;

pub use cache::{Freshness, ResponseCache};
pub use error::GatewayError;
pub use gateway::ContentGateway;
pub use models::{
    Author, Category, CategoryList, Comment, CommentWithPost, Embedded, EmbeddedTerms, Media,
    Paginated, Post, PostMeta, PostPage, Rendered, Tag, TagList, Term,
};
pub use query::{Order, OrderBy, PostQuery};
