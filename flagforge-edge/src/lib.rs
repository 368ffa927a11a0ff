//! Edge Identity Store for Flagforge
//!
//! Projects serving traffic close to their users keep identities and
//! traits in a replicated edge store instead of the primary database.
//! This crate defines the adapter seam for such a store: identity reads
//! and writes keyed by environment, cursor-paginated search, and a
//! bridge that lets the resolution engine consume any edge store as its
//! identity source. The store's replication lag is its own business —
//! the engine treats what it returns as possibly stale but never mixes
//! it with another source.
//!
//! # Example
//!
//! ```
//! use flagforge_core::Identity;
//! use flagforge_edge::{EdgeStore, InMemoryEdgeStore, PageRequest, SearchQuery};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryEdgeStore::new();
//! store
//!     .put_identity("env-key", Identity::new("user-1").with_trait("plan", "pro"))
//!     .await
//!     .unwrap();
//!
//! let identity = store.get_identity("env-key", "user-1").await.unwrap();
//! assert!(identity.is_some());
//!
//! let page = store
//!     .search("env-key", &SearchQuery::parse("user"), &PageRequest::default())
//!     .await
//!     .unwrap();
//! assert_eq!(page.identities.len(), 1);
//! # });
//! ```

pub mod source;
pub mod store;

pub use source::EdgeIdentitySource;
pub use store::{
    EdgeStore, EdgeStoreError, IdentityPage, InMemoryEdgeStore, PageRequest, SearchQuery,
};

/// Result type for edge store operations
pub type Result<T> = std::result::Result<T, EdgeStoreError>;
