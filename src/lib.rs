//! `clawmark_routing` decides where a web-page annotation gets delivered.
//!
//! For every annotation it resolves one or more destinations by walking a
//! fixed priority chain: the annotated project's own declaration
//! (`.clawmark.yml` / `/.well-known/clawmark.json`), then the user's routing
//! rules, then GitHub auto-detection, then the user's default rule, then the
//! system fallback.
//!
//! Rule resolution is pure and synchronous:
//!
//! ```
//! use clawmark_routing::{Annotation, ResolveMethod, Router};
//!
//! let router = Router::default();
//! let annotation = Annotation::builder()
//!     .source_url("https://github.com/coco-xyz/clawmark/issues/1")
//!     .user_name("alice")
//!     .build();
//!
//! let target = router.resolve_target(&annotation, &[], None);
//! assert_eq!(target.method, ResolveMethod::GithubAuto);
//! ```
//!
//! Declaration discovery is the one asynchronous, networked piece. It is
//! SSRF-guarded and cached; failures of any kind simply mean "no
//! declaration":
//!
//! ```no_run
//! use std::sync::Arc;
//! use clawmark_routing::{DeclarationCache, DeclarationResolver, FetcherBuilder, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = Arc::new(DeclarationCache::default());
//!     let resolver = DeclarationResolver::new(FetcherBuilder::default().fetcher()?, cache);
//!     let declaration = resolver.resolve("https://github.com/coco-xyz/clawmark").await;
//!     println!("{declaration:?}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod cache;
mod fetcher;
mod resolver;
mod types;
mod validate;

pub mod pattern;

#[cfg(test)]
pub mod test_utils;

pub use cache::{CACHE_MAX_SIZE, CacheConfig, CacheEntry, DeclarationCache, NEGATIVE_TTL, POSITIVE_TTL};
pub use fetcher::{
    DEFAULT_FETCH_TIMEOUT, FetcherBuilder, MAX_DECLARATION_BYTES, MAX_REDIRECTS, SafeFetcher,
    is_private_ip,
};
pub use resolver::{DeclarationResolver, Router};
pub use types::*;
pub use validate::validate_declaration;
