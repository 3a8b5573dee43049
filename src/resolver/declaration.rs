//! Discovery of target declarations.
//!
//! A project owner states where annotations about their site should go in
//! `.clawmark.yml` at the root of their GitHub repository, or in
//! `/.well-known/clawmark.json` on their own origin. This resolver fetches,
//! validates and caches those documents; every failure mode collapses to
//! "no declaration".

use std::sync::{Arc, LazyLock};

use log::debug;
use serde_json::Value;
use url::Url;

use crate::{
    DeclarationCache, GithubRepo, SafeFetcher, TargetDeclaration, validate::validate_declaration,
};

/// Branches probed for `.clawmark.yml`, in order
const BRANCHES: [&str; 2] = ["main", "master"];

static RAW_CONTENT_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://raw.githubusercontent.com").expect("raw content base URL is valid")
});

/// Answers "does this URL's owner declare a preferred target?"
///
/// Orchestrates the [`SafeFetcher`], the [`DeclarationCache`] and the
/// declaration validator. The cache is shared: construct it once at process
/// start and hand a clone of the `Arc` to each resolver.
#[derive(Debug, Clone)]
pub struct DeclarationResolver {
    fetcher: SafeFetcher,
    cache: Arc<DeclarationCache>,
    raw_content_base: Url,
}

impl DeclarationResolver {
    /// Resolver backed by the given fetcher and shared cache
    #[must_use]
    pub fn new(fetcher: SafeFetcher, cache: Arc<DeclarationCache>) -> Self {
        Self {
            fetcher,
            cache,
            raw_content_base: RAW_CONTENT_BASE.clone(),
        }
    }

    /// Override the raw-content host, e.g. to point at a mock server
    #[must_use]
    pub fn with_raw_content_base(mut self, base: Url) -> Self {
        self.raw_content_base = base;
        self
    }

    /// Resolve the declaration governing `source_url`, if any.
    ///
    /// GitHub URLs are looked up via `.clawmark.yml` on the repository's
    /// default branch (`main`, then `master`); other HTTPS origins via
    /// `/.well-known/clawmark.json`. Outcomes are cached either way. A
    /// non-HTTPS or unparseable `source_url` short-circuits to `None`
    /// without any network activity.
    pub async fn resolve(&self, source_url: &str) -> Option<TargetDeclaration> {
        let url = Url::parse(source_url).ok()?;
        if url.scheme() != "https" {
            debug!("skipping declaration lookup for non-https source {source_url}");
            return None;
        }

        if let Some(repo) = GithubRepo::from_url(&url) {
            self.resolve_cached(format!("yml:{}", repo.slug()), self.fetch_github(&repo))
                .await
        } else if matches!(url.host_str(), Some("github.com" | "www.github.com")) {
            // A GitHub URL without an extractable repo (reserved paths,
            // bare profiles); github.com itself serves no well-known file
            None
        } else {
            let origin = url.origin().ascii_serialization();
            self.resolve_cached(format!("wk:{origin}"), self.fetch_well_known(&origin))
                .await
        }
    }

    async fn resolve_cached<F>(&self, key: String, fetch: F) -> Option<TargetDeclaration>
    where
        F: Future<Output = Option<TargetDeclaration>>,
    {
        if let Some(entry) = self.cache.get(&key) {
            debug!("declaration cache hit for `{key}`");
            return entry.value;
        }

        let declaration = fetch.await;
        let negative = declaration.is_none();
        self.cache.set(key, declaration.clone(), negative);
        declaration
    }

    async fn fetch_github(&self, repo: &GithubRepo) -> Option<TargetDeclaration> {
        for branch in BRANCHES {
            let path = format!("{}/{}/{branch}/.clawmark.yml", repo.owner, repo.repo);
            let url = self.raw_content_base.join(&path).ok()?;
            let Some(body) = self.fetcher.fetch(&url).await else {
                continue;
            };

            // Deserializing straight into a JSON value confines the document
            // to plain scalars, sequences and string-keyed maps; custom tags
            // and exotic node types fail the parse instead of instantiating
            // anything.
            return match serde_yaml::from_str::<Value>(&body) {
                Ok(parsed) => validate_declaration(&parsed),
                Err(e) => {
                    debug!("invalid .clawmark.yml for {repo}: {e}");
                    None
                }
            };
        }
        None
    }

    async fn fetch_well_known(&self, origin: &str) -> Option<TargetDeclaration> {
        let url = Url::parse(&format!("{origin}/.well-known/clawmark.json")).ok()?;
        let body = self.fetcher.fetch(&url).await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(parsed) => validate_declaration(&parsed),
            Err(e) => {
                debug!("invalid clawmark.json at {origin}: {e}");
                None
            }
        }
    }
}
