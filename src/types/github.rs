use std::{collections::HashSet, fmt::Display, sync::LazyLock};

use url::Url;

/// GitHub platform paths which occupy the first URL segment but are not
/// user or organization namespaces. A URL like `github.com/settings/profile`
/// must never be treated as the repository `settings/profile`.
static RESERVED_OWNERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from_iter([
        "settings",
        "orgs",
        "marketplace",
        "explore",
        "topics",
        "trending",
        "collections",
        "events",
        "sponsors",
        "notifications",
        "new",
        "login",
        "signup",
        "features",
        "security",
        "pricing",
        "enterprise",
    ])
});

/// Owner and repository name extracted from a GitHub URL
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GithubRepo {
    /// User or organization name
    pub owner: String,
    /// Repository name, with any `.git` suffix stripped
    pub repo: String,
}

impl GithubRepo {
    #[cfg(test)]
    pub(crate) fn new<T: Into<String>>(owner: T, repo: T) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Extract `owner/repo` from a GitHub URL, regardless of any trailing
    /// path (issues, pulls, blobs, ...).
    ///
    /// Returns `None` for non-GitHub hosts and for reserved platform paths.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        if !matches!(url.host_str()?, "github.com" | "www.github.com") {
            return None;
        }

        let mut segments = url.path_segments()?;
        let owner = segments.next().filter(|s| !s.is_empty())?;
        if RESERVED_OWNERS.contains(owner) {
            return None;
        }

        let repo = segments.next().filter(|s| !s.is_empty())?;
        // Strip the suffix of clone-style URLs like
        // `github.com/coco-xyz/clawmark.git`
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Convenience wrapper around [`GithubRepo::from_url`] for raw strings.
    /// Unparseable URLs yield `None`.
    #[must_use]
    pub fn extract(url: &str) -> Option<Self> {
        Self::from_url(&Url::parse(url).ok()?)
    }

    /// The `owner/repo` slug as used in declaration targets and cache keys
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl Display for GithubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
