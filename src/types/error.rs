use thiserror::Error;

/// Possible errors when interacting with `clawmark_routing`.
///
/// Note that failures caused by untrusted remote input (unreachable hosts,
/// malformed declarations, refused fetches) never surface here. They degrade
/// to `None` so the resolver falls through to the next priority tier. The
/// variants below are construction-time programmer errors only.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The reqwest client for the safe fetcher could not be created
    #[error("Failed to build the request client for declaration fetching")]
    BuildRequestClient(#[from] reqwest::Error),
    /// The given string cannot be parsed into a valid URL
    #[error("Cannot parse `{0}` as a URL: {1}")]
    ParseUrl(String, url::ParseError),
}

impl From<(String, url::ParseError)> for ErrorKind {
    fn from(value: (String, url::ParseError)) -> Self {
        Self::ParseUrl(value.0, value.1)
    }
}
