use std::collections::BTreeMap;

use serde_json::{Value, json};
use url::Url;

/// Chat-style adapters whose configuration is an opaque safe-field copy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAdapter {
    /// Lark / Feishu group bot
    Lark,
    /// Telegram bot
    Telegram,
    /// Email delivery
    Email,
}

impl ChatAdapter {
    /// The adapter name as written in declaration documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lark => "lark",
            Self::Telegram => "telegram",
            Self::Email => "email",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "lark" => Some(Self::Lark),
            "telegram" => Some(Self::Telegram),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

/// Fully validated, per-adapter target configuration.
///
/// This is the only shape in which remote declaration content crosses into
/// the resolver: every variant is produced by the validator and carries
/// nothing but allow-listed fields.
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterConfig {
    /// File an issue on a GitHub repository
    GithubIssue {
        /// `owner/repo` slug
        target: String,
        /// Labels applied to created issues (at most 10)
        labels: Vec<String>,
        /// Users assigned to created issues (at most 5)
        assignees: Vec<String>,
    },
    /// POST the annotation to an HTTPS endpoint
    Webhook {
        /// Validated HTTPS endpoint, guaranteed not to point at loopback
        endpoint: Url,
    },
    /// Forward to a chat integration
    Chat {
        /// Which chat platform receives the annotation
        adapter: ChatAdapter,
        /// Safe-field copy (`webhook_url`, `chat_id`, `channel`, `token`,
        /// `bot_token`); values are opaque to this crate
        fields: BTreeMap<String, String>,
    },
}

/// A project owner's validated routing preference, derived from
/// `.clawmark.yml` or `/.well-known/clawmark.json`.
///
/// Immutable once constructed; rebuilt from the source document whenever the
/// cache entry for its key expires.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetDeclaration {
    /// Where annotations about the declaring site should go
    pub config: AdapterConfig,
    /// Annotation types the owner wants to receive (at most 10), `None`
    /// meaning all
    pub types: Option<Vec<String>>,
    /// Whether the owner permits script injection by the capture widget.
    /// Defaults to `true`; only the explicit falsy spellings turn it off.
    pub js_injection_allowed: bool,
}

impl TargetDeclaration {
    /// The adapter type string as consumed by delivery adapters
    #[must_use]
    pub const fn target_type(&self) -> &'static str {
        match &self.config {
            AdapterConfig::GithubIssue { .. } => "github-issue",
            AdapterConfig::Webhook { .. } => "webhook",
            AdapterConfig::Chat { adapter, .. } => adapter.as_str(),
        }
    }

    /// Render the typed configuration into the opaque JSON shape shared
    /// with user rules and delivery adapters
    #[must_use]
    pub fn to_config(&self) -> Value {
        match &self.config {
            AdapterConfig::GithubIssue {
                target,
                labels,
                assignees,
            } => json!({
                "target": target,
                "labels": labels,
                "assignees": assignees,
            }),
            AdapterConfig::Webhook { endpoint } => json!({
                "endpoint": endpoint.as_str(),
                "method": "POST",
            }),
            AdapterConfig::Chat { fields, .. } => json!(fields),
        }
    }
}
