use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a user-defined routing rule, deciding which part of an
/// annotation its pattern is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Glob-style match against the annotated page URL
    UrlPattern,
    /// Exact match against the annotation type (e.g. `comment`, `issue`)
    ContentType,
    /// Match when the pattern is one of the annotation's tags
    TagMatch,
    /// The user's personal fallback; has no pattern and only applies when
    /// nothing else matched
    Default,
}

/// A user-defined routing rule.
///
/// Rules are owned by the management surface and read-only here. The store
/// hands them over pre-sorted by `priority` descending, ties broken by
/// creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Rule identifier, referenced by [`ResolvedTarget::matched_rule`]
    ///
    /// [`ResolvedTarget::matched_rule`]: crate::ResolvedTarget
    pub id: i64,
    /// User who owns this rule. Rules never apply across users.
    pub owner: String,
    /// What the pattern is matched against
    pub kind: RuleKind,
    /// Match pattern; `None` for [`RuleKind::Default`] rules
    pub pattern: Option<String>,
    /// Adapter type of the destination (e.g. `github-issue`, `webhook`)
    pub target_type: String,
    /// Opaque adapter configuration, passed through to delivery
    pub target_config: Value,
    /// Higher priority wins
    pub priority: i64,
    /// Disabled rules are never matched
    pub enabled: bool,
}

/// Collaborator interface to the rule storage.
///
/// Implementations must return the user's rules sorted by `priority`
/// descending (stable with respect to creation order).
pub trait RuleStore {
    /// All routing rules owned by `user`, highest priority first
    fn rules_for(&self, user: &str) -> Vec<RoutingRule>;
}

impl RuleStore for Vec<RoutingRule> {
    fn rules_for(&self, user: &str) -> Vec<RoutingRule> {
        self.iter().filter(|r| r.owner == user).cloned().collect()
    }
}
