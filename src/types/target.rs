use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which priority tier produced a [`ResolvedTarget`].
///
/// Recorded for observability and tie-break auditing; delivery adapters can
/// (but need not) branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMethod {
    /// The project owner's declaration won
    TargetDeclaration,
    /// A matching user rule won
    UserRule,
    /// Auto-detected from a GitHub source URL
    GithubAuto,
    /// The user's own default rule
    UserDefault,
    /// The configured (or hard-coded) system fallback
    SystemDefault,
}

impl Display for ResolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TargetDeclaration => "target_declaration",
            Self::UserRule => "user_rule",
            Self::GithubAuto => "github_auto",
            Self::UserDefault => "user_default",
            Self::SystemDefault => "system_default",
        };
        f.write_str(name)
    }
}

/// One resolved destination for an annotation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedTarget {
    /// Adapter type of the destination (e.g. `github-issue`, `webhook`)
    pub target_type: String,
    /// Opaque adapter configuration, consumed by delivery adapters
    pub target_config: Value,
    /// Id of the rule that matched, if a user rule produced this target
    pub matched_rule: Option<i64>,
    /// Provenance of this target in the priority chain
    pub method: ResolveMethod,
}

impl ResolvedTarget {
    /// Normalized identity used to collapse duplicates in fan-out
    /// resolution. Two `github-issue` targets naming the same repository
    /// share an identity even when one spells it `target` and the other
    /// `repo`; delivery layers can also key retries on this.
    #[must_use]
    pub fn identity(&self) -> String {
        let ident = match self.target_type.as_str() {
            "github-issue" => self
                .target_config
                .get("target")
                .or_else(|| self.target_config.get("repo"))
                .and_then(Value::as_str)
                .map(str::to_lowercase),
            "webhook" => self
                .target_config
                .get("endpoint")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => ["chat_id", "channel", "webhook_url", "token"]
                .iter()
                .find_map(|&field| self.target_config.get(field))
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        // Fall back to the canonical JSON of the whole config, so targets
        // with unknown shapes still dedup on exact equality
        let ident = ident.unwrap_or_else(|| self.target_config.to_string());
        format!("{}:{ident}", self.target_type)
    }
}

/// The caller-supplied system-wide fallback destination
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemDefault {
    /// `owner/repo` slug of the fallback repository
    pub repo: String,
    /// Labels applied to issues created via the fallback
    #[serde(default)]
    pub labels: Vec<String>,
    /// Assignees for issues created via the fallback
    #[serde(default)]
    pub assignees: Vec<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{ResolveMethod, ResolvedTarget};

    #[test]
    fn test_method_display_matches_serde() {
        for method in [
            ResolveMethod::TargetDeclaration,
            ResolveMethod::UserRule,
            ResolveMethod::GithubAuto,
            ResolveMethod::UserDefault,
            ResolveMethod::SystemDefault,
        ] {
            let serialized = serde_json::to_value(method).unwrap();
            assert_eq!(serialized, json!(method.to_string()));
        }
    }

    #[test]
    fn test_identity_normalizes_repo_spelling() {
        let from_rule = ResolvedTarget {
            target_type: "github-issue".to_string(),
            target_config: json!({ "target": "Coco-XYZ/Clawmark" }),
            matched_rule: Some(1),
            method: ResolveMethod::UserRule,
        };
        let from_auto = ResolvedTarget {
            target_type: "github-issue".to_string(),
            target_config: json!({ "repo": "coco-xyz/clawmark", "labels": ["clawmark"] }),
            matched_rule: None,
            method: ResolveMethod::GithubAuto,
        };

        assert_eq!(from_rule.identity(), from_auto.identity());
    }

    #[test]
    fn test_identity_distinguishes_adapters() {
        let issue = ResolvedTarget {
            target_type: "github-issue".to_string(),
            target_config: json!({ "target": "coco-xyz/clawmark" }),
            matched_rule: None,
            method: ResolveMethod::GithubAuto,
        };
        let chat = ResolvedTarget {
            target_type: "telegram".to_string(),
            target_config: json!({ "chat_id": "coco-xyz/clawmark" }),
            matched_rule: None,
            method: ResolveMethod::UserRule,
        };

        assert_ne!(issue.identity(), chat.identity());
    }
}
