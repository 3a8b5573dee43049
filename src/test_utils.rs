//! Shared helpers for unit tests.

use serde_json::json;

use crate::{AdapterConfig, Annotation, RoutingRule, RuleKind, TargetDeclaration};

/// Annotation with the given source URL and user, default type and no tags
pub(crate) fn annotation(source_url: &str, user_name: &str) -> Annotation {
    Annotation::builder()
        .source_url(source_url)
        .user_name(user_name)
        .build()
}

/// Enabled `url_pattern` rule routing to a per-rule webhook endpoint
pub(crate) fn url_rule(id: i64, owner: &str, pattern: &str, priority: i64) -> RoutingRule {
    RoutingRule {
        id,
        owner: owner.to_string(),
        kind: RuleKind::UrlPattern,
        pattern: Some(pattern.to_string()),
        target_type: "webhook".to_string(),
        target_config: json!({ "endpoint": format!("https://hooks.example.com/{id}") }),
        priority,
        enabled: true,
    }
}

/// Minimal valid github-issue declaration for the given repo slug
pub(crate) fn github_declaration(target: &str) -> TargetDeclaration {
    TargetDeclaration {
        config: AdapterConfig::GithubIssue {
            target: target.to_string(),
            labels: vec!["clawmark".to_string()],
            assignees: vec![],
        },
        types: None,
        js_injection_allowed: true,
    }
}
