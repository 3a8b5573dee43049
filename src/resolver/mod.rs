//! The priority-chain rule resolver.
//!
//! Five tiers, strictly ordered: a project owner's declaration beats the
//! user's own rules, which beat GitHub auto-detection, which beats the
//! user's default rule, which beats the system fallback. [`Router::resolve_target`]
//! stops at the first tier that produces a target; [`Router::resolve_targets`]
//! collects every matching destination for fan-out delivery.

mod declaration;

pub use declaration::DeclarationResolver;

use log::debug;
use serde_json::json;

use crate::{
    Annotation, GithubRepo, ResolveMethod, ResolvedTarget, RoutingRule, RuleKind, RuleStore,
    SystemDefault, TargetDeclaration, pattern,
};

/// Repository receiving annotations when no fallback was configured at all
const FALLBACK_REPO: &str = "coco-xyz/clawmark";
/// Label applied by GitHub auto-detection and the hard-coded fallback
const DEFAULT_LABEL: &str = "clawmark";

/// Resolves annotations to their delivery destinations.
///
/// Stateless apart from the configured system fallback; rules are supplied
/// per call (pre-sorted by priority descending) and declarations are an
/// optional caller-supplied override, typically obtained from a
/// [`DeclarationResolver`].
#[derive(Clone, Debug, Default)]
pub struct Router {
    default_target: Option<SystemDefault>,
}

impl Router {
    /// Router with the given system-wide fallback destination
    #[must_use]
    pub fn new(default_target: Option<SystemDefault>) -> Self {
        Self { default_target }
    }

    /// Resolve exactly one destination, stopping at the first matching tier.
    ///
    /// Rules not owned by the annotation's user are never considered,
    /// whatever their kind.
    #[must_use]
    pub fn resolve_target(
        &self,
        annotation: &Annotation,
        rules: &[RoutingRule],
        declaration: Option<&TargetDeclaration>,
    ) -> ResolvedTarget {
        if let Some(declaration) = declaration {
            debug!("resolved via declaration for {}", annotation.source_url);
            return declaration_target(declaration);
        }

        for rule in applicable_rules(rules, annotation) {
            if rule_matches(rule, annotation) {
                debug!("resolved via rule {} for {}", rule.id, annotation.source_url);
                return rule_target(rule, ResolveMethod::UserRule);
            }
        }

        if let Some(repo) = GithubRepo::extract(&annotation.source_url) {
            debug!("resolved via github auto-detection for {}", annotation.source_url);
            return github_auto_target(&repo);
        }

        if let Some(rule) = user_default_rule(rules, annotation) {
            debug!("resolved via user default for {}", annotation.user_name);
            return rule_target(rule, ResolveMethod::UserDefault);
        }

        debug!("resolved via system default for {}", annotation.source_url);
        self.system_default_target()
    }

    /// Resolve every destination for fan-out delivery.
    ///
    /// Collects the declaration (first), *all* matching user rules and the
    /// GitHub auto-detect target, then collapses duplicates by normalized
    /// target identity, keeping the earlier (higher-priority) entry. Only
    /// when nothing was collected does exactly one fallback target (user
    /// default, else system default) apply.
    #[must_use]
    pub fn resolve_targets(
        &self,
        annotation: &Annotation,
        rules: &[RoutingRule],
        declaration: Option<&TargetDeclaration>,
    ) -> Vec<ResolvedTarget> {
        let mut targets = Vec::new();

        if let Some(declaration) = declaration {
            targets.push(declaration_target(declaration));
        }

        for rule in applicable_rules(rules, annotation) {
            if rule_matches(rule, annotation) {
                targets.push(rule_target(rule, ResolveMethod::UserRule));
            }
        }

        if let Some(repo) = GithubRepo::extract(&annotation.source_url) {
            targets.push(github_auto_target(&repo));
        }

        dedup_by_identity(&mut targets);

        if targets.is_empty() {
            let fallback = match user_default_rule(rules, annotation) {
                Some(rule) => rule_target(rule, ResolveMethod::UserDefault),
                None => self.system_default_target(),
            };
            targets.push(fallback);
        }

        targets
    }

    /// [`Router::resolve_target`] with the rules pulled from the store
    #[must_use]
    pub fn resolve_for_user(
        &self,
        store: &dyn RuleStore,
        annotation: &Annotation,
        declaration: Option<&TargetDeclaration>,
    ) -> ResolvedTarget {
        let rules = store.rules_for(&annotation.user_name);
        self.resolve_target(annotation, &rules, declaration)
    }

    /// [`Router::resolve_targets`] with the rules pulled from the store
    #[must_use]
    pub fn resolve_all_for_user(
        &self,
        store: &dyn RuleStore,
        annotation: &Annotation,
        declaration: Option<&TargetDeclaration>,
    ) -> Vec<ResolvedTarget> {
        let rules = store.rules_for(&annotation.user_name);
        self.resolve_targets(annotation, &rules, declaration)
    }

    fn system_default_target(&self) -> ResolvedTarget {
        let target_config = match &self.default_target {
            Some(default) => json!({
                "repo": default.repo,
                "labels": default.labels,
                "assignees": default.assignees,
            }),
            None => json!({
                "repo": FALLBACK_REPO,
                "labels": [DEFAULT_LABEL],
                "assignees": [],
            }),
        };

        ResolvedTarget {
            target_type: "github-issue".to_string(),
            target_config,
            matched_rule: None,
            method: ResolveMethod::SystemDefault,
        }
    }
}

/// Enabled, same-tenant rules in their supplied (priority) order
fn applicable_rules<'a>(
    rules: &'a [RoutingRule],
    annotation: &'a Annotation,
) -> impl Iterator<Item = &'a RoutingRule> {
    rules
        .iter()
        .filter(move |rule| rule.enabled && rule.owner == annotation.user_name)
}

fn user_default_rule<'a>(
    rules: &'a [RoutingRule],
    annotation: &Annotation,
) -> Option<&'a RoutingRule> {
    rules
        .iter()
        .find(|rule| rule.enabled && rule.owner == annotation.user_name && rule.kind == RuleKind::Default)
}

fn rule_matches(rule: &RoutingRule, annotation: &Annotation) -> bool {
    let Some(pattern) = rule.pattern.as_deref() else {
        return false;
    };
    match rule.kind {
        RuleKind::UrlPattern => pattern::matches(&annotation.source_url, pattern),
        RuleKind::ContentType => pattern == annotation.kind,
        RuleKind::TagMatch => annotation.tags.iter().any(|tag| tag == pattern),
        // Default rules only apply as the fourth tier, never as a match
        RuleKind::Default => false,
    }
}

fn rule_target(rule: &RoutingRule, method: ResolveMethod) -> ResolvedTarget {
    ResolvedTarget {
        target_type: rule.target_type.clone(),
        target_config: rule.target_config.clone(),
        matched_rule: Some(rule.id),
        method,
    }
}

fn declaration_target(declaration: &TargetDeclaration) -> ResolvedTarget {
    ResolvedTarget {
        target_type: declaration.target_type().to_string(),
        target_config: declaration.to_config(),
        matched_rule: None,
        method: ResolveMethod::TargetDeclaration,
    }
}

fn github_auto_target(repo: &GithubRepo) -> ResolvedTarget {
    ResolvedTarget {
        target_type: "github-issue".to_string(),
        target_config: json!({
            "repo": repo.slug(),
            "labels": [DEFAULT_LABEL],
        }),
        matched_rule: None,
        method: ResolveMethod::GithubAuto,
    }
}

/// Collapse targets sharing a normalized identity, preferring the earlier
/// (higher-priority) entry
fn dedup_by_identity(targets: &mut Vec<ResolvedTarget>) {
    let mut seen = std::collections::HashSet::new();
    targets.retain(|target| seen.insert(target.identity()));
}
