//! Validation of untrusted declaration payloads.
//!
//! The input is an already-parsed YAML or JSON document from a remote,
//! attacker-influenceable source. Only allow-listed adapters and fields make
//! it into the typed [`TargetDeclaration`]; everything else is dropped.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde_json::Value;
use url::{Host, Url};

use crate::{AdapterConfig, ChatAdapter, TargetDeclaration};

/// Maximum number of labels copied from a declaration
const MAX_LABELS: usize = 10;
/// Maximum number of assignees copied from a declaration
const MAX_ASSIGNEES: usize = 5;
/// Maximum number of annotation types copied from a declaration
const MAX_TYPES: usize = 10;

/// Label applied when a declaration names none
const DEFAULT_LABEL: &str = "clawmark";

/// Configuration fields copied verbatim for chat-style adapters. Anything
/// not listed here is discarded, so a declaration cannot smuggle fields
/// into delivery adapters.
const CHAT_SAFE_FIELDS: &[&str] = &["webhook_url", "chat_id", "channel", "token", "bot_token"];

/// `js_injection` spellings treated as "off". Anything else, including
/// typos, leaves injection allowed: a mangled declaration must not silently
/// block annotation capture. Fail-open here is a deliberate product
/// decision, not an oversight.
const JS_INJECTION_FALSY: &[&str] = &["false", "no"];

static GITHUB_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("github target pattern is valid")
});

/// Validate a parsed declaration document into a [`TargetDeclaration`].
///
/// Returns `None` for anything that is not an object with a known adapter
/// and the adapter's required fields. Never panics or errors on malformed
/// input.
#[must_use]
pub fn validate_declaration(raw: &Value) -> Option<TargetDeclaration> {
    let object = raw.as_object()?;

    let adapter = canonical_adapter(object.get("adapter")?.as_str()?);
    let config = match adapter {
        "github-issue" => github_issue_config(object)?,
        "webhook" => webhook_config(object)?,
        name => chat_config(ChatAdapter::from_name(name)?, object),
    };

    Some(TargetDeclaration {
        config,
        types: string_list(object.get("types"), MAX_TYPES),
        js_injection_allowed: js_injection_allowed(object.get("js_injection")),
    })
}

/// Normalize adapter aliases to their canonical names
fn canonical_adapter(name: &str) -> &str {
    match name {
        "github-issues" => "github-issue",
        other => other,
    }
}

fn github_issue_config(object: &serde_json::Map<String, Value>) -> Option<AdapterConfig> {
    let target = object.get("target")?.as_str()?;
    if !GITHUB_TARGET.is_match(target) {
        log::debug!("declaration rejected: malformed github target `{target}`");
        return None;
    }

    let labels = string_list(object.get("labels"), MAX_LABELS)
        .filter(|labels| !labels.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_LABEL.to_string()]);
    let assignees = string_list(object.get("assignees"), MAX_ASSIGNEES).unwrap_or_default();

    Some(AdapterConfig::GithubIssue {
        target: target.to_string(),
        labels,
        assignees,
    })
}

fn webhook_config(object: &serde_json::Map<String, Value>) -> Option<AdapterConfig> {
    let endpoint = Url::parse(object.get("endpoint")?.as_str()?).ok()?;
    if endpoint.scheme() != "https" {
        log::debug!("declaration rejected: webhook endpoint is not https");
        return None;
    }
    let loopback = match endpoint.host()? {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(addr) => addr.is_loopback() || addr.is_unspecified(),
        Host::Ipv6(addr) => addr.is_loopback() || addr.is_unspecified(),
    };
    if loopback {
        log::debug!("declaration rejected: webhook endpoint points at loopback");
        return None;
    }

    Some(AdapterConfig::Webhook { endpoint })
}

/// Chat adapters carry only the flat safe-field copy. Missing fields are
/// fine; their plausibility is the delivery adapter's concern.
fn chat_config(adapter: ChatAdapter, object: &serde_json::Map<String, Value>) -> AdapterConfig {
    let mut fields = BTreeMap::new();
    for &field in CHAT_SAFE_FIELDS {
        match object.get(field) {
            Some(Value::String(s)) => {
                fields.insert(field.to_string(), s.clone());
            }
            Some(Value::Number(n)) => {
                fields.insert(field.to_string(), n.to_string());
            }
            _ => {}
        }
    }
    AdapterConfig::Chat { adapter, fields }
}

/// Copy up to `cap` string entries out of an array value; non-strings are
/// skipped, non-arrays yield `None`
fn string_list(value: Option<&Value>, cap: usize) -> Option<Vec<String>> {
    Some(
        value?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .take(cap)
            .map(str::to_string)
            .collect(),
    )
}

fn js_injection_allowed(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(allowed)) => *allowed,
        Some(Value::String(s)) => !JS_INJECTION_FALSY
            .iter()
            .any(|falsy| s.eq_ignore_ascii_case(falsy)),
        _ => true,
    }
}
