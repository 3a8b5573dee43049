//! End-to-end resolution: declaration discovery over the network feeding
//! the priority chain.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clawmark_routing::{
    Annotation, DeclarationCache, DeclarationResolver, FetcherBuilder, ResolveMethod, Router,
    RoutingRule, RuleKind,
};

fn resolver_against(server_uri: &str) -> DeclarationResolver {
    let fetcher = FetcherBuilder::builder()
        .require_https(false)
        .block_private_ips(false)
        .build()
        .fetcher()
        .expect("fetcher should build");
    DeclarationResolver::new(fetcher, Arc::new(DeclarationCache::default()))
        .with_raw_content_base(url::Url::parse(server_uri).expect("server URI should parse"))
}

fn url_rule(id: i64, owner: &str, pattern: &str, priority: i64) -> RoutingRule {
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

fn annotation(source_url: &str) -> Annotation {
    Annotation::builder()
        .source_url(source_url)
        .user_name("alice")
        .build()
}

#[tokio::test]
async fn discovered_declaration_overrides_user_rule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coco-xyz/clawmark/main/.clawmark.yml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "adapter: github-issue\ntarget: coco-xyz/clawmark\nlabels:\n  - feedback\n",
        ))
        .mount(&server)
        .await;

    let declaration = resolver_against(&server.uri())
        .resolve("https://github.com/coco-xyz/clawmark/issues/1")
        .await;
    assert!(declaration.is_some());

    let router = Router::default();
    let rules = vec![url_rule(1, "alice", "*github.com*", 10)];
    let target = router.resolve_target(
        &annotation("https://github.com/coco-xyz/clawmark/issues/1"),
        &rules,
        declaration.as_ref(),
    );

    assert_eq!(target.method, ResolveMethod::TargetDeclaration);
    assert_eq!(target.target_config["target"], "coco-xyz/clawmark");
    assert_eq!(target.target_config["labels"], json!(["feedback"]));
}

#[tokio::test]
async fn missing_declaration_falls_through_to_rules() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let declaration = resolver_against(&server.uri())
        .resolve("https://github.com/coco-xyz/clawmark")
        .await;
    assert_eq!(declaration, None);

    let router = Router::default();
    let rules = vec![url_rule(1, "alice", "*github.com*", 10)];
    let target = router.resolve_target(
        &annotation("https://github.com/coco-xyz/clawmark"),
        &rules,
        declaration.as_ref(),
    );

    assert_eq!(target.method, ResolveMethod::UserRule);
    assert_eq!(target.matched_rule, Some(1));
}

#[tokio::test]
async fn fan_out_combines_declaration_rules_and_auto_detect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coco-xyz/clawmark/main/.clawmark.yml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("adapter: telegram\nchat_id: 12345\nbot_token: t0k3n\n"),
        )
        .mount(&server)
        .await;

    let source = "https://github.com/coco-xyz/clawmark/pull/2";
    let declaration = resolver_against(&server.uri()).resolve(source).await;

    let router = Router::default();
    let rules = vec![url_rule(1, "alice", "*github.com*", 10)];
    let targets = router.resolve_targets(&annotation(source), &rules, declaration.as_ref());

    // Declaration first, then the webhook rule, then GitHub auto-detection;
    // all three are distinct destinations
    assert_eq!(targets.len(), 3);
    assert_eq!(targets[0].method, ResolveMethod::TargetDeclaration);
    assert_eq!(targets[0].target_type, "telegram");
    assert_eq!(targets[1].method, ResolveMethod::UserRule);
    assert_eq!(targets[2].method, ResolveMethod::GithubAuto);
}

#[tokio::test]
async fn declaration_fetch_tolerates_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coco-xyz/moved/main/.clawmark.yml"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/coco-xyz/renamed/main/.clawmark.yml"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coco-xyz/renamed/main/.clawmark.yml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("adapter: github-issue\ntarget: coco-xyz/renamed\n"),
        )
        .mount(&server)
        .await;

    let declaration = resolver_against(&server.uri())
        .resolve("https://github.com/coco-xyz/moved")
        .await
        .expect("redirected declaration should resolve");
    assert_eq!(declaration.target_type(), "github-issue");
}
