//! End-to-end research runs against a mocked SearXNG instance and a mocked
//! OpenAI-compatible generation endpoint.

use std::sync::Arc;

use serde_json::json;
use sift::config::GenerationConfig;
use sift::{
    MemorySessionStore, ModeRequest, ModeRouter, OpenAiGenerator, PipelineOutcome, Query,
    ResearchMode, ResearchPipeline, ResearchService, SiftConfig,
};
use sift_search::{ProviderKind, SearchConfig};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn searxng_body(prefix: &str) -> serde_json::Value {
    json!({
        "results": [
            {"title": format!("{prefix} on Wikipedia"), "url": format!("https://en.wikipedia.org/wiki/{prefix}"), "content": format!("{prefix} is a programming language used for web services")},
            {"title": format!("{prefix} docs"), "url": format!("https://docs.{prefix}.dev/intro"), "content": format!("Official {prefix} documentation for web services")},
            {"title": "Benchmarks", "url": "https://benchmarks.example.org/web", "content": "web services benchmark results comparing languages"},
        ]
    })
}

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

fn config(searxng: &MockServer, llm: &MockServer) -> SiftConfig {
    SiftConfig {
        search: SearchConfig {
            providers: vec![ProviderKind::SearXng],
            searxng_url: searxng.uri(),
            request_delay_ms: 0,
            cache_ttl_seconds: 0,
            timeout_seconds: 5,
            ..Default::default()
        },
        generation: GenerationConfig {
            base_url: llm.uri(),
            api_key: Some("test-key".into()),
            timeout_secs: 5,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn multi_hop_question_is_decomposed_and_ranked() {
    let searxng = MockServer::start().await;
    let llm = MockServer::start().await;

    for lang in ["Rust", "Go"] {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", format!("What is {lang} used for in web services?")))
            .respond_with(ResponseTemplate::new(200).set_body_json(searxng_body(lang)))
            .expect(1)
            .mount(&searxng)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Break down this complex question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "1. What is Rust used for in web services?\n2. What is Go used for in web services?",
        )))
        .expect(1)
        .mount(&llm)
        .await;

    let pipeline = ResearchPipeline::from_config(&config(&searxng, &llm)).expect("pipeline");
    let outcome = pipeline
        .process(&Query::new("Compare Rust and Go for web services"))
        .await
        .expect("process");

    let PipelineOutcome::Evidence(set) = outcome else {
        panic!("expected evidence");
    };
    assert!(set.diagnostics.multi_hop);
    assert_eq!(set.diagnostics.sub_queries.len(), 2);
    assert_eq!(set.diagnostics.failed_branches, 0);
    assert!(!set.diagnostics.fallback_used);
    assert_eq!(set.diagnostics.candidates_collected, 6);
    // The shared benchmark page collapses to one entry.
    assert_eq!(set.diagnostics.candidates_unique, 5);
    assert_eq!(set.selection.len(), 5);
    assert!(set.selection.iter().all(|c| (0.0..=1.0).contains(&c.credibility)));
    assert!(set.verdict.is_some());
    assert!(set.context_block().starts_with("Source 1 [Credibility: "));
}

#[tokio::test]
async fn unreachable_search_reports_no_information() {
    let searxng = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&searxng)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&llm)
        .await;

    let pipeline = ResearchPipeline::from_config(&config(&searxng, &llm)).expect("pipeline");
    let outcome = pipeline
        .process(&Query::new("What is the capital of France?"))
        .await
        .expect("process");

    assert!(outcome.is_empty());
    assert_eq!(outcome.diagnostics().candidates_collected, 0);
}

#[tokio::test]
async fn rejected_temperature_is_retried_with_defaults() {
    let searxng = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searxng_body("Rust")))
        .mount(&searxng)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("temperature"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Unsupported value: 'temperature' does not support 0.3"}
        })))
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "What is Rust used for in web services?\nWhat is Go used for in web services?",
        )))
        .mount(&llm)
        .await;

    let pipeline = ResearchPipeline::from_config(&config(&searxng, &llm)).expect("pipeline");
    let outcome = pipeline
        .process(&Query::new("Compare Rust and Go for web services"))
        .await
        .expect("process");

    assert_eq!(
        outcome.diagnostics().sub_queries,
        vec![
            "What is Rust used for in web services?",
            "What is Go used for in web services?"
        ]
    );
}

#[tokio::test]
async fn service_routes_borderline_question_through_generator() {
    let searxng = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searxng_body("Rust")))
        .mount(&searxng)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("SIMPLE or PRO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("SIMPLE")))
        .expect(1)
        .mount(&llm)
        .await;

    let config = config(&searxng, &llm);
    let generator: Arc<dyn sift::Generator> =
        Arc::new(OpenAiGenerator::new(&config.generation).expect("generator"));
    let pipeline = Arc::new(ResearchPipeline::from_config(&config).expect("pipeline"));
    let service = ResearchService::new(
        pipeline,
        ModeRouter::new(generator),
        Arc::new(MemorySessionStore::new()),
        config.pipeline.history_window,
    );

    let reply = service
        .research(Some("user-1"), "Rust async runtimes", ModeRequest::Auto)
        .await
        .expect("research");
    assert_eq!(reply.mode, ResearchMode::Simple);
    assert_eq!(reply.session_id, "user-1");
    let set = reply.outcome.evidence().expect("evidence");
    assert!(set.verdict.is_none());
    assert_eq!(set.display.len(), 3);
}
