use craftcore::{
    CancellationToken, CredentialStore, EventBus, ExecutionContext, Executor, ExecutorError,
    PortIndex, RunId, Setting, Value,
};
use craftnodes::{
    BrandFormatExecutor, DelayExecutor, MarkdownExportExecutor, ResearchFetchExecutor,
    TextGenerateExecutor,
};
use craftruntime::ExecutorRegistry;
use std::collections::HashMap;
use std::sync::Arc;

// Helper to build a context the way the scheduler would
fn create_test_context(
    type_id: &str,
    inputs: HashMap<PortIndex, Value>,
    settings: HashMap<String, Setting>,
) -> ExecutionContext {
    let event_bus = EventBus::new(100);
    let node_id = "test-node".to_string();

    ExecutionContext {
        node_id: node_id.clone(),
        type_id: type_id.to_string(),
        inputs,
        settings,
        credentials: Arc::new(CredentialStore::new()),
        events: event_bus.create_emitter(RunId::new_v4(), node_id),
        cancellation: CancellationToken::new(),
    }
}

fn string_input(port: PortIndex, text: &str) -> HashMap<PortIndex, Value> {
    let mut inputs = HashMap::new();
    inputs.insert(port, Value::String(text.to_string()));
    inputs
}

fn setting(key: &str, value: impl Into<Setting>) -> HashMap<String, Setting> {
    let mut settings = HashMap::new();
    settings.insert(key.to_string(), value.into());
    settings
}

#[tokio::test]
async fn brand_format_defaults_to_formal_voice() {
    let ctx = create_test_context(
        "brand.format",
        string_input(0, "Our widget ships today."),
        HashMap::new(),
    );

    let outputs = BrandFormatExecutor.execute(ctx).await.unwrap();
    let text = outputs.ports.get(&0).and_then(|v| v.as_str()).unwrap();

    assert!(text.starts_with("To whom it may concern,"));
    assert!(text.contains("Our widget ships today."));
    assert!(text.contains("Kind regards,\nThe Brand Team"));
}

#[tokio::test]
async fn brand_format_punchy_voice_appends_call_to_action() {
    let mut settings = setting("voice", "Punchy");
    settings.insert("brand".to_string(), Setting::from("Acme"));
    let ctx = create_test_context("brand.format", string_input(0, "Big news."), settings);

    let outputs = BrandFormatExecutor.execute(ctx).await.unwrap();
    let text = outputs.ports.get(&0).and_then(|v| v.as_str()).unwrap();

    assert_eq!(text, "Big news.\n\nAcme. Act now.");
}

#[tokio::test]
async fn brand_format_requires_text_input() {
    let ctx = create_test_context("brand.format", HashMap::new(), HashMap::new());

    let outcome = BrandFormatExecutor.execute(ctx).await;
    assert!(matches!(outcome, Err(ExecutorError::MissingInput(0))));
}

#[tokio::test]
async fn export_markdown_orders_sections_by_port() {
    let mut inputs = HashMap::new();
    inputs.insert(2, Value::String("third".to_string()));
    inputs.insert(0, Value::String("first".to_string()));
    inputs.insert(1, Value::String("second".to_string()));
    let ctx = create_test_context("export.markdown", inputs, setting("title", "Digest"));

    let outputs = MarkdownExportExecutor.execute(ctx).await.unwrap();
    let document = outputs.ports.get(&0).and_then(|v| v.as_str()).unwrap();

    assert!(document.starts_with("# Digest\n"));
    let first = document.find("first").unwrap();
    let second = document.find("second").unwrap();
    let third = document.find("third").unwrap();
    assert!(first < second && second < third);
}

#[tokio::test]
async fn export_markdown_with_no_inputs_is_just_the_title() {
    let ctx = create_test_context("export.markdown", HashMap::new(), HashMap::new());

    let outputs = MarkdownExportExecutor.execute(ctx).await.unwrap();
    let document = outputs.ports.get(&0).and_then(|v| v.as_str()).unwrap();

    assert_eq!(document, "# Untitled Export\n");
}

#[tokio::test]
async fn delay_passes_inputs_through() {
    let ctx = create_test_context(
        "time.delay",
        string_input(0, "payload"),
        setting("delay_ms", 10.0),
    );

    let outputs = DelayExecutor.execute(ctx).await.unwrap();
    assert_eq!(
        outputs.ports.get(&0).and_then(|v| v.as_str()),
        Some("payload")
    );
}

#[tokio::test]
async fn delay_aborts_on_cancellation() {
    let ctx = create_test_context("time.delay", HashMap::new(), setting("delay_ms", 5000.0));
    ctx.cancellation.cancel();

    let outcome = DelayExecutor.execute(ctx).await;
    assert!(matches!(outcome, Err(ExecutorError::Cancelled)));
}

#[tokio::test]
async fn text_generate_requires_a_prompt() {
    let ctx = create_test_context("text.generate", HashMap::new(), HashMap::new());

    let outcome = TextGenerateExecutor::new().execute(ctx).await;
    match outcome {
        Err(ExecutorError::ExecutionFailed(message)) => {
            assert!(message.contains("no prompt"));
        }
        other => panic!("expected execution failure, got {:?}", other),
    }
}

#[tokio::test]
async fn text_generate_requires_the_api_key_credential() {
    let ctx = create_test_context(
        "text.generate",
        HashMap::new(),
        setting("prompt", "Write a haiku"),
    );

    let outcome = TextGenerateExecutor::new().execute(ctx).await;
    match outcome {
        Err(ExecutorError::MissingCredential(name)) => assert_eq!(name, "openai_api_key"),
        other => panic!("expected missing credential, got {:?}", other),
    }
}

#[tokio::test]
async fn research_fetch_requires_a_url() {
    let ctx = create_test_context("research.fetch", HashMap::new(), HashMap::new());

    let outcome = ResearchFetchExecutor::new().execute(ctx).await;
    match outcome {
        Err(ExecutorError::ExecutionFailed(message)) => assert!(message.contains("no url")),
        other => panic!("expected execution failure, got {:?}", other),
    }
}

#[test]
fn schemas_declare_enumerated_defaults() {
    let schema = TextGenerateExecutor::new().schema();
    assert_eq!(
        schema.default_for("model"),
        Some(&Setting::from("GPT-5 Mini"))
    );
    let model_options = schema.spec("model").unwrap().options.as_ref().unwrap();
    assert!(model_options.contains(&Setting::from("GPT-5")));

    let schema = BrandFormatExecutor.schema();
    assert_eq!(schema.default_for("voice"), Some(&Setting::from("Formal")));
}

#[test]
fn register_builtin_covers_the_bundled_types() {
    let mut registry = ExecutorRegistry::new();
    craftnodes::register_builtin(&mut registry);

    let mut type_ids = registry.list_type_ids();
    type_ids.sort();
    assert_eq!(
        type_ids,
        vec![
            "brand.format",
            "export.markdown",
            "research.fetch",
            "text.generate",
            "time.delay",
        ]
    );
}

#[tokio::test]
#[ignore] // Run only with network access
async fn research_fetch_live_request() {
    let ctx = create_test_context(
        "research.fetch",
        HashMap::new(),
        setting("url", "https://example.com"),
    );

    let outputs = ResearchFetchExecutor::new().execute(ctx).await.unwrap();
    assert_eq!(outputs.ports.get(&1).and_then(|v| v.as_f64()), Some(200.0));
    assert!(outputs
        .ports
        .get(&0)
        .and_then(|v| v.as_str())
        .unwrap()
        .contains("Example Domain"));
}
