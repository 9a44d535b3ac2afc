use async_trait::async_trait;
use craftcore::{
    CredentialStore, EngineError, ExecutionContext, Executor, ExecutorError, GraphError, NodeSpec,
    Outputs, PipelineSpec, SettingSpec, SettingsSchema, Value,
};
use craftruntime::{
    ExecutorRegistry, NodeRunResult, NodeStatus, PipelineRuntime, ResultCallback, RunStatus,
    RunSummary,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::time::Duration;

/// Emits a fixed string on output 0
struct ConstExecutor {
    value: &'static str,
}

#[async_trait]
impl Executor for ConstExecutor {
    fn type_id(&self) -> &str {
        "const"
    }

    async fn execute(&self, _ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        Ok(Outputs::new().with_port(0, self.value))
    }
}

/// Appends "y" to input 0
struct EchoExecutor;

#[async_trait]
impl Executor for EchoExecutor {
    fn type_id(&self) -> &str {
        "echo"
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        let input = ctx.require_str_input(0)?;
        Ok(Outputs::new().with_port(0, format!("{}y", input)))
    }
}

/// Always fails
struct FailExecutor;

#[async_trait]
impl Executor for FailExecutor {
    fn type_id(&self) -> &str {
        "fail"
    }

    async fn execute(&self, _ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        Err(ExecutorError::ExecutionFailed("boom".to_string()))
    }
}

type Spans = Arc<Mutex<HashMap<String, (Instant, Instant)>>>;

/// Sleeps for the node's `ms` setting, recording when each invocation
/// started and ended
struct SleepExecutor {
    spans: Spans,
}

#[async_trait]
impl Executor for SleepExecutor {
    fn type_id(&self) -> &str {
        "sleep"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new().with(SettingSpec::new("ms", 50.0))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        let ms = ctx.setting_f64_or("ms", 50.0) as u64;
        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.spans
            .lock()
            .unwrap()
            .insert(ctx.node_id.clone(), (start, Instant::now()));
        Ok(Outputs::new().with_port(0, "done"))
    }
}

fn runtime_with(executors: Vec<Arc<dyn Executor>>) -> PipelineRuntime {
    let mut registry = ExecutorRegistry::new();
    for executor in executors {
        registry.register(executor);
    }
    PipelineRuntime::new(Arc::new(registry))
}

fn sleep_node(id: &str, ms: f64) -> NodeSpec {
    NodeSpec::new(id, "sleep").with_setting("ms", ms)
}

fn collecting_callback() -> (ResultCallback, Arc<Mutex<Vec<NodeRunResult>>>) {
    let collected: Arc<Mutex<Vec<NodeRunResult>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = collected.clone();
    let callback: ResultCallback = Arc::new(move |result| {
        sink.lock().unwrap().push(result.clone());
    });
    (callback, collected)
}

async fn run(runtime: &PipelineRuntime, pipeline: &PipelineSpec) -> RunSummary {
    runtime
        .execute(pipeline, None, CredentialStore::new())
        .await
        .expect("pipeline should execute")
}

#[tokio::test]
async fn scenario_happy_path() {
    let runtime = runtime_with(vec![
        Arc::new(ConstExecutor { value: "x" }),
        Arc::new(EchoExecutor),
    ]);

    let mut pipeline = PipelineSpec::new("happy");
    pipeline.add_node(NodeSpec::new("a", "const"));
    pipeline.add_node(NodeSpec::new("b", "echo"));
    pipeline.connect("a", 0, "b", 0);

    let (callback, collected) = collecting_callback();
    let summary = runtime
        .execute(&pipeline, Some(callback), CredentialStore::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);

    let a = summary.result("a").unwrap();
    assert_eq!(a.status, NodeStatus::Success);
    assert_eq!(a.outputs.get(&0), Some(&Value::String("x".to_string())));

    let b = summary.result("b").unwrap();
    assert_eq!(b.status, NodeStatus::Success);
    assert_eq!(b.outputs.get(&0), Some(&Value::String("xy".to_string())));

    // callback fired once per node, in completion order
    let order: Vec<String> = collected
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.node_id.clone())
        .collect();
    assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn scenario_failure_propagation() {
    let runtime = runtime_with(vec![Arc::new(FailExecutor), Arc::new(EchoExecutor)]);

    let mut pipeline = PipelineSpec::new("failing");
    pipeline.add_node(NodeSpec::new("a", "fail"));
    pipeline.add_node(NodeSpec::new("b", "echo"));
    pipeline.connect("a", 0, "b", 0);

    let summary = run(&runtime, &pipeline).await;

    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);

    let a = summary.result("a").unwrap();
    assert_eq!(a.status, NodeStatus::Error);
    assert!(a.error.as_deref().unwrap().contains("boom"));

    let b = summary.result("b").unwrap();
    assert_eq!(b.status, NodeStatus::Skipped);
    assert_eq!(b.blocked_on.as_deref(), Some("a"));
    assert!(b.outputs.is_empty());
}

#[tokio::test]
async fn scenario_unknown_node_type() {
    let runtime = runtime_with(vec![Arc::new(EchoExecutor)]);

    let mut pipeline = PipelineSpec::new("unknown-type");
    pipeline.add_node(NodeSpec::new("c", "nonexistent"));
    pipeline.add_node(NodeSpec::new("d", "echo"));
    pipeline.connect("c", 0, "d", 0);

    let summary = run(&runtime, &pipeline).await;

    let c = summary.result("c").unwrap();
    assert_eq!(c.status, NodeStatus::Error);
    assert_eq!(
        c.error.as_deref(),
        Some("no executor registered for nonexistent")
    );

    let d = summary.result("d").unwrap();
    assert_eq!(d.status, NodeStatus::Skipped);
    assert_eq!(d.blocked_on.as_deref(), Some("c"));
}

#[tokio::test]
async fn cycle_rejected_before_any_dispatch() {
    let runtime = runtime_with(vec![
        Arc::new(ConstExecutor { value: "x" }),
        Arc::new(EchoExecutor),
    ]);

    let mut pipeline = PipelineSpec::new("cyclic");
    pipeline.add_node(NodeSpec::new("a", "const"));
    pipeline.add_node(NodeSpec::new("b", "echo"));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("b", 0, "a", 0);

    let (callback, collected) = collecting_callback();
    let outcome = runtime
        .execute(&pipeline, Some(callback), CredentialStore::new())
        .await;

    assert!(matches!(
        outcome,
        Err(EngineError::Graph(GraphError::CycleDetected { .. }))
    ));
    // no node produced a result
    assert!(collected.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dangling_connection_rejected_before_any_dispatch() {
    let runtime = runtime_with(vec![Arc::new(ConstExecutor { value: "x" })]);

    let mut pipeline = PipelineSpec::new("dangling");
    pipeline.add_node(NodeSpec::new("a", "const"));
    pipeline.connect("a", 0, "ghost", 0);

    let outcome = runtime
        .execute(&pipeline, None, CredentialStore::new())
        .await;

    assert!(matches!(
        outcome,
        Err(EngineError::Graph(GraphError::DanglingConnection { .. }))
    ));
}

#[tokio::test]
async fn empty_pipeline_yields_empty_completed_run() {
    let runtime = runtime_with(vec![]);
    let pipeline = PipelineSpec::new("empty");

    let summary = run(&runtime, &pipeline).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.total, 0);
    assert!(summary.results.is_empty());
}

#[tokio::test]
async fn independent_branches_run_concurrently() {
    let spans: Spans = Arc::new(Mutex::new(HashMap::new()));
    let runtime = runtime_with(vec![
        Arc::new(ConstExecutor { value: "x" }),
        Arc::new(SleepExecutor {
            spans: spans.clone(),
        }),
    ]);

    // a feeds both b and c; b and c have no relationship to each other
    let mut pipeline = PipelineSpec::new("parallel");
    pipeline.add_node(NodeSpec::new("a", "const"));
    pipeline.add_node(sleep_node("b", 100.0));
    pipeline.add_node(sleep_node("c", 100.0));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("a", 0, "c", 0);

    let started = Instant::now();
    let summary = run(&runtime, &pipeline).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.status, RunStatus::Completed);

    // both sleeps overlapped: total is near 100ms, nowhere near 200ms
    let spans = spans.lock().unwrap();
    let (b_start, b_end) = spans["b"];
    let (c_start, c_end) = spans["c"];
    assert!(b_start < c_end && c_start < b_end, "branches did not overlap");
    assert!(
        elapsed < Duration::from_millis(190),
        "independent branches were serialized: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn diamond_join_waits_for_both_parents() {
    let spans: Spans = Arc::new(Mutex::new(HashMap::new()));
    let runtime = runtime_with(vec![
        Arc::new(ConstExecutor { value: "x" }),
        Arc::new(SleepExecutor {
            spans: spans.clone(),
        }),
    ]);

    // a -> b (fast), a -> c (slow), b -> d, c -> d
    let mut pipeline = PipelineSpec::new("diamond");
    pipeline.add_node(NodeSpec::new("a", "const"));
    pipeline.add_node(sleep_node("b", 10.0));
    pipeline.add_node(sleep_node("c", 120.0));
    pipeline.add_node(sleep_node("d", 1.0));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("a", 0, "c", 0);
    pipeline.connect("b", 0, "d", 0);
    pipeline.connect("c", 0, "d", 1);

    let summary = run(&runtime, &pipeline).await;
    assert_eq!(summary.status, RunStatus::Completed);

    let spans = spans.lock().unwrap();
    let (d_start, _) = spans["d"];
    let (_, b_end) = spans["b"];
    let (_, c_end) = spans["c"];
    assert!(d_start >= b_end, "d dispatched before b finished");
    assert!(d_start >= c_end, "d dispatched before slow parent c finished");
}

#[tokio::test]
async fn topological_order_respected_along_chain() {
    let spans: Spans = Arc::new(Mutex::new(HashMap::new()));
    let runtime = runtime_with(vec![Arc::new(SleepExecutor {
        spans: spans.clone(),
    })]);

    let mut pipeline = PipelineSpec::new("chain");
    pipeline.add_node(sleep_node("a", 20.0));
    pipeline.add_node(sleep_node("b", 20.0));
    pipeline.add_node(sleep_node("c", 20.0));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("b", 0, "c", 0);

    let summary = run(&runtime, &pipeline).await;
    assert_eq!(summary.status, RunStatus::Completed);

    let spans = spans.lock().unwrap();
    assert!(spans["b"].0 >= spans["a"].1);
    assert!(spans["c"].0 >= spans["b"].1);
}

#[tokio::test]
async fn failure_is_isolated_to_descendants() {
    let runtime = runtime_with(vec![
        Arc::new(ConstExecutor { value: "x" }),
        Arc::new(EchoExecutor),
        Arc::new(FailExecutor),
    ]);

    // a fails; b, c, and grandchild g must skip; disjoint x -> y still runs
    let mut pipeline = PipelineSpec::new("isolation");
    pipeline.add_node(NodeSpec::new("a", "fail"));
    pipeline.add_node(NodeSpec::new("b", "echo"));
    pipeline.add_node(NodeSpec::new("c", "echo"));
    pipeline.add_node(NodeSpec::new("g", "echo"));
    pipeline.add_node(NodeSpec::new("x", "const"));
    pipeline.add_node(NodeSpec::new("y", "echo"));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("a", 0, "c", 0);
    pipeline.connect("b", 0, "g", 0);
    pipeline.connect("x", 0, "y", 0);

    let summary = run(&runtime, &pipeline).await;

    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.result("b").unwrap().status, NodeStatus::Skipped);
    assert_eq!(summary.result("c").unwrap().status, NodeStatus::Skipped);
    assert_eq!(summary.result("g").unwrap().status, NodeStatus::Skipped);
    assert_eq!(
        summary.result("b").unwrap().blocked_on.as_deref(),
        Some("a")
    );
    // the skip reason chains through the nearest blocked ancestor
    assert_eq!(
        summary.result("g").unwrap().blocked_on.as_deref(),
        Some("b")
    );

    let y = summary.result("y").unwrap();
    assert_eq!(y.status, NodeStatus::Success);
    assert_eq!(y.outputs.get(&0), Some(&Value::String("xy".to_string())));
}

#[tokio::test]
async fn callback_fires_exactly_once_per_node() {
    let runtime = runtime_with(vec![Arc::new(FailExecutor), Arc::new(EchoExecutor)]);

    let mut pipeline = PipelineSpec::new("exactly-once");
    pipeline.add_node(NodeSpec::new("a", "fail"));
    pipeline.add_node(NodeSpec::new("b", "echo"));
    pipeline.add_node(NodeSpec::new("c", "echo"));
    pipeline.add_node(NodeSpec::new("d", "echo"));
    pipeline.connect("a", 0, "b", 0);
    pipeline.connect("a", 0, "c", 0);
    pipeline.connect("b", 0, "d", 0);
    pipeline.connect("c", 0, "d", 1);

    let (callback, collected) = collecting_callback();
    let summary = runtime
        .execute(&pipeline, Some(callback), CredentialStore::new())
        .await
        .unwrap();

    assert_eq!(summary.total, 4);

    let mut seen: Vec<String> = collected
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.node_id.clone())
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["a", "b", "c", "d"]);
}
