#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Tests for the module loader and runtime runner.
//!
//! Covers dependency-ordered loading, fail-fast manifests, rest host
//! validation and the full runner lifecycle.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use http::Method;
use menara_kit::{
    ClientHub, ConfigProvider, HttpServer, LoadError, ModuleContextBuilder, ModuleCtx,
    ModuleLoader, ModuleStatus, RegistryBuilder, RestHostModule, RoutePolicy,
    contracts::{Module, RestfulModule, StatefulModule},
    runtime::{RunOptions, ShutdownOptions, run},
};
use tower::ServiceExt;

type CallTracker = Arc<Mutex<Vec<String>>>;

struct MockConfigProvider;

impl ConfigProvider for MockConfigProvider {
    fn get_module_config(&self, _module_name: &str) -> Option<&serde_json::Value> {
        None
    }
}

#[derive(Clone)]
struct TestModule {
    name: &'static str,
    calls: CallTracker,
    should_fail_init: Arc<AtomicBool>,
    should_fail_rest: Arc<AtomicBool>,
}

impl TestModule {
    fn new(name: &'static str, calls: CallTracker) -> Self {
        Self {
            name,
            calls,
            should_fail_init: Arc::new(AtomicBool::new(false)),
            should_fail_rest: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fail_init(self) -> Self {
        self.should_fail_init.store(true, Ordering::SeqCst);
        self
    }

    fn fail_rest(self) -> Self {
        self.should_fail_rest.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait::async_trait]
impl Module for TestModule {
    async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("{}.init", self.name));
        if self.should_fail_init.load(Ordering::SeqCst) {
            anyhow::bail!("init failed for module {}", self.name);
        }
        Ok(())
    }
}

impl RestfulModule for TestModule {
    fn register_rest(&self, _ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}.register_rest", self.name));
        if self.should_fail_rest.load(Ordering::SeqCst) {
            anyhow::bail!("rest registration failed for module {}", self.name);
        }
        let body = self.name;
        server.register_route(
            Method::GET,
            &format!("/{}", self.name),
            get(move || async move { body }),
            RoutePolicy::default(),
        )?;
        Ok(())
    }
}

struct MockRestHost {
    calls: CallTracker,
    router: Mutex<Option<Router>>,
}

impl MockRestHost {
    fn new(calls: CallTracker) -> Self {
        Self {
            calls,
            router: Mutex::new(None),
        }
    }

    fn take_router(&self) -> Option<Router> {
        self.router.lock().unwrap().take()
    }
}

#[async_trait::async_trait]
impl Module for MockRestHost {
    async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("host.init".to_owned());
        Ok(())
    }
}

impl RestHostModule for MockRestHost {
    fn rest_prepare(&self, _ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("host.prepare".to_owned());
        server.register_route(
            Method::GET,
            "/healthz",
            get(|| async { "ok" }),
            RoutePolicy::tenant_exempt(),
        )?;
        Ok(())
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, server: HttpServer) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("host.finalize".to_owned());
        let (router, _table) = server.freeze();
        *self.router.lock().unwrap() = Some(router);
        Ok(())
    }
}

fn ctx_builder() -> ModuleContextBuilder {
    ModuleContextBuilder::new(
        Arc::new(MockConfigProvider),
        Arc::new(ClientHub::new()),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn load_wires_modules_in_dependency_order() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));
    let host = Arc::new(MockRestHost::new(calls.clone()));
    let module_a = Arc::new(TestModule::new("a", calls.clone()));
    let module_b = Arc::new(TestModule::new("b", calls.clone()));

    let mut builder = RegistryBuilder::default();
    builder.register_core_with_meta("host", &[], host.clone() as Arc<dyn Module>);
    builder.register_rest_host_with_meta("host", host.clone() as Arc<dyn RestHostModule>);
    // Register b before a: dependency order must still win.
    builder.register_core_with_meta("b", &["a"], module_b.clone() as Arc<dyn Module>);
    builder.register_rest_with_meta("b", module_b.clone() as Arc<dyn RestfulModule>);
    builder.register_core_with_meta("a", &[], module_a.clone() as Arc<dyn Module>);
    builder.register_rest_with_meta("a", module_a.clone() as Arc<dyn RestfulModule>);
    let registry = builder.build_topo_sorted().unwrap();

    let loader = ModuleLoader::new();
    loader
        .load(HttpServer::new(), &registry, &ctx_builder())
        .await
        .unwrap();

    let call_log = calls.lock().unwrap().clone();
    assert_eq!(
        call_log,
        vec![
            "host.prepare",
            "host.init",
            "a.init",
            "a.register_rest",
            "b.init",
            "b.register_rest",
            "host.finalize",
        ]
    );

    let manifest = loader.manifest();
    assert!(!manifest.is_degraded());
    assert_eq!(manifest.entries().len(), 3);
    assert!(
        manifest
            .entries()
            .iter()
            .all(|e| e.status == ModuleStatus::Loaded)
    );

    // The frozen router serves both contributed routes and the bootstrap one.
    let router = host.take_router().unwrap();
    for path in ["/healthz", "/a", "/b"] {
        let res = router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "path {path}");
    }
}

#[tokio::test]
async fn failed_init_stops_loading_and_skips_the_rest() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));
    let module_a = Arc::new(TestModule::new("a", calls.clone()).fail_init());
    let module_b = Arc::new(TestModule::new("b", calls.clone()));

    let mut builder = RegistryBuilder::default();
    builder.register_core_with_meta("a", &[], module_a.clone() as Arc<dyn Module>);
    builder.register_core_with_meta("b", &["a"], module_b.clone() as Arc<dyn Module>);
    let registry = builder.build_topo_sorted().unwrap();

    let loader = ModuleLoader::new();
    let err = loader
        .load(HttpServer::new(), &registry, &ctx_builder())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Module { module: "a", .. }));

    // B was never attempted.
    let call_log = calls.lock().unwrap().clone();
    assert_eq!(call_log, vec!["a.init"]);

    // The manifest preserves positions: A failed, B skipped.
    let manifest = loader.manifest();
    let entries = manifest.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "a");
    assert_eq!(entries[0].status, ModuleStatus::Failed);
    assert!(entries[0].error.as_deref().unwrap().contains("init failed"));
    assert_eq!(entries[1].name, "b");
    assert_eq!(entries[1].status, ModuleStatus::Skipped);
    assert!(entries[1].error.is_none());
}

#[tokio::test]
async fn failed_route_registration_is_fatal_too() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));
    let host = Arc::new(MockRestHost::new(calls.clone()));
    let module_a = Arc::new(TestModule::new("a", calls.clone()).fail_rest());
    let module_b = Arc::new(TestModule::new("b", calls.clone()));

    let mut builder = RegistryBuilder::default();
    builder.register_core_with_meta("host", &[], host.clone() as Arc<dyn Module>);
    builder.register_rest_host_with_meta("host", host.clone() as Arc<dyn RestHostModule>);
    builder.register_core_with_meta("a", &[], module_a.clone() as Arc<dyn Module>);
    builder.register_rest_with_meta("a", module_a.clone() as Arc<dyn RestfulModule>);
    builder.register_core_with_meta("b", &["a"], module_b.clone() as Arc<dyn Module>);
    builder.register_rest_with_meta("b", module_b.clone() as Arc<dyn RestfulModule>);
    let registry = builder.build_topo_sorted().unwrap();

    let loader = ModuleLoader::new();
    let err = loader
        .load(HttpServer::new(), &registry, &ctx_builder())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Module { module: "a", .. }));

    let call_log = calls.lock().unwrap().clone();
    assert!(!call_log.contains(&"b.init".to_owned()));
    assert!(!call_log.contains(&"host.finalize".to_owned()));

    // No frozen router exists: the server never comes up half-wired.
    assert!(host.take_router().is_none());
}

#[tokio::test]
async fn rest_modules_require_a_host() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));
    let module_a = Arc::new(TestModule::new("a", calls.clone()));

    let mut builder = RegistryBuilder::default();
    builder.register_core_with_meta("a", &[], module_a.clone() as Arc<dyn Module>);
    builder.register_rest_with_meta("a", module_a.clone() as Arc<dyn RestfulModule>);
    let registry = builder.build_topo_sorted().unwrap();

    let loader = ModuleLoader::new();
    let err = loader
        .load(HttpServer::new(), &registry, &ctx_builder())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::RestRequiresHost));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn multiple_hosts_are_rejected() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));
    let host_a = Arc::new(MockRestHost::new(calls.clone()));
    let host_b = Arc::new(MockRestHost::new(calls.clone()));

    let mut builder = RegistryBuilder::default();
    builder.register_core_with_meta("host_a", &[], host_a.clone() as Arc<dyn Module>);
    builder.register_rest_host_with_meta("host_a", host_a as Arc<dyn RestHostModule>);
    builder.register_core_with_meta("host_b", &[], host_b.clone() as Arc<dyn Module>);
    builder.register_rest_host_with_meta("host_b", host_b as Arc<dyn RestHostModule>);
    let registry = builder.build_topo_sorted().unwrap();

    let loader = ModuleLoader::new();
    let err = loader
        .load(HttpServer::new(), &registry, &ctx_builder())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::MultipleRestHosts));
}

// Probe state for the runner lifecycle test (inventory-discovered module).
#[derive(Debug, Default)]
struct ProbeState {
    init: AtomicBool,
    start: AtomicBool,
    stop: AtomicBool,
}

fn probe_state() -> Arc<ProbeState> {
    static STATE: std::sync::OnceLock<Arc<ProbeState>> = std::sync::OnceLock::new();
    STATE
        .get_or_init(|| Arc::new(ProbeState::default()))
        .clone()
}

struct RuntimeLifecycleProbe;

#[async_trait::async_trait]
impl Module for RuntimeLifecycleProbe {
    async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        probe_state().init.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatefulModule for RuntimeLifecycleProbe {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        probe_state().start.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        probe_state().stop.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn register_probe(builder: &mut RegistryBuilder) {
    let probe = Arc::new(RuntimeLifecycleProbe);
    builder.register_core_with_meta("runtime_lifecycle_probe", &[], probe.clone());
    builder.register_stateful_with_meta("runtime_lifecycle_probe", probe);
}

inventory::submit! {
    menara_kit::ModuleRegistration {
        name: "runtime_lifecycle_probe",
        register: register_probe,
    }
}

#[tokio::test]
async fn run_drives_full_lifecycle_with_token_shutdown() {
    let cancel = CancellationToken::new();

    let opts = RunOptions {
        modules_cfg: Arc::new(MockConfigProvider),
        shutdown: ShutdownOptions::Token(cancel.clone()),
    };

    let runner = tokio::spawn(run(opts));

    let started = timeout(Duration::from_secs(2), async {
        while !probe_state().start.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(started.is_ok(), "start should be observed");

    cancel.cancel();

    let run_result = timeout(Duration::from_secs(2), runner)
        .await
        .expect("runner should finish")
        .expect("runner task should not panic");
    assert!(run_result.is_ok(), "run should complete: {run_result:?}");

    assert!(probe_state().init.load(Ordering::SeqCst), "init should run");
    assert!(probe_state().stop.load(Ordering::SeqCst), "stop should run");
}
