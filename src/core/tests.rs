use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::GroupConfig;
use crate::core::Group;
use crate::error::{RunError, UnitError};
use crate::events::{Event, EventKind};
use crate::flags::{FlagSet, Value};
use crate::subscribers::Subscribe;
use crate::units::{
    Configurable, Initializer, Namer, PreRunFn, PreRunner, Service, ServiceContext, ServiceFn,
    Trigger, Unit, UnitRef,
};

#[derive(thiserror::Error, Debug)]
#[error("interrupt")]
struct Irq;

#[derive(thiserror::Error, Debug)]
#[error("flagset error")]
struct FlagsInvalid;

fn quiet(cfg: GroupConfig) -> Group {
    Group::builder(cfg).with_subscribers(Vec::new()).build()
}

fn recorded(cfg: GroupConfig) -> (Group, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let group = Group::builder(cfg)
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build();
    (group, rec)
}

async fn run_bounded(group: &Group, args: &[&str]) -> Result<(), RunError> {
    timeout(Duration::from_secs(5), group.run_with(args.iter().copied()))
        .await
        .expect("run did not return in time")
}

fn unit<U: Unit>(u: &Arc<U>) -> UnitRef {
    u.clone()
}

#[derive(Default)]
struct Recorder(Mutex<Vec<Event>>);

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.0.lock().iter().map(|e| e.kind).collect()
    }

    fn position(&self, kind: EventKind, unit: &str) -> Option<usize> {
        self.0
            .lock()
            .iter()
            .position(|e| e.kind == kind && e.unit.as_deref() == Some(unit))
    }
}

impl Subscribe for Recorder {
    fn on_event(&self, event: &Event) {
        self.0.lock().push(event.clone());
    }
}

/// Unit exercising every capability except `ServiceContext`.
struct TestService {
    name: &'static str,
    preset_item: i64,
    custom_flags: Option<FlagSet>,
    flag_value: Mutex<Option<Value<i64>>>,
    group_name: Mutex<String>,
    initialized: AtomicUsize,
    flag_set_called: AtomicBool,
    validated: AtomicBool,
    pre_ran: AtomicBool,
    served: AtomicBool,
    graceful_stops: AtomicUsize,
    started: CancellationToken,
    stop: CancellationToken,
}

impl TestService {
    fn new() -> Arc<Self> {
        Arc::new(Self::build("testsvc", 0, None))
    }

    fn with_flags(name: &'static str, flags: FlagSet) -> Arc<Self> {
        Arc::new(Self::build(name, 1, Some(flags)))
    }

    fn build(name: &'static str, preset_item: i64, custom_flags: Option<FlagSet>) -> Self {
        Self {
            name,
            preset_item,
            custom_flags,
            flag_value: Mutex::new(None),
            group_name: Mutex::new(String::new()),
            initialized: AtomicUsize::new(0),
            flag_set_called: AtomicBool::new(false),
            validated: AtomicBool::new(false),
            pre_ran: AtomicBool::new(false),
            served: AtomicBool::new(false),
            graceful_stops: AtomicUsize::new(0),
            started: CancellationToken::new(),
            stop: CancellationToken::new(),
        }
    }

    fn config_item(&self) -> i64 {
        self.flag_value
            .lock()
            .as_ref()
            .map_or(self.preset_item, Value::get)
    }

    fn served_and_stopped(&self) -> bool {
        self.served.load(Ordering::SeqCst) && self.graceful_stops.load(Ordering::SeqCst) == 1
    }
}

impl Unit for TestService {
    fn name(&self) -> &str {
        self.name
    }

    fn as_initializer(&self) -> Option<&dyn Initializer> {
        Some(self)
    }

    fn as_namer(&self) -> Option<&dyn Namer> {
        Some(self)
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_pre_runner(&self) -> Option<&dyn PreRunner> {
        Some(self)
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

impl Initializer for TestService {
    fn initialize(&self) {
        self.initialized.fetch_add(1, Ordering::SeqCst);
    }
}

impl Namer for TestService {
    fn group_name(&self, name: &str) {
        *self.group_name.lock() = name.to_string();
    }
}

impl Configurable for TestService {
    fn flag_set(&self) -> Option<FlagSet> {
        self.flag_set_called.store(true, Ordering::SeqCst);
        if let Some(custom) = &self.custom_flags {
            return Some(custom.clone());
        }
        let mut fs = FlagSet::new("dummy flagset");
        let item = fs.int("flagtest", Some('f'), 5, "rungroup flagset test");
        *self.flag_value.lock() = Some(item);
        Some(fs)
    }

    fn validate(&self) -> Result<(), UnitError> {
        self.validated.store(true, Ordering::SeqCst);
        if self.config_item() != 1 {
            return Err(FlagsInvalid.into());
        }
        Ok(())
    }
}

#[async_trait]
impl PreRunner for TestService {
    async fn pre_run(&self) -> Result<(), UnitError> {
        self.pre_ran.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Service for TestService {
    async fn serve(&self) -> Result<(), UnitError> {
        self.served.store(true, Ordering::SeqCst);
        self.started.cancel();
        self.stop.cancelled().await;
        Err(anyhow!("requested close"))
    }

    async fn graceful_stop(&self) {
        self.graceful_stops.fetch_add(1, Ordering::SeqCst);
        self.stop.cancel();
    }
}

fn explode() -> Result<(), UnitError> {
    panic!("boom")
}

/// Service returning [`Irq`] once every token in `wait_for` was cancelled.
fn interrupter(wait_for: Vec<CancellationToken>) -> UnitRef {
    ServiceFn::arc("irq", move |_ctx: CancellationToken| {
        let wait_for = wait_for.clone();
        async move {
            for started in wait_for {
                started.cancelled().await;
            }
            Err::<(), _>(UnitError::new(Irq))
        }
    })
}

struct FailingConfig(&'static str);

impl Unit for FailingConfig {
    fn name(&self) -> &str {
        self.0
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

impl Configurable for FailingConfig {
    fn flag_set(&self) -> Option<FlagSet> {
        None
    }

    fn validate(&self) -> Result<(), UnitError> {
        Err(anyhow!("{} failed", self.0))
    }
}

struct FlagTestConfig {
    value: Mutex<Option<Value<i64>>>,
}

impl FlagTestConfig {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(None),
        })
    }

    fn value(&self) -> Option<i64> {
        self.value.lock().as_ref().map(Value::get)
    }
}

impl Unit for FlagTestConfig {
    fn name(&self) -> &str {
        "flagtest"
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

impl Configurable for FlagTestConfig {
    fn flag_set(&self) -> Option<FlagSet> {
        let mut fs = FlagSet::new("flag test config");
        *self.value.lock() = Some(fs.int("flagtest", Some('f'), 10, "flagtester"));
        Some(fs)
    }

    fn validate(&self) -> Result<(), UnitError> {
        Ok(())
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Disabler {
    on_validate: Mutex<Option<Hook>>,
    on_pre_run: Mutex<Option<Hook>>,
}

impl Unit for Disabler {
    fn name(&self) -> &str {
        "disablerService"
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_pre_runner(&self) -> Option<&dyn PreRunner> {
        Some(self)
    }
}

impl Configurable for Disabler {
    fn flag_set(&self) -> Option<FlagSet> {
        Some(FlagSet::new("dummy flagset"))
    }

    fn validate(&self) -> Result<(), UnitError> {
        if let Some(hook) = self.on_validate.lock().as_ref() {
            hook();
        }
        Ok(())
    }
}

#[async_trait]
impl PreRunner for Disabler {
    async fn pre_run(&self) -> Result<(), UnitError> {
        if let Some(hook) = self.on_pre_run.lock().as_ref() {
            hook();
        }
        Ok(())
    }
}

struct Ambiguous;

impl Unit for Ambiguous {
    fn name(&self) -> &str {
        "ambiguous"
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }

    fn as_service_context(&self) -> Option<&dyn ServiceContext> {
        Some(self)
    }
}

#[async_trait]
impl Service for Ambiguous {
    async fn serve(&self) -> Result<(), UnitError> {
        Ok(())
    }

    async fn graceful_stop(&self) {}
}

#[async_trait]
impl ServiceContext for Ambiguous {
    async fn serve_context(&self, _ctx: CancellationToken) -> Result<(), UnitError> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_lifecycle() {
    let group = quiet(GroupConfig::default());
    let svc = TestService::new();

    let ctx_served = Arc::new(AtomicBool::new(false));
    let ctx_done = Arc::new(AtomicBool::new(false));
    let (served, done) = (ctx_served.clone(), ctx_done.clone());
    let svc_ctx: UnitRef = ServiceFn::arc("svc-context", move |ctx: CancellationToken| {
        let (served, done) = (served.clone(), done.clone());
        async move {
            served.store(true, Ordering::SeqCst);
            ctx.cancelled().await;
            done.store(true, Ordering::SeqCst);
            Ok::<_, UnitError>(())
        }
    });

    group.register(&[unit(&svc)]);
    group.register(&[svc_ctx]);
    group.register(&[interrupter(vec![svc.started.clone()])]);

    let err = run_bounded(&group, &["./myService", "-f", "1"])
        .await
        .expect_err("interrupter ends the run in error");

    assert!(err.is::<Irq>(), "unexpected error: {err}");
    assert!(matches!(&err, RunError::Serve { unit, .. } if unit == "irq"));
    assert_eq!(group.name(), "myService");
    assert_eq!(*svc.group_name.lock(), "myService");
    assert_eq!(svc.initialized.load(Ordering::SeqCst), 1);
    assert!(svc.flag_set_called.load(Ordering::SeqCst));
    assert!(svc.validated.load(Ordering::SeqCst));
    assert_eq!(svc.config_item(), 1);
    assert!(svc.pre_ran.load(Ordering::SeqCst));
    assert!(svc.served_and_stopped());
    assert!(ctx_served.load(Ordering::SeqCst));
    assert!(ctx_done.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_validation_errors_are_aggregated() {
    let group = quiet(GroupConfig::named("MyService"));
    let cfgs: Vec<UnitRef> = ["cfg1", "cfg2", "cfg3"]
        .into_iter()
        .map(|name| Arc::new(FailingConfig(name)) as UnitRef)
        .collect();
    group.register(&cfgs);

    let err = run_bounded(&group, &["svc"]).await.expect_err("validation fails");

    assert_eq!(err.as_label(), "run_validation");
    assert_eq!(
        err.to_string(),
        "3 errors occurred:\n\t* cfg1 failed\n\t* cfg2 failed\n\t* cfg3 failed\n\n"
    );
}

#[tokio::test]
async fn test_early_bail_flags() {
    for (flag, fails) in [
        ("-v", false),
        ("-h", false),
        ("--version", false),
        ("--help", false),
        ("--show-rungroup-units", false),
        ("--non-existent", true),
    ] {
        let group = quiet(GroupConfig {
            help_text: "placeholder".into(),
            ..GroupConfig::default()
        });
        let pre_ran = Arc::new(AtomicBool::new(false));
        let flag_seen = pre_ran.clone();
        let marker: UnitRef = PreRunFn::arc("marker", move || {
            let flag_seen = flag_seen.clone();
            async move {
                flag_seen.store(true, Ordering::SeqCst);
                Ok::<_, UnitError>(())
            }
        });
        group.register(&[marker]);

        let res = run_bounded(&group, &["./myService", flag]).await;

        assert_eq!(res.is_err(), fails, "{flag}: {res:?}");
        if fails {
            assert!(matches!(res, Err(RunError::Flags(_))), "{flag}: {res:?}");
        }
        assert!(!pre_ran.load(Ordering::SeqCst), "{flag}: pre-run must not execute");
    }
}

#[test]
fn test_run_config_reports_bail_early() {
    let group = quiet(GroupConfig::named("api"));
    let err = group
        .run_config_with(["api", "--version"])
        .expect_err("version bails early");
    assert!(err.is_bail_early());
}

#[tokio::test]
async fn test_pre_run_failure_stops_the_run() {
    #[derive(thiserror::Error, Debug)]
    #[error("preRun failed")]
    struct PreRunFailed;

    let (group, rec) = recorded(GroupConfig::named("PreRunFail"));
    let later = Arc::new(AtomicBool::new(false));
    let later_flag = later.clone();
    group.register(&[
        PreRunFn::arc("failing", || async { Err::<(), _>(UnitError::new(PreRunFailed)) }) as UnitRef,
        PreRunFn::arc("later", move || {
            let later_flag = later_flag.clone();
            async move {
                later_flag.store(true, Ordering::SeqCst);
                Ok::<_, UnitError>(())
            }
        }) as UnitRef,
    ]);

    let err = run_bounded(&group, &["svc"]).await.expect_err("pre-run fails");

    assert!(err.is::<PreRunFailed>());
    assert_eq!(err.to_string(), "pre-run failing: preRun failed");
    assert!(!later.load(Ordering::SeqCst));
    assert_eq!(rec.kinds().last(), Some(&EventKind::UnexpectedExit));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_flag_first_registration_wins() {
    let (group, rec) = recorded(GroupConfig::default());
    let flag1 = FlagTestConfig::new();
    let flag2 = FlagTestConfig::new();

    group.register(&[unit(&flag1), unit(&flag2)]);
    group.register(&[interrupter(Vec::new())]);

    let err = run_bounded(&group, &["./myService", "-f", "3"])
        .await
        .expect_err("interrupter ends the run");

    assert!(err.is::<Irq>());
    assert_eq!(flag1.value(), Some(3));
    assert_eq!(flag2.value(), Some(10));
    assert!(rec.kinds().contains(&EventKind::FlagIgnored));
}

#[derive(Clone, Copy, Debug)]
enum DisablePhase {
    Config,
    PreRunner,
    Service,
}

#[derive(Default)]
struct Disabled {
    config: bool,
    pre_run: bool,
    serve: bool,
}

impl Disabled {
    fn after(phase: DisablePhase, hit: bool) -> Self {
        match (phase, hit) {
            (_, false) => Self::default(),
            (DisablePhase::Config, true) => Self {
                config: true,
                pre_run: true,
                serve: true,
            },
            (DisablePhase::PreRunner, true) => Self {
                pre_run: true,
                serve: true,
                ..Self::default()
            },
            (DisablePhase::Service, true) => Self {
                serve: true,
                ..Self::default()
            },
        }
    }
}

fn disabling_hook(group: &Group, targets: Vec<(Value<bool>, UnitRef)>) -> Hook {
    let group = group.clone();
    Box::new(move || {
        for (disable, target) in &targets {
            if disable.get() {
                assert_eq!(group.deregister(&[target.clone()]), vec![true]);
            }
        }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runtime_deregistration() {
    for svcs in [
        vec!["--s1-disable"],
        vec!["--s2-disable"],
        vec!["--s1-disable", "--s2-disable"],
    ] {
        for phase in [DisablePhase::Config, DisablePhase::PreRunner, DisablePhase::Service] {
            let case = format!("{phase:?}({})", svcs.join(","));
            let group = quiet(GroupConfig::default());

            let mut fs1 = FlagSet::new("s1-disabler");
            let d1 = fs1.bool("s1-disable", None, false, "disable service 1");
            let mut fs2 = FlagSet::new("s2-disabler");
            let d2 = fs2.bool("s2-disable", None, false, "disable service 2");
            let s1 = TestService::with_flags("s1", fs1);
            let s2 = TestService::with_flags("s2", fs2);
            let s3 = TestService::new();
            let disabler = Arc::new(Disabler::default());

            group.register(&[unit(&disabler), unit(&s1), unit(&s2), unit(&s3)]);
            assert_eq!(group.deregister(&[unit(&s3)]), vec![true]);

            let hook = disabling_hook(&group, vec![(d1.clone(), unit(&s1)), (d2.clone(), unit(&s2))]);
            match phase {
                DisablePhase::Config => *disabler.on_validate.lock() = Some(hook),
                DisablePhase::PreRunner => *disabler.on_pre_run.lock() = Some(hook),
                DisablePhase::Service => {
                    let service_disabler: UnitRef = PreRunFn::arc("service-disabler", move || {
                        hook();
                        async { Ok::<_, UnitError>(()) }
                    });
                    group.register(&[service_disabler]);
                }
            }

            let hit1 = svcs.contains(&"--s1-disable");
            let hit2 = svcs.contains(&"--s2-disable");
            let mut wait_for = Vec::new();
            if !hit1 {
                wait_for.push(s1.started.clone());
            }
            if !hit2 {
                wait_for.push(s2.started.clone());
            }
            group.register(&[interrupter(wait_for)]);

            let mut args = vec!["./myService"];
            args.extend(svcs.iter().copied());
            let err = run_bounded(&group, &args).await.expect_err("interrupter ends the run");
            assert!(err.is::<Irq>(), "{case}: {err}");

            for (svc, hit) in [(&s1, hit1), (&s2, hit2)] {
                let want = Disabled::after(phase, hit);
                let name = svc.name;
                assert_eq!(svc.validated.load(Ordering::SeqCst), !want.config, "{case}: {name} config");
                assert_eq!(svc.pre_ran.load(Ordering::SeqCst), !want.pre_run, "{case}: {name} pre-run");
                assert_eq!(svc.served_and_stopped(), !want.serve, "{case}: {name} serve");
            }
            assert_eq!(s3.initialized.load(Ordering::SeqCst), 0, "{case}: s3 initialized");
            assert!(!s3.validated.load(Ordering::SeqCst), "{case}: s3 validated");
            assert!(!s3.served.load(Ordering::SeqCst), "{case}: s3 served");
        }
    }
}

#[test]
#[should_panic(expected = "ambiguous service ambiguous encountered")]
fn test_ambiguous_service_panics() {
    let group = quiet(GroupConfig::default());
    group.register(&[Arc::new(Ambiguous) as UnitRef]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trigger_shuts_down_cleanly() {
    let (group, rec) = recorded(GroupConfig::named("api"));
    let trigger = Arc::new(Trigger::new("trigger"));
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));

    group.register(&[unit(&trigger), unit(&svc)]);

    let started = svc.started.clone();
    let t = trigger.clone();
    tokio::spawn(async move {
        started.cancelled().await;
        t.close();
    });

    run_bounded(&group, &["api"]).await.expect("requested shutdown is clean");

    assert!(trigger.is_closed());
    assert!(svc.served_and_stopped());
    assert_eq!(rec.kinds().last(), Some(&EventKind::ShutdownRequested));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_returning_without_error_is_an_error() {
    let group = quiet(GroupConfig::named("api"));
    let ticker = Arc::new(Trigger::new("stays"));
    group.register(&[
        unit(&ticker),
        ServiceFn::arc("quitter", |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) }) as UnitRef,
    ]);

    let err = run_bounded(&group, &["api"]).await.expect_err("silent exit is an error");

    assert!(matches!(err, RunError::TerminatedWithoutError));
    assert_eq!(err.to_string(), "run terminated without explicit error condition");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_service_becomes_its_error() {
    let group = quiet(GroupConfig::named("api"));
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));
    let started = svc.started.clone();
    group.register(&[
        unit(&svc),
        ServiceFn::arc("panicker", move |_ctx: CancellationToken| {
            let started = started.clone();
            async move {
                started.cancelled().await;
                explode()
            }
        }) as UnitRef,
    ]);

    let err = run_bounded(&group, &["api"]).await.expect_err("panic ends the run");

    assert_eq!(err.to_string(), "serve panicker: panicked: boom");
    assert!(svc.served_and_stopped());
}

#[tokio::test]
async fn test_script_without_services_is_done() {
    let (group, rec) = recorded(GroupConfig::named("script"));
    let step: UnitRef = PreRunFn::arc("step", || async { Ok::<_, UnitError>(()) });
    group.register(&[step]);

    run_bounded(&group, &["script"]).await.expect("script run succeeds");

    assert_eq!(rec.kinds().last(), Some(&EventKind::Done));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_follow_phase_order() {
    let (group, rec) = recorded(GroupConfig::named("api"));
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));
    let trigger = Arc::new(Trigger::new("trigger"));
    let t = trigger.clone();
    group.register(&[
        unit(&svc),
        PreRunFn::arc("closer", move || {
            let t = t.clone();
            async move {
                t.close();
                Ok::<_, UnitError>(())
            }
        }) as UnitRef,
        unit(&trigger),
    ]);

    run_bounded(&group, &["api"]).await.expect("requested shutdown is clean");

    let order = [
        rec.position(EventKind::FlagSetRegistered, "svc"),
        rec.position(EventKind::ValidateStarting, "svc"),
        rec.position(EventKind::ValidateFinished, "svc"),
        rec.position(EventKind::PreRunStarting, "svc"),
        rec.position(EventKind::PreRunFinished, "closer"),
        rec.position(EventKind::ServeFinished, "trigger"),
        rec.position(EventKind::GracefulStopFinished, "svc"),
    ];
    assert!(order.iter().all(Option::is_some), "missing events: {:?}", rec.kinds());
    assert!(order.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", rec.kinds());

    let kinds = rec.kinds();
    let started = kinds.iter().position(|k| *k == EventKind::Started);
    assert!(started < rec.position(EventKind::PreRunStarting, "svc"));
    assert_eq!(kinds.last(), Some(&EventKind::ShutdownRequested));
}

#[test]
fn test_name_resolution_and_override() {
    let group = quiet(GroupConfig {
        help_text: "usage: {{.Name}} [flags]".into(),
        ..GroupConfig::default()
    });
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));
    group.register(&[unit(&svc)]);

    group
        .run_config_with(["/usr/local/bin/api", "migrate", "up"])
        .expect("config succeeds");

    assert_eq!(group.name(), "api");
    assert_eq!(*svc.group_name.lock(), "api");
    assert_eq!(group.args(), vec!["migrate".to_string(), "up".to_string()]);
    assert!(group.help_text().contains("usage: /usr/local/bin/api [flags]"));

    let named = quiet(GroupConfig::named("explicit"));
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));
    named.register(&[unit(&svc)]);
    named
        .run_config_with(["bin", "-n", "override"])
        .expect("config succeeds");

    assert_eq!(named.name(), "override");
    assert_eq!(*svc.group_name.lock(), "override");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_after_run_config_skips_config_phase() {
    let group = quiet(GroupConfig::named("api"));
    let svc = TestService::with_flags("svc", FlagSet::new("svc"));
    group.register(&[unit(&svc)]);

    group.run_config_with(["api"]).expect("config succeeds");
    assert!(group.is_configured());

    let late_cfg = Arc::new(FailingConfig("late"));
    let late_svc = TestService::with_flags("late", FlagSet::new("late"));
    group.register(&[unit(&late_cfg), unit(&late_svc)]);
    group.register(&[interrupter(vec![svc.started.clone(), late_svc.started.clone()])]);

    let err = run_bounded(&group, &["api", "--unknown"]).await.expect_err("interrupter ends the run");

    assert!(err.is::<Irq>(), "late configurable must not be validated: {err}");
    assert_eq!(svc.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(late_svc.initialized.load(Ordering::SeqCst), 1);
    assert!(!late_svc.validated.load(Ordering::SeqCst));
    assert!(late_svc.served_and_stopped());
}

#[test]
fn test_help_text_lists_flag_sections() {
    let group = quiet(GroupConfig::named("api"));
    let flags = FlagTestConfig::new();
    group.register(&[unit(&flags)]);
    group.run_config_with(["api"]).expect("config succeeds");

    let help = group.help_text();
    assert!(help.contains("Usage of api:"));
    assert!(help.contains("Common Service options"));
    assert!(help.contains("  -n, --name string"));
    assert!(help.contains("flag test config"));
    assert!(help.contains("  -f, --flagtest int   flagtester (default 10)"));
    assert!(!help.contains("show-rungroup-units"));
}

#[test]
fn test_list_units() {
    let group = quiet(GroupConfig::named("api"));
    group.register(&[
        PreRunFn::arc("migrate", || async { Ok::<_, UnitError>(()) }) as UnitRef,
        Arc::new(Trigger::new("trigger")) as UnitRef,
    ]);

    assert_eq!(group.list_units(), "Group: api [svc]\n- pre-run: migrate\n- serve: trigger");
}

#[tokio::test]
async fn test_run_releases_units_holding_the_group() {
    let group = quiet(GroupConfig::named("api"));
    let handle = group.clone();
    let holder: UnitRef = PreRunFn::arc("holder", move || {
        let _group = handle.clone();
        async { Ok::<_, UnitError>(()) }
    });
    let weak_unit = Arc::downgrade(&holder);
    let weak_group = Arc::downgrade(&group.inner);
    group.register(&[holder]);

    run_bounded(&group, &["api"]).await.expect("script run succeeds");
    drop(group);

    assert!(weak_unit.upgrade().is_none(), "unit outlived the run");
    assert!(weak_group.upgrade().is_none(), "group kept alive by its own unit");
}

#[tokio::test]
async fn test_bail_early_releases_units() {
    let group = quiet(GroupConfig::named("api"));
    let marker: UnitRef = PreRunFn::arc("marker", || async { Ok::<_, UnitError>(()) });
    let weak_unit = Arc::downgrade(&marker);
    group.register(&[marker]);

    run_bounded(&group, &["api", "--version"]).await.expect("version bails early");

    assert!(weak_unit.upgrade().is_none());
    assert_eq!(group.list_units(), "Group: api [cli]");
}

#[cfg(unix)]
#[test]
fn test_non_utf8_arguments_do_not_panic() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let group = quiet(GroupConfig::default());
    group
        .run_config_with([OsString::from_vec(b"/usr/bin/ap\xffi".to_vec())])
        .expect("binary name need not be UTF-8");
    assert_eq!(group.name(), "ap\u{FFFD}i");

    let group = quiet(GroupConfig::named("api"));
    let err = group
        .run_config_with([OsString::from("api"), OsString::from_vec(b"pos\xff".to_vec())])
        .expect_err("non UTF-8 positional is rejected");
    assert!(matches!(err, RunError::Flags(_)), "unexpected error: {err}");
}
