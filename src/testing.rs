//! In-crate fakes for the collaborator traits, shared by the module tests.

use crate::cluster::process::{ProcessControl, ResourceFault};
use crate::cluster::types::{DatabaseKind, MemberUptime};
use crate::error::ProcessControlError;
use crate::probe::handle::DatabaseHandle;

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scripted database. Every operation consumes one scripted result if any are
/// queued, otherwise follows the `down` flag.
pub struct FakeDatabase {
    kind: DatabaseKind,
    down: AtomicBool,
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
    ops: Mutex<Vec<&'static str>>,
    delay: Mutex<Option<Duration>>,
    hook: Mutex<Option<CallHook>>,
}

impl FakeDatabase {
    pub fn new(kind: DatabaseKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            down: AtomicBool::new(false),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            ops: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            hook: Mutex::new(None),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }

    /// Queues per-call results (`true` = success) ahead of the `down` flag.
    pub fn script(&self, results: &[bool]) {
        self.script.lock().unwrap().extend(results.iter().copied());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Runs `hook(call_number)` at the start of every operation (1-based).
    pub fn on_call(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.ops.lock().unwrap().clone()
    }

    async fn respond(&self, op: &'static str) -> anyhow::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.ops.lock().unwrap().push(op);

        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(call);
        }

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        let ok = scripted.unwrap_or_else(|| !self.is_down());

        if ok {
            Ok(json!({ "ok": 1, "op": op }))
        } else {
            Err(anyhow::anyhow!("{} unreachable", self.kind))
        }
    }
}

#[async_trait]
impl DatabaseHandle for FakeDatabase {
    fn kind(&self) -> DatabaseKind {
        self.kind
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.respond("ping").await.map(|_| ())
    }

    async fn find(&self, _filter: Value) -> anyhow::Result<Value> {
        self.respond("find").await
    }

    async fn insert(&self, _document: Value) -> anyhow::Result<Value> {
        self.respond("insert").await
    }

    async fn update(&self, _filter: Value, _update: Value) -> anyhow::Result<Value> {
        self.respond("update").await
    }

    async fn delete(&self, _filter: Value) -> anyhow::Result<Value> {
        self.respond("delete").await
    }

    async fn status(&self) -> anyhow::Result<Value> {
        self.respond("status").await
    }
}

/// Records every call and, when a member is wired to a fake database, takes
/// that database down on disruption and back up on restore.
#[derive(Default)]
pub struct RecordingProcessControl {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    resource_faults_supported: AtomicBool,
    wired: Mutex<HashMap<String, Arc<FakeDatabase>>>,
}

impl RecordingProcessControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn wire(&self, member: &str, database: Arc<FakeDatabase>) {
        self.wired
            .lock()
            .unwrap()
            .insert(member.to_string(), database);
    }

    /// Makes the named operation ("stop", "start", "partition", ...) fail.
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn support_resource_faults(&self) {
        self.resource_faults_supported.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, member: &str, down: Option<bool>) -> Result<(), ProcessControlError> {
        self.calls.lock().unwrap().push(format!("{}:{}", op, member));

        if self.failing.lock().unwrap().contains(op) {
            return Err(ProcessControlError::CommandFailed {
                command: format!("{} {}", op, member),
                stderr: "injected failure".to_string(),
            });
        }

        if let (Some(down), Some(db)) = (down, self.wired.lock().unwrap().get(member)) {
            db.set_down(down);
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessControl for RecordingProcessControl {
    async fn stop(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("stop", member, Some(true))
    }

    async fn start(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("start", member, Some(false))
    }

    async fn pause(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("pause", member, Some(true))
    }

    async fn unpause(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("unpause", member, Some(false))
    }

    async fn partition(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("partition", member, Some(true))
    }

    async fn heal(&self, member: &str) -> Result<(), ProcessControlError> {
        self.record("heal", member, Some(false))
    }

    async fn constrain(&self, member: &str, fault: ResourceFault) -> Result<(), ProcessControlError> {
        if !self.resource_faults_supported.load(Ordering::SeqCst) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("constrain-unsupported:{}", member));
            return Err(ProcessControlError::Unsupported(fault.to_string()));
        }
        self.record("constrain", member, Some(true))
    }

    async fn release(&self, member: &str, _fault: ResourceFault) -> Result<(), ProcessControlError> {
        self.record("release", member, Some(false))
    }

    async fn uptime(&self, member: &str) -> Result<MemberUptime, ProcessControlError> {
        self.record("uptime", member, None)?;
        Ok(MemberUptime::Known {
            seconds: 7200,
            hours: 2.0,
            status: "running".to_string(),
        })
    }
}
