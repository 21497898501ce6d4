//! Test doubles for runner and controller tests
//!
//! A scripted driver/session pair: any unit whose text contains `FAIL`
//! fails with a fixed error, and a probe shared with the test records
//! what ran and how often the session was closed.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use sqlrun_core::{
    ConnectionError, ConnectionParams, Driver, ExecutionError, Result, ScriptSource, Session,
    SqlRunError, Unit,
};

/// Marker that makes the fake session fail a unit.
pub const FAIL_MARKER: &str = "FAIL";

/// Observer the test keeps while the session lives inside the runner.
#[derive(Debug, Default)]
pub struct SessionProbe {
    executed: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
}

impl SessionProbe {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    probe: Arc<SessionProbe>,
    closed: AtomicBool,
}

#[async_trait]
impl Session for FakeSession {
    async fn execute_unit(&self, unit: &Unit) -> Result<()> {
        if self.is_closed() {
            return Err(SqlRunError::Execution(ExecutionError::new(
                "session is closed",
            )));
        }
        self.probe.executed.lock().push(unit.text.clone());
        if unit.text.contains(FAIL_MARKER) {
            return Err(SqlRunError::Execution(
                ExecutionError::new(format!("forced failure: {}", unit.text)).with_code("FAKE-1"),
            ));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.probe.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Driver producing [`FakeSession`]s, or refusing to connect at all.
#[derive(Default)]
pub struct FakeDriver {
    probe: Arc<SessionProbe>,
    refuse_with: Option<ConnectionError>,
    connect_calls: AtomicUsize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver whose `connect` always fails with `error`.
    pub fn refusing(error: ConnectionError) -> Self {
        Self {
            refuse_with: Some(error),
            ..Self::default()
        }
    }

    pub fn probe(&self) -> Arc<SessionProbe> {
        Arc::clone(&self.probe)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Session>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.refuse_with {
            return Err(SqlRunError::Connection(error.clone()));
        }
        Ok(Box::new(FakeSession {
            probe: Arc::clone(&self.probe),
            closed: AtomicBool::new(false),
        }))
    }

    async fn test_connection(&self, params: &ConnectionParams) -> Result<()> {
        self.connect(params).await.map(|_| ())
    }
}

pub fn test_params() -> ConnectionParams {
    ConnectionParams::new("tester", "secret", "localhost", 1521, "XE")
}

/// Write a script file into `dir` and return its source.
pub fn write_script(dir: &Path, name: &str, text: &str) -> ScriptSource {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write script file");
    ScriptSource::from_path(path)
}

/// A source whose path does not exist on disk.
pub fn missing_script(dir: &Path, name: &str) -> ScriptSource {
    ScriptSource::from_path(dir.join(name))
}
