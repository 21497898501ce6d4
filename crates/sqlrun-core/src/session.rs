//! Driver and session traits

use async_trait::async_trait;

use crate::{ConnectionParams, Result, Unit};

/// One live database connection executing units for a single run.
///
/// Implementations use interior mutability; the run loop owns the session
/// exclusively for the run's duration and never shares it.
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute one unit and commit it immediately.
    ///
    /// Failures are scoped to the unit: the session stays usable for the
    /// next one unless the driver reports the connection dead, after
    /// which every later call fails fast with that condition. A commit
    /// failure surfaces exactly like an execution failure.
    async fn execute_unit(&self, unit: &Unit) -> Result<()>;

    /// Release the connection. Idempotent, and safe at any point between
    /// units.
    async fn close(&self) -> Result<()>;

    /// Whether `close` has taken effect.
    fn is_closed(&self) -> bool;
}

/// Factory for sessions against one kind of database.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Driver identifier used in logs and CLI output.
    fn name(&self) -> &'static str;

    /// Open a session. A single attempt; no retries.
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>>;

    /// Connect and probe, without handing the session out.
    async fn test_connection(&self, params: &ConnectionParams) -> Result<()>;
}
