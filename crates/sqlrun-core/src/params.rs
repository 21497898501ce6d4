//! Connection parameters

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters for opening a database session.
///
/// All fields are required here; defaults and validation belong to the
/// configuration layer. What `service_name` means is up to the driver
/// (an Oracle service, a SQLite file path, ...).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub service_name: String,
}

impl ConnectionParams {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port,
            service_name: service_name.into(),
        }
    }

    /// Loggable identity of the target, password omitted.
    pub fn endpoint(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.service_name
        )
    }
}

// Params flow through tracing spans; the password must not.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .finish()
    }
}
