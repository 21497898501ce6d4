//! SQLite driver for sqlrun

mod driver;
mod session;

pub use driver::SqliteDriver;
pub use session::SqliteSession;
