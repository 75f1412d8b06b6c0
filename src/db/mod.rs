pub mod connection;
pub mod interests;
pub mod reports;
pub mod runs;

pub use connection::Database;
pub use reports::TopMember;
pub use runs::{RunOutcome, SyncRun};
