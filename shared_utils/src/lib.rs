//! Small helpers shared by the workspace binaries: environment lookups and
//! the tracing bootstrap.

pub mod env;
pub mod logging;
