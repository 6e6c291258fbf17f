//! Helpers shared by the builders and the supervisor.

pub(crate) mod utils;
