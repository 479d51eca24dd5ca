//! Process-wide logging setup shared by binaries and black-box tests.

pub mod logging;

pub use logging::{init, init_with, LogFormat};
