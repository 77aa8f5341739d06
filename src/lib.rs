#![forbid(unsafe_code)]

//! Bridge between an unprivileged front end and the root-owned MockGPS
//! location config.
//!
//! - `codec`: `key=value` document parsing, serialization, JSON view
//! - `privilege`: elevated command execution and shell quoting
//! - `bridge`: read/write/notify operations and their dispatch

pub mod bridge;
pub mod codec;
pub mod constants;
pub mod location;
pub mod privilege;
pub mod settings;
