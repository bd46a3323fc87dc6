//! A small interactive shell with bounded command history.
//!
//! This crate provides the building blocks of a line-oriented command
//! interpreter: a fixed table of built-in commands, a launcher for external
//! programs discovered on `PATH`, a pipeline runner that connects stages
//! through in-memory buffers, and a capped history store whose entries can
//! be re-executed by index through the `history` builtin.
//!
//! The main entry point is [`Shell`], which reads lines, records them in
//! history and dispatches each parsed command. The public modules
//! [`command`], [`history`] and [`pipeline`] expose the types those pieces
//! communicate with.

mod builtin;
pub mod command;
pub mod env;
mod external;
pub mod history;
mod interpreter;
pub mod pipeline;

/// Convenient re-export of the interactive command runner.
///
/// See [`Shell`] for the high-level API.
pub use interpreter::Shell;

pub use command::Flow;
