use crate::pipeline::{Pipeline, Stage};
use std::io::{self, Cursor, Read, Write};

/// Signal a command handler returns to the surrounding loop.
///
/// Almost everything yields [`Flow::Continue`]; only `exit` and the
/// clearing/replaying forms of `history` yield [`Flow::Stop`], which ends
/// the interactive loop. Launching an external program can never stop the
/// loop, whatever the child's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading and executing commands.
    Continue,
    /// Terminate the interactive loop.
    Stop,
}

/// Where a command stage reads its input from.
///
/// The first stage of a pipeline inherits the shell's standard input; every
/// later stage is fed the previous stage's captured output.
#[derive(Clone, Copy)]
pub enum CommandInput<'a> {
    /// Inherit the shell's standard input.
    Inherit,
    /// Read from an in-memory buffer (the previous stage's output).
    Buffer(&'a [u8]),
}

impl<'a> CommandInput<'a> {
    /// Materialize the endpoint as a readable stream for an in-process
    /// builtin.
    pub(crate) fn reader(self) -> Box<dyn Read + 'a> {
        match self {
            CommandInput::Inherit => Box::new(io::stdin().lock()),
            CommandInput::Buffer(buf) => Box::new(Cursor::new(buf)),
        }
    }
}

/// Where a command stage writes its output to.
///
/// Only the last stage of a pipeline writes to the shell's standard output;
/// intermediate stages are captured so the next stage can consume them.
pub enum CommandOutput<'a> {
    /// Inherit the shell's standard output.
    Inherit,
    /// Collect into an in-memory buffer.
    Buffer(&'a mut Vec<u8>),
}

impl<'a> CommandOutput<'a> {
    /// Materialize the endpoint as a writable stream for an in-process
    /// builtin.
    pub(crate) fn writer(self) -> Box<dyn Write + 'a> {
        match self {
            CommandOutput::Inherit => Box::new(io::stdout().lock()),
            CommandOutput::Buffer(buf) => Box::new(buf),
        }
    }
}

/// Everything a single dispatch needs: the parsed command, the graph it
/// belongs to, and the I/O endpoints of its pipeline position.
///
/// All handlers share this one context. Most builtins only look at the
/// argument vector; the `history` builtin additionally uses [`Self::stage`]
/// and [`Self::graph`] to describe the invocation it replays on behalf of.
pub struct Invocation<'a> {
    /// The parsed command being executed.
    pub stage: &'a Stage,
    /// The full parsed graph the command came from.
    pub graph: &'a Pipeline,
    /// Input endpoint for this stage.
    pub stdin: CommandInput<'a>,
    /// Output endpoint for this stage.
    pub stdout: CommandOutput<'a>,
}

impl<'a> Invocation<'a> {
    /// The argument vector of the command, name first.
    pub fn argv(&self) -> &'a [String] {
        &self.stage.argv
    }
}
