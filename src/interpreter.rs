use crate::builtin;
use crate::command::{Flow, Invocation};
use crate::env::Environment;
use crate::external;
use crate::history::History;
use crate::pipeline;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// A minimal interactive shell.
///
/// The shell owns the process environment view and the bounded history
/// store, reads one line at a time, records it, and runs the parsed
/// command graph. Each parsed command is resolved through [`dispatch`]
/// (builtin table first, external programs second).
///
/// [`dispatch`]: Shell::dispatch
pub struct Shell {
    pub(crate) env: Environment,
    pub(crate) history: History,
}

impl Shell {
    /// Create a shell that captures the current process environment.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            history: History::new(),
        }
    }

    /// Execute one parsed command.
    ///
    /// An empty argument vector is a no-op. Otherwise the builtin table is
    /// scanned first — a builtin always shadows an external program of the
    /// same name — and on a miss the command is launched as an external
    /// program, which can never stop the loop. The handler's continue/stop
    /// signal is propagated unchanged.
    pub fn dispatch(&mut self, inv: Invocation<'_>) -> Result<Flow> {
        let Some(name) = inv.argv().first() else {
            return Ok(Flow::Continue);
        };

        if let Some(builtin) = builtin::lookup(name) {
            return (builtin.run)(self, inv);
        }

        Ok(external::launch(&self.env, inv.argv(), inv.stdin, inv.stdout))
    }

    /// Parse and run one input line.
    ///
    /// Blank lines are no-ops. Parse errors are returned for the caller to
    /// report; execution failures inside the graph are reported on standard
    /// error by the stage runner and never surface here.
    pub fn eval(&mut self, line: &str) -> Result<Flow> {
        let graph = pipeline::parse(line)?;
        Ok(pipeline::execute(self, &graph))
    }

    /// Read-eval loop: prompt, record history, run, repeat.
    ///
    /// The loop ends on a stop signal (`exit`, `history -c`, a replay), on
    /// end of input, or on an interrupt. Every non-blank line is recorded
    /// in the history store before it runs, whether or not it parses.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut editor = DefaultEditor::new()?;

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    editor.add_history_entry(line.as_str())?;
                    self.history.append(&line);

                    match self.eval(&line) {
                        Ok(Flow::Stop) => break,
                        Ok(Flow::Continue) => {}
                        Err(err) => eprintln!("minish: {err:#}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("minish: {err}");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
