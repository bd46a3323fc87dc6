use crate::command::{CommandInput, CommandOutput, Invocation};
use crate::interpreter::Shell;
use crate::Flow;
use thiserror::Error;

/// One parsed command: a program or builtin name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Argument vector, name first. Empty only for hand-built values; the
    /// parser never produces an empty stage.
    pub argv: Vec<String>,
}

impl Stage {
    /// The command name, or `""` for an empty argument vector.
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

/// The parsed form of one input line: commands connected by pipe operators.
///
/// A line without a `|` parses to a single stage; a blank line parses to no
/// stages at all. The graph owns its stages, so releasing it is dropping it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    /// Stages in execution order.
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Whether the line parsed to no commands at all.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Errors from [`parse`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `|` with nothing but whitespace on one side of it.
    #[error("empty command between pipe operators")]
    EmptyStage,
}

/// Split a line into a command graph.
///
/// Stages are separated by `|`; within a stage, arguments are separated by
/// whitespace. There is no quoting and no escaping. Arbitrary text is
/// accepted, including a single unpiped command; only a pipe operator with
/// an empty side is rejected.
pub fn parse(line: &str) -> Result<Pipeline, ParseError> {
    if line.trim().is_empty() {
        return Ok(Pipeline::default());
    }

    let mut stages = Vec::new();
    for segment in line.split('|') {
        let argv: Vec<String> = segment.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(ParseError::EmptyStage);
        }
        stages.push(Stage { argv });
    }
    Ok(Pipeline { stages })
}

/// Identifies the `history` invocation a nested pipeline was started from.
///
/// Built on the replaying call's stack and handed down by reference, so a
/// replay nested inside another replay gets its own context and cannot
/// clobber the outer one's.
pub struct ReplayContext<'a> {
    /// The parsed `history N` command that triggered the replay.
    pub origin: &'a Stage,
    /// The stored line being re-executed.
    pub line: &'a str,
}

/// Run every stage of a graph in order, connecting them through in-memory
/// buffers.
///
/// The shell's own standard input and output are used at the ends of the
/// chain. A [`Flow::Stop`] from any stage short-circuits the rest.
pub fn execute(shell: &mut Shell, graph: &Pipeline) -> Flow {
    run_stages(
        shell,
        graph,
        None,
        CommandInput::Inherit,
        CommandOutput::Inherit,
    )
}

/// Stage runner behind [`execute`], with explicit end-of-chain endpoints.
///
/// The first stage reads from `input` and the last writes to `output`, so a
/// replay triggered from inside a pipeline inherits the replaying command's
/// position in it. Each stage is handed back to [`Shell::dispatch`]; a
/// failed stage is reported on standard error (attributed to `replay` when
/// one is active) and contributes empty output to the next stage.
pub(crate) fn run_stages(
    shell: &mut Shell,
    graph: &Pipeline,
    replay: Option<&ReplayContext<'_>>,
    input: CommandInput<'_>,
    output: CommandOutput<'_>,
) -> Flow {
    let Some(last) = graph.stages.len().checked_sub(1) else {
        return Flow::Continue;
    };

    let mut final_output = Some(output);
    let mut carried: Vec<u8> = Vec::new();
    for (position, stage) in graph.stages.iter().enumerate() {
        let fed = std::mem::take(&mut carried);
        let stdin = if position == 0 {
            input
        } else {
            CommandInput::Buffer(&fed)
        };

        let mut captured = Vec::new();
        let stdout = if position == last {
            final_output.take().unwrap_or(CommandOutput::Inherit)
        } else {
            CommandOutput::Buffer(&mut captured)
        };

        let invocation = Invocation {
            stage,
            graph,
            stdin,
            stdout,
        };
        match shell.dispatch(invocation) {
            Ok(Flow::Stop) => return Flow::Stop,
            Ok(Flow::Continue) => {}
            Err(err) => report_stage_failure(replay, &err),
        }

        carried = captured;
    }
    Flow::Continue
}

fn report_stage_failure(replay: Option<&ReplayContext<'_>>, err: &anyhow::Error) {
    match replay {
        Some(ctx) => eprintln!(
            "minish: `{}` (replayed by `{}`): {:#}",
            ctx.line,
            ctx.origin.argv.join(" "),
            err
        ),
        None => eprintln!("minish: {:#}", err),
    }
}
