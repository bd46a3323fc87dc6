use crate::command::{Flow, Invocation};
use crate::interpreter::Shell;
use crate::pipeline::{self, ReplayContext};
use anyhow::{bail, Context, Result};
use argh::{EarlyExit, FromArgs};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;

/// Uniform signature every builtin handler shares.
///
/// Handlers that need nothing beyond the argument vector simply ignore the
/// rest of the invocation context.
pub(crate) type Handler = for<'a> fn(&mut Shell, Invocation<'a>) -> Result<Flow>;

/// One entry of the builtin table.
pub(crate) struct Builtin {
    pub name: &'static str,
    pub run: Handler,
}

/// Commands implemented inside the shell process, known at compile time.
///
/// Names are distinct by construction; resolution is a linear scan with the
/// first match winning.
pub(crate) const BUILTINS: &[Builtin] = &[
    Builtin { name: "cd", run: run_parsed::<Cd> },
    Builtin { name: "help", run: run_parsed::<Help> },
    Builtin { name: "exit", run: run_parsed::<Exit> },
    Builtin { name: "history", run: run_history },
    Builtin { name: "pwd", run: run_parsed::<Pwd> },
    Builtin { name: "echo", run: run_parsed::<Echo> },
    Builtin { name: "cat", run: run_parsed::<Cat> },
    Builtin { name: "wc", run: run_parsed::<Wc> },
    Builtin { name: "grep", run: run_parsed::<Grep> },
];

/// Find the builtin registered under `name`, if any.
pub(crate) fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Builtins whose arguments are parsed with [`argh`].
///
/// Implementors get the shell state and this stage's streams; the returned
/// signal follows shell conventions ([`Flow::Stop`] only from `exit`).
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    fn execute(
        self,
        shell: &mut Shell,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow>;
}

/// Adapter fitting an argh-parsed builtin into the table's [`Handler`]
/// signature.
///
/// Argument errors surface as usage text on standard error and `--help`
/// output on the stage's standard output; neither stops the loop.
fn run_parsed<T: BuiltinCommand>(shell: &mut Shell, inv: Invocation<'_>) -> Result<Flow> {
    let argv = inv.argv();
    let Some((name, rest)) = argv.split_first() else {
        return Ok(Flow::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    match T::from_args(&[name.as_str()], &args) {
        Ok(cmd) => {
            let mut stdin = inv.stdin.reader();
            let mut stdout = inv.stdout.writer();
            cmd.execute(shell, &mut *stdin, &mut *stdout)
        }
        Err(EarlyExit { output, status }) => {
            if status.is_ok() {
                let mut stdout = inv.stdout.writer();
                writeln!(stdout, "{output}")?;
            } else {
                eprintln!("{output}");
            }
            Ok(Flow::Continue)
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub(crate) struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current one
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn execute(
        self,
        shell: &mut Shell,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
    ) -> Result<Flow> {
        let Some(target) = self.target.filter(|t| !t.is_empty()) else {
            bail!("cd: expected an argument");
        };

        let target = PathBuf::from(target);
        let requested = if target.is_absolute() {
            target
        } else {
            shell.env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&requested)
            .with_context(|| format!("cd: {}", requested.display()))?;
        std::env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        shell.env.current_dir = canonical;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the commands built into the shell.
pub(crate) struct Help {}

impl BuiltinCommand for Help {
    fn execute(
        self,
        _shell: &mut Shell,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        writeln!(stdout, "minish — a small interactive shell")?;
        writeln!(stdout, "Type program names and arguments, then press enter.")?;
        writeln!(stdout, "The following commands are built in:")?;
        for builtin in BUILTINS {
            writeln!(stdout, "  {}", builtin.name)?;
        }
        writeln!(
            stdout,
            "Use the man command for information on other programs."
        )?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub(crate) struct Exit {
    #[argh(positional, greedy)]
    /// exit status, accepted for familiarity and otherwise ignored
    pub _status: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn execute(
        self,
        _shell: &mut Shell,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
    ) -> Result<Flow> {
        Ok(Flow::Stop)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
pub(crate) struct Pwd {}

impl BuiltinCommand for Pwd {
    fn execute(
        self,
        shell: &mut Shell,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        writeln!(stdout, "{}", shell.env.current_dir.to_string_lossy())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
/// A trailing newline is printed unless -n is given.
pub(crate) struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn execute(
        self,
        _shell: &mut Shell,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        let joined = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{joined}")?;
        } else {
            writeln!(stdout, "{joined}")?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print files (or standard input) to standard output.
pub(crate) struct Cat {
    #[argh(positional, greedy)]
    /// files to print; standard input when omitted
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn execute(
        self,
        _shell: &mut Shell,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        if self.files.is_empty() {
            std::io::copy(stdin, stdout)?;
            return Ok(Flow::Continue);
        }
        for name in &self.files {
            let mut file = fs::File::open(name).with_context(|| format!("cat: {name}"))?;
            std::io::copy(&mut file, stdout)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Count lines, words and bytes.
pub(crate) struct Wc {
    #[argh(positional, greedy)]
    /// files to count; standard input when omitted
    pub files: Vec<String>,
}

impl Wc {
    fn counts(text: &str) -> (usize, usize, usize) {
        let lines = text.lines().count();
        let words = text.split_whitespace().count();
        let bytes = text.len();
        (lines, words, bytes)
    }
}

impl BuiltinCommand for Wc {
    fn execute(
        self,
        _shell: &mut Shell,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        if self.files.is_empty() {
            let mut text = String::new();
            stdin.read_to_string(&mut text)?;
            let (lines, words, bytes) = Self::counts(&text);
            writeln!(stdout, "{lines} {words} {bytes}")?;
            return Ok(Flow::Continue);
        }
        for name in &self.files {
            let text = fs::read_to_string(name).with_context(|| format!("wc: {name}"))?;
            let (lines, words, bytes) = Self::counts(&text);
            writeln!(stdout, "{lines} {words} {bytes} {name}")?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print lines matching a pattern.
pub(crate) struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search; standard input when omitted
    pub files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,
}

impl Grep {
    fn scan(
        regex: &Regex,
        reader: impl BufRead,
        label: Option<&str>,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        for line in reader.lines() {
            let line = line.context("grep: read error")?;
            if regex.is_match(&line) {
                match label {
                    Some(name) => writeln!(stdout, "{name}:{line}")?,
                    None => writeln!(stdout, "{line}")?,
                }
            }
        }
        Ok(())
    }
}

impl BuiltinCommand for Grep {
    fn execute(
        self,
        _shell: &mut Shell,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("grep: invalid pattern: {pattern}"))?;

        if self.files.is_empty() {
            Self::scan(&regex, BufReader::new(stdin), None, stdout)?;
            return Ok(Flow::Continue);
        }
        for name in &self.files {
            match fs::File::open(name) {
                Ok(file) => Self::scan(&regex, BufReader::new(file), Some(name), stdout)?,
                Err(err) => eprintln!("minish: grep: {name}: {err}"),
            }
        }
        Ok(Flow::Continue)
    }
}

/// The `history` builtin: list, clear or replay a stored line.
///
/// With no arguments the store is listed in index order. `history -c`
/// clears the store and stops the loop, exactly like `exit`. A numeric
/// argument re-parses the stored line at that index and runs the resulting
/// graph through this invocation's own streams; the replay itself then
/// stops the loop. Anything else is ignored.
fn run_history(shell: &mut Shell, inv: Invocation<'_>) -> Result<Flow> {
    let stage = inv.stage;
    match stage.argv.as_slice() {
        [_] => {
            let mut stdout = inv.stdout.writer();
            for (index, line) in shell.history.iter() {
                writeln!(stdout, "{index} {line}")?;
            }
            Ok(Flow::Continue)
        }
        [_, flag] if flag == "-c" => {
            shell.history.clear();
            Ok(Flow::Stop)
        }
        [_, raw] => {
            let Ok(offset) = raw.parse::<i64>() else {
                eprintln!("minish: history: cannot convert `{raw}` to an index");
                return Ok(Flow::Continue);
            };
            // Valid offsets are 0..len; anything else leaves the store and
            // the loop untouched.
            let entry = usize::try_from(offset)
                .ok()
                .and_then(|index| shell.history.get(index));
            let Some(entry) = entry else {
                eprintln!("minish: history: no entry at index {offset}");
                return Ok(Flow::Continue);
            };

            let line = entry.to_string();
            let graph = pipeline::parse(&line)?;
            let replay = ReplayContext {
                origin: stage,
                line: &line,
            };
            pipeline::run_stages(shell, &graph, Some(&replay), inv.stdin, inv.stdout);
            Ok(Flow::Stop)
        }
        _ => Ok(Flow::Continue),
    }
}
