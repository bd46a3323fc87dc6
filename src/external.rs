use crate::command::{CommandInput, CommandOutput};
use crate::env::Environment;
use crate::Flow;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Launch an external program and wait for it to terminate.
///
/// The child runs in the foreground: the call blocks until it exits
/// normally or dies to a signal (a merely suspended child keeps the wait
/// alive). Resolution failures and spawn failures are reported to standard
/// error and the shell keeps running — launching a program can never stop
/// the loop, so the return value is always [`Flow::Continue`].
pub(crate) fn launch(
    env: &Environment,
    argv: &[String],
    input: CommandInput<'_>,
    output: CommandOutput<'_>,
) -> Flow {
    let Some((name, args)) = argv.split_first() else {
        return Flow::Continue;
    };

    let search_paths = env.get_var("PATH").unwrap_or_default();
    let Some(program) = find_command_path(OsStr::new(&search_paths), Path::new(name)) else {
        eprintln!("minish: {name}: command not found");
        return Flow::Continue;
    };

    let mut command = Command::new(program.as_ref());
    command
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .stdin(match input {
            CommandInput::Inherit => Stdio::inherit(),
            CommandInput::Buffer(_) => Stdio::piped(),
        })
        .stdout(match &output {
            CommandOutput::Inherit => Stdio::inherit(),
            CommandOutput::Buffer(_) => Stdio::piped(),
        });

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            eprintln!("minish: {name}: {err}");
            return Flow::Continue;
        }
    };

    if let CommandInput::Buffer(buf) = input {
        // Feed the previous stage's output, then close the pipe so the
        // child sees end-of-input.
        if let Some(mut child_stdin) = child.stdin.take() {
            if let Err(err) = child_stdin.write_all(buf) {
                eprintln!("minish: {name}: {err}");
            }
        }
    }

    match output {
        CommandOutput::Buffer(sink) => match child.wait_with_output() {
            Ok(collected) => sink.extend_from_slice(&collected.stdout),
            Err(err) => eprintln!("minish: {name}: {err}"),
        },
        CommandOutput::Inherit => {
            // The child's exit status is not interpreted.
            if let Err(err) = child.wait() {
                eprintln!("minish: {name}: {err}");
            }
        }
    }

    Flow::Continue
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - `./`-prefixed path (any existing path on non-Unix): returned if it
///   exists.
/// - Relative path with multiple components (e.g. `bin/tool`): returned if
///   it exists.
/// - Single component: the first match found in `search_paths` (PATH).
/// - Empty path: `None`.
pub(crate) fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return existing(path).map(Cow::Borrowed);
    }

    let try_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if try_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next()?;
    match components.next() {
        // Single component: search each PATH directory in order.
        None => find_in_path(search_paths, first.as_os_str()).map(Cow::Owned),
        // Multiple components: resolve relative to the current directory.
        Some(_) => existing(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.exists())
}

fn existing(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandInput, CommandOutput};
    use crate::env::Environment;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_path_resolves_to_itself() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path).expect("/bin/sh should exist");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_missing_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("/bin/nonexisting")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_is_searched_in_path() {
        let found = find_command_path(osstr("/bin"), Path::new("sh"))
            .expect("'sh' should be found in /bin");
        assert!(found.as_ref().starts_with("/bin"));
        assert!(found.as_ref().ends_with("sh"));
    }

    #[test]
    #[cfg(unix)]
    fn single_component_missing_from_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("no_such_tool_here")).is_none());
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(OsStr::new("/bin"), Path::new("")).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn absolute_path_outside_search_dirs_still_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool.sh");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        let found = find_command_path(osstr("/bin"), &tool).unwrap();
        assert_eq!(found.as_ref(), tool.as_path());
    }

    #[test]
    fn launch_of_missing_program_continues() {
        let env = Environment::new();
        let argv = vec!["definitely_not_a_real_command_4269".to_string()];

        let flow = launch(&env, &argv, CommandInput::Inherit, CommandOutput::Inherit);

        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn launch_of_empty_argv_continues() {
        let env = Environment::new();
        let flow = launch(&env, &[], CommandInput::Inherit, CommandOutput::Inherit);
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    #[cfg(unix)]
    fn launch_captures_child_output_into_buffer() {
        let env = Environment::new();
        let argv = vec!["/bin/echo".to_string(), "spawned".to_string()];
        let mut out = Vec::new();

        let flow = launch(
            &env,
            &argv,
            CommandInput::Inherit,
            CommandOutput::Buffer(&mut out),
        );

        assert_eq!(flow, Flow::Continue);
        assert_eq!(String::from_utf8(out).unwrap(), "spawned\n");
    }

    #[test]
    #[cfg(unix)]
    fn launch_feeds_buffered_input_to_child_stdin() {
        let env = Environment::new();
        let argv = vec!["/bin/cat".to_string()];
        let mut out = Vec::new();

        let flow = launch(
            &env,
            &argv,
            CommandInput::Buffer(b"piped through\n"),
            CommandOutput::Buffer(&mut out),
        );

        assert_eq!(flow, Flow::Continue);
        assert_eq!(String::from_utf8(out).unwrap(), "piped through\n");
    }
}
