use minish::Shell;

fn main() {
    let mut shell = Shell::new();
    if let Err(err) = shell.repl() {
        eprintln!("minish: {err}");
    }
}
