use minish::Interpreter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

fn main() -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut sh = Interpreter::default();

    while !sh.should_exit() {
        match rl.readline("$ ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                if let Err(e) = sh.run_line(&line) {
                    eprintln!("{e}");
                }
            }
            // a cancelled line is discarded, the loop keeps going
            Err(ReadlineError::Interrupted) => continue,
            // end of input is an implicit `exit`
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    Ok(())
}
