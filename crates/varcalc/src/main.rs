//! varcalc: evaluate expressions over named shared bindings
//!
//! ```text
//! varcalc --bind a=10 --bind b=2 "a ^ b"
//! varcalc --bind hp=100          # interactive
//! ```

mod session;

use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use session::{parse_binding, Input, Session};

#[derive(Parser, Debug)]
#[command(name = "varcalc", version, about)]
struct Args {
    /// Create a shared binding, NAME=VALUE. Repeatable.
    #[arg(long = "bind", value_name = "NAME=VALUE")]
    binds: Vec<String>,

    /// Expression to evaluate. Starts an interactive session when omitted.
    expression: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let args = Args::parse();

    let mut session = Session::new();
    for bind in &args.binds {
        let (name, value) = parse_binding(bind)?;
        session.set(&name, value);
    }

    match args.expression {
        Some(source) => {
            println!("{}", session.evaluate(&source)?);
            Ok(())
        }
        None => run_repl(&mut session),
    }
}

fn run_repl(session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("varcalc> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let input = match Input::parse(trimmed) {
                    Ok(input) => input,
                    Err(err) => {
                        eprintln!("error: {:#}", err);
                        continue;
                    }
                };

                match input {
                    Input::Quit => break,
                    Input::Vars => {
                        for (name, value) in session.vars() {
                            println!("{} = {}", name, value);
                        }
                    }
                    Input::Assign { name, source } => match session.assign(&name, &source) {
                        Ok(value) => println!("{} = {}", name, value),
                        Err(err) => eprintln!("error: {:#}", err),
                    },
                    Input::Evaluate(source) => match session.evaluate(&source) {
                        Ok(value) => println!("{}", value),
                        Err(err) => eprintln!("error: {:#}", err),
                    },
                }
            }
            // Ctrl-C clears the line
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
