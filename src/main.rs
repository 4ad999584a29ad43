use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
// TODO: move the REPL behind a cargo feature so that library users don't pull
// in rustyline
use rustyline::{error::ReadlineError, Editor};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use dbconstraint::{ConstraintRegistry, Dialect, TableCheckExpression};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dbconstraint",
    about = "Translate SQL CHECK constraints into an SMT-LIB2 script"
)]
struct Opt {
    /// SQL dialect the constraints were written in (h2, derby, mysql, postgres, other)
    #[structopt(short, long, default_value = "h2")]
    dialect: Dialect,

    /// Table for lines that don't name one
    #[structopt(short, long, default_value = "CONSTRAINTS")]
    table: String,

    /// Where to write the script; stdout when omitted
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// One expression per line, optionally prefixed with `TABLE<TAB>`. Starts
    /// an interactive prompt when omitted.
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,
}

impl Opt {
    fn check(&self, line: &str) -> TableCheckExpression {
        match line.split_once('\t') {
            Some((table, expression)) => {
                TableCheckExpression::new(table.trim(), expression.trim(), self.dialect)
            }
            None => TableCheckExpression::new(self.table.as_str(), line.trim(), self.dialect),
        }
    }
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("--")
}

fn run_file(opt: &Opt, path: &Path, registry: &mut ConstraintRegistry) -> Result<()> {
    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let checks: Vec<_> = code
        .lines()
        .filter(|line| !is_blank_or_comment(line))
        .map(|line| opt.check(line))
        .collect();
    let encoded = registry.register_all(&checks);
    eprintln!("encoded {} of {} constraints", encoded, checks.len());

    Ok(())
}

fn run_repl(opt: &Opt, registry: &mut ConstraintRegistry) {
    let mut editor = Editor::<()>::new();

    // TODO: save/restore readline history
    loop {
        let readline = editor.readline("> ");
        match readline {
            Ok(line) => {
                if is_blank_or_comment(&line) {
                    continue;
                }
                editor.add_history_entry(line.as_str());

                match registry.register(&opt.check(&line)) {
                    Ok(()) => {
                        if let Some(encoded) = registry.encoded().last() {
                            println!("{}", encoded.condition);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::from_args();
    let mut registry = ConstraintRegistry::new();

    match &opt.input {
        Some(path) => run_file(&opt, path, &mut registry)?,
        None => run_repl(&opt, &mut registry),
    }

    for unsupported in registry.unsupported() {
        eprintln!(
            "unsupported: {}: {}",
            unsupported.table_name, unsupported.raw_text
        );
    }

    match &opt.output {
        Some(path) => registry.write_to_file(path)?,
        None => print!("{}", registry.render()),
    }

    Ok(())
}
