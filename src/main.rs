use std::{fs::File, io::Write, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use lembar::{
    executor::query::QueryResult,
    storage::storage_manager::StorageManager,
    types::error::{DatabaseError, ErrorKind},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "lembar", version, about = "Read-only SQLite file inspector")]
struct Cli {
    #[arg(value_name = "DB", help = "Path to the database file")]
    db_path: PathBuf,

    #[arg(
        value_name = "COMMAND",
        help = "Dot command or SELECT statement; starts a shell when omitted"
    )]
    command: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, help = "Output format for query results")]
    format: OutputFormat,

    #[arg(long, value_name = "FILE", help = "History file for the interactive shell")]
    history: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // a second init only happens in tests, ignore it
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_result(result: &QueryResult, format: OutputFormat) -> Result<(), DatabaseError> {
    match format {
        OutputFormat::Table => {
            for row in &result.rows {
                let line: Vec<String> = row.iter().map(ToString::to_string).collect();
                println!("{}", line.join("|"));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(result)
                .map_err(|e| DatabaseError::Io(std::io::Error::other(e)))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn run_command(
    storage: &mut StorageManager<File>,
    command: &str,
    format: OutputFormat,
) -> Result<(), DatabaseError> {
    debug!(command, "running command");
    match command {
        ".dbinfo" => {
            println!("database page size: {}", storage.header().page_size);
            println!("number of tables: {}", storage.schema().tables().count());
        }
        ".tables" => println!("{}", storage.table_names().join(" ")),
        ".indexes" => {
            for index in storage.schema().indexes() {
                println!("{} on {}", index.name, index.table_name);
            }
        }
        ".schema" => {
            for entry in &storage.schema().entries {
                if let Some(sql) = &entry.sql {
                    println!("{sql};");
                }
            }
        }
        sql => {
            let result = storage.execute(sql)?;
            print_result(&result, format)?;
        }
    }
    Ok(())
}

fn report(error: &DatabaseError) {
    match error.kind() {
        ErrorKind::NotFound | ErrorKind::Query => eprintln!("Error: {error}"),
        ErrorKind::Decode | ErrorKind::Io => eprintln!("Error: failed to read database: {error}"),
    }
}

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "lembar> ";

    loop {
        let line = rl.readline(prompt)?;
        let trimmed = line.trim_end();
        match trimmed.strip_suffix('\\') {
            Some(head) => {
                input.push_str(head);
                input.push(' ');
                prompt = "     -> ";
            }
            None => {
                input.push_str(trimmed);
                break;
            }
        }
    }

    Ok(input)
}

fn run_shell(storage: &mut StorageManager<File>, cli: &Cli) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    if let Some(history) = &cli.history {
        // a missing history file is normal on first use
        let _ = rl.load_history(history);
    }

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim();
                match command {
                    "" => continue,
                    ".exit" | ".quit" | "exit" | "quit" => break,
                    ".help" => {
                        println!(
                            r#"
Available commands:
  .dbinfo          - Page size and number of tables
  .tables          - List user tables
  .indexes         - List indexes
  .schema          - Print stored CREATE statements
  .exit, .quit     - Leave the shell
  SELECT ...       - Run a query

Use '\' at the end of a line for multiline input.
"#
                        );
                    }
                    _ => {
                        rl.add_history_entry(command)?;
                        if let Err(e) = run_command(storage, command, cli.format) {
                            report(&e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    if let Some(history) = &cli.history {
        rl.save_history(history)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let mut storage = match StorageManager::open(&cli.db_path) {
        Ok(storage) => storage,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Some(command) => match run_command(&mut storage, command.trim(), cli.format) {
            Ok(()) => {
                let _ = std::io::stdout().flush();
                ExitCode::SUCCESS
            }
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        },
        None => match run_shell(&mut storage, &cli) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
