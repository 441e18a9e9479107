use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Cell, Table as ComfyTable};
use inmemsql::config::EngineConfig;
use inmemsql::driver::{Rows, Session, Transaction};
use inmemsql::{parse_instructions, Driver, Token};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// inmemsql interactive shell
#[derive(Parser, Debug)]
#[command(name = "inmemsql")]
#[command(about = "Interactive shell for the in-memory SQL engine", long_about = None)]
struct Args {
    /// Connection string: [PROTO:ADDR[,OPT=VAL]*]*DBNAME/USER/PASSWORD
    #[arg(long, default_value = "")]
    dsn: String,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Configuration file
    #[arg(long, default_value = "inmemsql.toml")]
    config: PathBuf,

    /// Run one command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,
}

/// What a line of input asks the shell to do.
enum Action {
    Begin,
    Commit,
    Rollback,
    Query,
    Exec,
}

fn classify(sql: &str) -> Action {
    // Unparsable input goes to the engine as-is so the error is reported there.
    let Ok(decls) = parse_instructions(sql) else {
        return Action::Exec;
    };
    match decls.as_slice() {
        [decl] if decl.token == Token::Begin => Action::Begin,
        [decl] if decl.token == Token::Commit => Action::Commit,
        [decl] if decl.token == Token::Rollback => Action::Rollback,
        [.., last] if last.token == Token::Select => Action::Query,
        _ => Action::Exec,
    }
}

fn render(rows: &Rows) -> String {
    if rows.is_empty() {
        return "(0 rows)".to_string();
    }

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(rows.columns.iter().map(Cell::new));
    for row in &rows.rows {
        table.add_row(row.iter().map(|c| Cell::new(c.as_deref().unwrap_or("NULL"))));
    }
    format!("{table}\n({} rows)", rows.len())
}

async fn run<'a>(
    session: &'a Session,
    tx: &mut Option<Transaction<'a>>,
    sql: &str,
) -> inmemsql::Result<String> {
    match classify(sql) {
        Action::Begin => {
            if tx.is_some() {
                return Ok("transaction already open".to_string());
            }
            *tx = Some(session.begin());
            Ok("BEGIN".to_string())
        }
        Action::Commit => match tx.take() {
            Some(t) => {
                let result = t.commit().await?;
                Ok(format!("COMMIT ({} rows affected)", result.rows_affected))
            }
            None => Ok("no transaction open".to_string()),
        },
        Action::Rollback => match tx.take() {
            Some(t) => {
                t.rollback()?;
                Ok("ROLLBACK".to_string())
            }
            None => Ok("no transaction open".to_string()),
        },
        Action::Query => {
            let rows = match tx {
                Some(t) => t.query(sql).await?,
                None => session.query(sql).await?,
            };
            Ok(render(&rows))
        }
        Action::Exec => match tx {
            Some(t) => {
                t.exec(sql)?;
                Ok(format!("queued ({} pending)", t.pending()))
            }
            None => {
                let result = session.exec(sql).await?;
                Ok(format!(
                    "OK, {} rows affected, last insert id {}",
                    result.rows_affected, result.last_insert_id
                ))
            }
        },
    }
}

fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let loglevel = level.parse::<simplelog::LevelFilter>()?;
    let mut logconfig = simplelog::ConfigBuilder::new();
    if loglevel != simplelog::LevelFilter::Debug {
        logconfig.add_filter_allow_str("inmemsql");
    }
    simplelog::SimpleLogger::init(loglevel, logconfig.build())?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // CLI args > ENV > config file > defaults
    let mut config = EngineConfig::load_from(&args.config)?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level)?;

    let driver = Driver::new(config);
    let session = driver.open(&args.dsn)?;
    let mut tx = None;

    if let Some(command) = args.command {
        let outcome = run(&session, &mut tx, &command).await;
        drop(tx);
        drop(session);
        driver.shutdown();
        println!("{}", outcome?);
        return Ok(());
    }

    let mut rl = DefaultEditor::new()?;
    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".inmemsql_history");
        p
    });
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path); // Ignore error if file doesn't exist
    }

    println!("inmemsql {} - engine '{}'", env!("CARGO_PKG_VERSION"), session.server().dsn());
    println!("Type \\? for help, \\q to quit.\n");

    loop {
        let prompt = if tx.is_some() { "inmemsql*> " } else { "inmemsql> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    "\\q" | "\\quit" | "quit" | "exit" => break,
                    "\\?" | "\\h" | "\\help" => {
                        println!("Meta-commands:");
                        println!("  \\q, \\quit          - Quit");
                        println!("  \\?, \\h, \\help      - Show this help");
                        println!("\nSQL: CREATE, DROP, TRUNCATE, INSERT, SELECT, UPDATE, DELETE,");
                        println!("     BEGIN / COMMIT / ROLLBACK (buffered, applied on commit)");
                        continue;
                    }
                    _ => {}
                }

                match run(&session, &mut tx, line).await {
                    Ok(output) => println!("{output}"),
                    Err(err) => eprintln!("ERROR: {err}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    if tx.is_some() {
        println!("open transaction discarded");
    }
    drop(tx);
    drop(session);
    driver.shutdown();
    Ok(())
}
