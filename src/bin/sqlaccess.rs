use sqlaccess::config::{self, Config};
use sqlaccess::{FetchMode, Params, QueryResult, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

const USAGE: &str = "usage: sqlaccess [--config <path>] [--single] (query|exec) <sql> [params-json]";

#[derive(Debug, PartialEq)]
enum Command {
    Query,
    Exec,
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    single: bool,
    command: Command,
    sql: String,
    params: Option<String>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> std::result::Result<Args, String> {
    let mut config = None;
    let mut single = false;
    let mut positional = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--single" => single = true,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("query") => Command::Query,
        Some("exec") => Command::Exec,
        Some(other) => return Err(format!("unknown command: {}", other)),
        None => return Err("missing command".to_string()),
    };
    let sql = positional.next().ok_or("missing SQL")?;
    let params = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    Ok(Args {
        config,
        single,
        command,
        sql,
        params,
    })
}

fn load(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => config::load_config(path),
        None => match config::default_config_path().filter(|path| path.exists()) {
            Some(path) => config::load_config(path),
            None => Ok(Config::default()),
        },
    }
}

fn run(args: &Args) -> Result<String> {
    let config = load(args)?;
    info!(config = ?config.connection, "loaded configuration");
    let mut db = config.open()?;

    let params = match &args.params {
        Some(json) => Params::from_json(serde_json::from_str(json)?),
        None => Params::default(),
    };

    match args.command {
        Command::Query => match db.query(&args.sql, params, args.single, FetchMode::Assoc)? {
            QueryResult::Row(row) => Ok(serde_json::to_string_pretty(&row)?),
            QueryResult::Rows(rows) => Ok(serde_json::to_string_pretty(&rows)?),
            QueryResult::Failed => Ok("null".to_string()),
        },
        Command::Exec => Ok(db.execute(&args.sql, params)?.to_string()),
    }
}

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber; stdout is for results
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
