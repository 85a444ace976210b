//! dext - Data Extensions CLI tool
//!
//! A command line tool for appending to lists and setting entries in maps
//! nested inside YAML/JSON documents.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use data_extensions::value::{self, Value};
use data_extensions::{ShapePolicy, Upserter};

const DEFAULT_LOG_FILTER: &str = "data_extensions=warn,dext=warn";

#[derive(Debug, Parser)]
#[command(name = "dext", version, about = "Edit lists and maps nested inside YAML/JSON documents")]
struct Cli {
    /// Document to edit. Use '-' for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    /// What to do when the entry at the key holds the wrong shape
    #[arg(short, long, value_enum, default_value_t = ShapePolicy::Overwrite)]
    policy: ShapePolicy,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Append one value to the list at KEY
    Append {
        /// Key of the list, parsed as YAML
        #[arg(short, long)]
        key: String,
        /// Value to append, parsed as YAML
        value: String,
    },
    /// Append every element of a list to the list at KEY
    Extend {
        /// Key of the list, parsed as YAML
        #[arg(short, long)]
        key: String,
        /// List of values to append, parsed as YAML
        values: String,
    },
    /// Set SUB_KEY in the map at KEY
    Set {
        /// Key of the map, parsed as YAML
        #[arg(short, long)]
        key: String,
        /// Key inside the map, parsed as YAML
        #[arg(short, long)]
        sub_key: String,
        /// Value to store, parsed as YAML
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_input(&cli.input)?;
    let mut root = parse_document(&content)?;

    let upserter = Upserter::with_policy(cli.policy);
    debug!(policy = %cli.policy, "applying command");
    apply(&upserter, &mut root, cli.command)?;

    let rendered = render(&root, cli.format)?;
    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        let file = fs::File::create(&cli.output)
            .map_err(|e| format!("Failed to create output file {:?}: {}", cli.output, e))?;
        Box::new(file)
    };
    write!(output, "{}", rendered)?;

    Ok(())
}

fn read_input(input: &str) -> Result<String, Box<dyn std::error::Error>> {
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        Ok(content)
    } else {
        Ok(fs::read_to_string(input)
            .map_err(|e| format!("Failed to read file {:?}: {}", input, e))?)
    }
}

/// An empty document is an uninitialized root.
fn parse_document(content: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(value::from_yaml(content).map_err(|e| format!("Failed to parse document: {}", e))?)
}

fn parse_value(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(value::from_yaml(text).map_err(|e| format!("Failed to parse value {:?}: {}", text, e))?)
}

/// Keys are parsed like values so that `1` addresses an int key read from
/// the document.
fn parse_key(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(value::from_yaml(text).map_err(|e| format!("Failed to parse key {:?}: {}", text, e))?)
}

fn apply(
    upserter: &Upserter,
    root: &mut Value,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Append { key, value } => {
            let key = parse_key(&key)?;
            let item = parse_value(&value)?;
            debug!(%key, %item, "append");
            upserter.append_to_list(root, key, item)?;
        }
        Command::Extend { key, values } => {
            let key = parse_key(&key)?;
            let items = match parse_value(&values)? {
                Value::List(items) => items,
                other => {
                    let message =
                        format!("extend expects a list of values, got a {}", other.shape());
                    return Err(message.into());
                }
            };
            debug!(%key, count = items.len(), "extend");
            upserter.append_list_range(root, key, items)?;
        }
        Command::Set { key, sub_key, value } => {
            let key = parse_key(&key)?;
            let sub_key = parse_key(&sub_key)?;
            let value = parse_value(&value)?;
            debug!(%key, %sub_key, %value, "set");
            upserter.set_in_map(root, key, sub_key, value)?;
        }
    }
    Ok(())
}

fn render(root: &Value, format: Format) -> Result<String, Box<dyn std::error::Error>> {
    let rendered = match format {
        Format::Json => {
            let mut json = value::to_json_pretty(root)
                .map_err(|e| format!("Failed to serialize result: {}", e))?;
            json.push('\n');
            json
        }
        Format::Yaml => value::to_yaml(root)
            .map_err(|e| format!("Failed to serialize result: {}", e))?,
    };
    Ok(rendered)
}
