use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tagql::Config;
use tagql::cli::{self, CheckOptions, CheckResult, CliError, CompileOptions};
use tagql::sql::Query;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "tagql")]
#[command(about = "tagql - A tag search language compiled to parameterized PostgreSQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a search, or match it against a JSON document
    Check {
        /// The search to check
        query: String,

        /// JSON document (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Field bare terms bind to
        #[arg(long, default_value = "id")]
        primary: String,

        /// Keep b"..." literals encoded
        #[arg(long)]
        raw_base64: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't match
        #[arg(long)]
        syntax_only: bool,
    },

    /// Compile a search to SQL for a schema
    Compile {
        /// The search to compile
        query: String,

        /// Schema JSON file (reads from stdin if not provided)
        #[arg(short, long)]
        schema: Option<String>,

        /// Page size
        #[arg(long)]
        size: Option<u64>,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        skip: u64,

        /// Sort fields, '-' prefix for descending
        #[arg(long, default_value = "")]
        sort: String,

        /// Group and count by these fields
        #[arg(long, default_value = "")]
        summary: String,

        /// Option groups to include
        #[arg(short, long)]
        option: Vec<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'tagql docs' to list categories)
        category: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            query,
            input,
            primary,
            raw_base64,
            pretty,
            syntax_only,
        } => run_check(
            CheckOptions {
                query,
                input,
                primary,
                raw_base64,
                syntax_only,
            },
            pretty,
        ),
        Commands::Compile {
            query,
            schema,
            size,
            skip,
            sort,
            summary,
            option,
            pretty,
        } => run_compile(
            Query {
                search: query,
                size,
                skip,
                sort,
                summary,
            },
            schema,
            option,
            pretty,
        ),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => match cli::get_doc_category(&category) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_stdin() -> Result<Option<String>, CliError> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(Some(buffer))
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_check(mut options: CheckOptions, pretty: bool) -> Result<(), CliError> {
    if options.input.is_none() && !options.syntax_only {
        options.input = read_stdin()?;
    }

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid { canonical, tree } => {
            if pretty {
                print_json(&tree, true)?;
            } else {
                println!("{}", canonical);
            }
        }
        CheckResult::Matched(matched) => println!("{}", matched),
    }
    Ok(())
}

fn run_compile(
    query: Query,
    schema: Option<String>,
    option: Vec<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let schema = match schema {
        Some(path) => std::fs::read_to_string(path)?,
        None => read_stdin()?.ok_or(CliError::NoInput)?,
    };

    let options = CompileOptions {
        query,
        schema,
        options: option,
    };
    let stmt = cli::execute_compile(&options, &Config::from_env())?;
    print_json(&stmt, pretty)
}
