use clap::{Parser as ClapParser, Subcommand};
use elexpr::cli::{self, CheckResult, CliError, EvalOptions};
use elexpr::config;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "elexpr")]
#[command(about = "elexpr - tokenize, parse and evaluate expression-language templates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate syntax only
    Check {
        /// Template or bare expression (reads from stdin if not provided)
        expression: Option<String>,
    },

    /// Print the token stream
    Tokens {
        /// Template or bare expression (reads from stdin if not provided)
        expression: Option<String>,
    },

    /// Evaluate and print the result as JSON
    Eval {
        /// Template or bare expression (reads from stdin if not provided)
        expression: Option<String>,

        /// Variables as a JSON object
        #[arg(long)]
        vars: Option<String>,

        /// Coerce the result to this type (e.g. Integer, int, String, Boolean)
        #[arg(long)]
        expect: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Coerce null to zero, false or empty for primitive and boxed targets
        #[arg(long)]
        coerce_to_zero: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ELEXPR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { expression } => run_check(expression),
        Commands::Tokens { expression } => run_tokens(expression),
        Commands::Eval {
            expression,
            vars,
            expect,
            pretty,
            coerce_to_zero,
        } => read_source(expression).and_then(|expression| {
            if coerce_to_zero {
                config::set_coerce_to_zero(Some(true));
            }
            let options = EvalOptions {
                expression,
                vars,
                expect,
                coerce_to_zero,
            };
            run_eval(&options, pretty)
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_source(source: Option<String>) -> Result<String, CliError> {
    match source {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
        }
        None => Ok(String::new()),
    }
}

fn run_check(source: Option<String>) -> Result<(), CliError> {
    let source = read_source(source)?;
    if let CheckResult::SyntaxValid = cli::execute_check(&source)? {
        println!("Syntax is valid");
    }
    Ok(())
}

fn run_tokens(source: Option<String>) -> Result<(), CliError> {
    let source = read_source(source)?;
    for token in cli::list_tokens(&source)? {
        println!("{}", cli::format_token(&token));
    }
    Ok(())
}

fn run_eval(options: &EvalOptions, pretty: bool) -> Result<(), CliError> {
    if let CheckResult::Success(output) = cli::execute_eval(options)? {
        let json = if pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{}", json);
    }
    Ok(())
}
