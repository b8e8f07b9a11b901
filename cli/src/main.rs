use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use pierogi_compiler::{
    compiler::compile,
    error::PierogiError,
    parser::SchemaParser,
    schema_to_json,
    tokenizer::SchemaLexer,
    types::Schema,
};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "pierogi")]
#[command(about = "Parse and validate Pierogi schemas", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SchemaInput {
    /// Input `.pie` schema files, compiled together as one schema
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Namespace recorded on the compiled schema
    #[arg(short, long, default_value = "")]
    namespace: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the schema parses and validates, and summarize its definitions
    Check {
        #[command(flatten)]
        input: SchemaInput,
    },

    /// Write the compiled schema graph as JSON
    Dump {
        #[command(flatten)]
        input: SchemaInput,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Compile the inputs, rendering any failure as `file:line:column: message`.
fn compile_input(input: &SchemaInput) -> Result<Schema, String> {
    let lexer = SchemaLexer::from_schema_paths(&input.inputs);
    let parser = SchemaParser::new(lexer.clone(), &input.namespace);
    compile(parser).map_err(|err| render_error(&lexer, &err))
}

fn render_error(lexer: &SchemaLexer, err: &PierogiError) -> String {
    match err.span() {
        Some(span) => {
            let file = lexer.file_name(span.file).unwrap_or_else(|| "<unknown>".to_string());
            format!("{}:{}:{}: {}", file, span.start.line, span.start.column, err)
        }
        None => err.to_string(),
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Check { input } => {
            let schema = compile_input(input)?;
            for def in schema.definitions.values() {
                println!(
                    "{}{} {} ({} fields, {} attributes)",
                    if def.is_read_only { "readonly " } else { "" },
                    def.kind.keyword(),
                    def.name,
                    def.fields.len(),
                    def.attributes.len()
                );
            }
            println!("OK: {} definitions", schema.definitions.len());
            Ok(())
        }

        Commands::Dump { input, output } => {
            let schema = compile_input(input)?;
            let json = schema_to_json(&schema).map_err(|e| e.to_string())?;
            if let Some(out_path) = output {
                fs::write(out_path, &json).map_err(|e| format!("{}: {}", out_path.display(), e))?;
                debug!(path = %out_path.display(), "wrote schema json");
                println!("Schema written to {}", out_path.display());
            } else {
                println!("{}", json);
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
