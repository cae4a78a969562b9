//! schema-convert CLI
//!
//! Infers schemas from JSON-lines samples and converts JSON-lines rows
//! against a schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use schema_convert::cli::commands::{handle_convert, handle_infer, load_options};
use schema_convert::cli::logging::init_logging;
use schema_convert::cli::output::{format_conversion_summary, format_inference_summary};
use schema_convert::convert::{BadRowPolicy, ConversionOptions};
use schema_convert::inference::InferenceConfig;

#[derive(Parser)]
#[command(
    name = "schema-convert",
    version,
    about = "Schema-driven row conversion and schema inference"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Infer a schema from sampled JSON-lines rows
    Infer(InferArgs),

    /// Convert JSON-lines rows against a schema
    Convert(ConvertArgs),
}

#[derive(Parser)]
struct InferArgs {
    /// Input JSON-lines file, or `-` for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Write the schema here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Maximum number of rows to sample
    #[arg(long, default_value_t = 100)]
    sample_limit: usize,

    /// Infer array items from the first element only
    #[arg(long)]
    shallow_arrays: bool,

    /// Name of the root record
    #[arg(long, default_value = "root")]
    root_name: String,

    /// Namespace for generated records
    #[arg(long)]
    namespace: Option<String>,

    /// Pretty-print the schema
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser)]
struct ConvertArgs {
    /// Schema file (Avro JSON)
    #[arg(short, long, value_name = "PATH")]
    schema: PathBuf,

    /// Input JSON-lines file, or `-` for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Write converted rows here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Conversion options file (toml, yaml or json)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// What to do with rows that fail to convert
    #[arg(long, value_enum)]
    on_bad_row: Option<PolicyArg>,

    /// Reject rows with more fields than the schema declares
    #[arg(long)]
    strict: bool,

    /// Recognize null and boolean tokens in every text cell
    #[arg(long)]
    infer_all_fields: bool,

    /// Time zone for naive timestamps (IANA name)
    #[arg(long)]
    time_zone: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Fail,
    Warn,
    Skip,
}

impl From<PolicyArg> for BadRowPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fail => BadRowPolicy::Fail,
            PolicyArg::Warn => BadRowPolicy::Warn,
            PolicyArg::Skip => BadRowPolicy::Skip,
        }
    }
}

/// Merge the config file with command-line overrides
fn conversion_options(args: &ConvertArgs) -> Result<ConversionOptions> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => ConversionOptions::default(),
    };
    if let Some(policy) = args.on_bad_row {
        options.on_bad_row = policy.into();
    }
    if args.strict {
        options.strict_schema = true;
    }
    if args.infer_all_fields {
        options.infer_all_fields = true;
    }
    if let Some(zone) = &args.time_zone {
        options.time_zone = Some(zone.clone());
    }
    Ok(options)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Infer(args) => {
            let mut builder = InferenceConfig::builder()
                .sample_limit(args.sample_limit)
                .shallow_arrays(args.shallow_arrays)
                .root_name(args.root_name);
            if let Some(namespace) = args.namespace {
                builder = builder.namespace(namespace);
            }
            let stats = handle_infer(&args.input, builder.build(), args.output.as_deref(), args.pretty)
                .context("infer failed")?;
            eprintln!("{}", format_inference_summary(&stats));
        }
        Command::Convert(args) => {
            let options = conversion_options(&args)?;
            let stats = handle_convert(&args.schema, &args.input, args.output.as_deref(), options)
                .context("convert failed")?;
            eprintln!("{}", format_conversion_summary(&stats));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
