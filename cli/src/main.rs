//! extrato CLI - bank statement transaction extraction

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use extrato::{Error, ExtractOptions, ExtractionResult, JsonFormat, Pipeline, Strategy, TextEngine};

/// Exit code for documents that need a password.
const EXIT_PROTECTED: i32 = 2;

#[derive(Parser)]
#[command(name = "extrato")]
#[command(version)]
#[command(about = "Extract transactions from bank statement PDFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract transactions from statement tables (with the statement total)
    Statement {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Password for protected documents
        #[arg(short, long, env = "EXTRATO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Extract transactions line by line with bank-specific rules
    Bank {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Raw-text engine
        #[arg(long, value_enum, default_value = "pdf-extract")]
        engine: Engine,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the detected issuing bank
    Classify {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Raw-text engine
        #[arg(long, value_enum, default_value = "pdf-extract")]
        engine: Engine,
    },

    /// Dump the raw extracted text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Raw-text engine
        #[arg(long, value_enum, default_value = "pdf-extract")]
        engine: Engine,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Extract several statements in parallel and print a summary
    Batch {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Extraction strategy
        #[arg(long, value_enum, default_value = "table")]
        strategy: StrategyArg,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Emit dates as YYYY-MM-DD
    #[arg(long)]
    iso_dates: bool,

    /// Year assumed for dates without one
    #[arg(long, value_name = "YEAR")]
    year: Option<i32>,

    /// Keep going when a page fails to render
    #[arg(long)]
    lenient: bool,
}

impl CommonArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new();
        if self.iso_dates {
            options = options.iso_dates();
        }
        if let Some(year) = self.year {
            options = options.with_reference_year(year);
        }
        if self.lenient {
            options = options.lenient();
        }
        options
    }

    fn json_format(&self) -> JsonFormat {
        if self.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// pdf-extract text rendering
    PdfExtract,
    /// Baseline-grouped content stream spans
    Layout,
}

impl From<Engine> for TextEngine {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::PdfExtract => TextEngine::PdfExtract,
            Engine::Layout => TextEngine::Layout,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Header-matched tables
    Table,
    /// Per-bank line rules
    Line,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Table => Strategy::Table,
            StrategyArg::Line => Strategy::Line,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Statement {
            input,
            password,
            common,
        } => cmd_statement(&input, password.as_deref(), &common),
        Commands::Bank {
            input,
            engine,
            common,
        } => cmd_bank(&input, engine, &common),
        Commands::Classify { input, engine } => cmd_classify(&input, engine),
        Commands::Text {
            input,
            engine,
            output,
        } => cmd_text(&input, engine, output.as_deref()),
        Commands::Batch {
            inputs,
            strategy,
            common,
        } => cmd_batch(&inputs, strategy, &common),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        let protected = matches!(e.downcast_ref::<Error>(), Some(Error::ProtectedDocument));
        std::process::exit(if protected { EXIT_PROTECTED } else { 1 });
    }
}

fn cmd_statement(
    input: &Path,
    password: Option<&str>,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let result = Pipeline::new(common.options()).extract_table(&bytes, password)?;
    write_result(&result, common)
}

fn cmd_bank(input: &Path, engine: Engine, common: &CommonArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let options = common.options().with_text_engine(engine.into());
    let result = Pipeline::new(options).extract_line(&bytes)?;
    write_result(&result, common)
}

fn cmd_classify(input: &Path, engine: Engine) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let options = ExtractOptions::new().with_text_engine(engine.into());
    let bank = Pipeline::new(options).classify_document(&bytes, None)?;
    println!("{}", bank);
    Ok(())
}

fn cmd_text(input: &Path, engine: Engine, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let options = ExtractOptions::new().with_text_engine(engine.into());
    let text = Pipeline::new(options).document_text(&bytes, None)?;
    write_output(&text, output)
}

fn cmd_batch(
    inputs: &[PathBuf],
    strategy: StrategyArg,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let documents = inputs.iter().map(fs::read).collect::<Result<Vec<_>, _>>()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {} documents...", documents.len()));

    let results = Pipeline::new(common.options()).extract_batch(&documents, strategy.into());
    pb.finish_and_clear();

    let mut summary = Vec::new();
    for (path, result) in inputs.iter().zip(results) {
        match result {
            Ok(r) => {
                println!(
                    "{} {} ({} transactions, {})",
                    "✓".green(),
                    path.display(),
                    r.transaction_count,
                    r.bank_type
                );
                summary.push(serde_json::json!({ "file": path.display().to_string(), "result": r }));
            }
            Err(e) => {
                println!("{} {}: {}", "✗".red(), path.display(), e);
                summary.push(serde_json::json!({ "file": path.display().to_string(), "error": e.to_string() }));
            }
        }
    }

    if let Some(path) = &common.output {
        let json = if common.compact {
            serde_json::to_string(&summary)?
        } else {
            serde_json::to_string_pretty(&summary)?
        };
        fs::write(path, json)?;
        println!("{} {}", "Saved to".green(), path.display());
    }
    Ok(())
}

fn write_result(result: &ExtractionResult, common: &CommonArgs) -> Result<(), Box<dyn std::error::Error>> {
    let json = result.to_json(common.json_format())?;
    write_output(&json, common.output.as_deref())
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}
