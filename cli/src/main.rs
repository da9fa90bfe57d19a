//! pageflow CLI - paginate JSON documents into text or JSON sheets

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use pageflow::{
    CrossReferenceHandler, Document, Formatter, FormatterConfig, JsonFormat, PageSelection,
    Pagination, RenderOptions,
};

#[derive(Parser)]
#[command(name = "pageflow")]
#[command(version)]
#[command(about = "Paginate documents into fixed-cell pages and sheets", long_about = None)]
struct Cli {
    /// Formatter configuration (JSON)
    #[arg(long, global = true, value_name = "FILE", env = "PAGEFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Paginate a document and write the pages
    Format {
        /// Input document (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Prefix rows with the page margin (text only)
        #[arg(short, long)]
        margins: bool,

        /// Text between pages (text only)
        #[arg(long, value_name = "TEXT")]
        separator: Option<String>,

        /// Page range (e.g., "1-10", "1,3,5"; text only)
        #[arg(long)]
        pages: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document and pagination information
    Info {
        /// Input document (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain text, one row per line
    Text,
    /// Sheets, pages and rows as JSON
    Json,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Format {
            input,
            output,
            format: OutputFormat::Text,
            margins,
            separator,
            pages,
            ..
        } => cmd_text(
            &input,
            config,
            output.as_deref(),
            margins,
            separator,
            pages.as_deref(),
        ),
        Commands::Format {
            input,
            output,
            format: OutputFormat::Json,
            compact,
            ..
        } => cmd_json(&input, config, output.as_deref(), compact),
        Commands::Info { input } => cmd_info(&input, config),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> pageflow::Result<FormatterConfig> {
    match path {
        Some(path) => FormatterConfig::from_path(path),
        None => Ok(FormatterConfig::default()),
    }
}

fn paginate(
    input: &Path,
    config: &FormatterConfig,
) -> Result<(Document, Pagination), Box<dyn std::error::Error>> {
    let doc = Document::from_path(input)?;
    let formatter = Formatter::new(config.clone());
    let pagination = formatter.paginate(&doc, &mut CrossReferenceHandler::new())?;
    log::info!(
        "{}: {} pages in {} pass(es)",
        input.display(),
        pagination.page_count(),
        pagination.passes
    );
    Ok((doc, pagination))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        print!("{}", content);
    }
    Ok(())
}

fn cmd_text(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    margins: bool,
    separator: Option<String>,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_selection = match pages {
        Some(p) => PageSelection::parse(p)?,
        None => PageSelection::All,
    };

    let config = load_config(config)?;
    let (_, pagination) = paginate(input, &config)?;

    let mut render_options = RenderOptions::new()
        .with_margins(margins)
        .with_space_char(config.space_char)
        .with_pages(page_selection);
    if let Some(separator) = separator {
        render_options = render_options.with_page_separator(separator);
    }

    let text = pageflow::render::to_text(&pagination.sheets, &render_options)?;
    write_output(output, &text)
}

fn cmd_json(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let (_, pagination) = paginate(input, &config)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let mut json = pageflow::render::to_json(&pagination.sheets, format)?;
    json.push('\n');
    write_output(output, &json)
}

fn cmd_info(input: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let (doc, pagination) = paginate(input, &config)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "=".repeat(40));
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Sections".bold(), doc.sections.len());
    println!("{}: {}", "Blocks".bold(), doc.block_count());

    for (i, section) in doc.sections.iter().enumerate() {
        let master = &section.master;
        println!(
            "  {} {}: {}x{} cells, flow width {}, {}",
            "Section".bold(),
            i + 1,
            master.page_width,
            master.page_height,
            master.flow_width(),
            if master.duplex { "duplex" } else { "simplex" }
        );
    }

    println!();
    println!("{}", "Pagination".cyan().bold());
    println!("{}", "=".repeat(40));
    println!("{}: {}", "Sheets".bold(), pagination.sheet_count());
    println!("{}: {}", "Pages".bold(), pagination.page_count());
    println!("{}: {}", "Passes".bold(), pagination.passes);
    let breakable = pagination.sheets.iter().filter(|s| s.is_breakable()).count();
    println!("{}: {}", "Volume break points".bold(), breakable);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pageflow".cyan().bold(), env!("CARGO_PKG_VERSION"));
}
