//! Label layout CLI application.
//!
//! This binary lays out Bandcamp shipping label exports for printing,
//! either on 102×162 mm label stock annotated with order lines or two per
//! A4 sheet.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bandlabels::api::{FileTokenStore, UreqTransport};
use bandlabels::compose::SourceDocument;
use bandlabels::config::{
    colocated, Credentials, CREDENTIALS_FILE, DEFAULT_API_URL, DEFAULT_STRIP, OUTPUT_FILE,
    SHEET_MARGIN, SHEET_MARGIN_NARROW, TOKEN_FILE,
};
use bandlabels::domain::group_by_payment_id;
use bandlabels::{
    BandcampApi, ComposeResult, ComposeService, LabelComposer, OrderLineFormatter, OrderQuery,
    SheetComposer,
};

/// Bandcamp label layout tool
///
/// Lays out exported shipping labels for printing. Without a subcommand the
/// input is laid out on 102x162 mm labels annotated with order lines.
#[derive(Parser)]
#[command(name = "bandlabels")]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input PDF file path
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(flatten)]
    label: LabelArgs,

    /// Increase log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out labels on 102x162 mm stock, annotated with order lines
    #[command(name = "to-102x162")]
    ToLabels {
        /// Input PDF file path
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[command(flatten)]
        label: LabelArgs,
    },

    /// Tile labels two per A4 sheet
    #[command(name = "to-A4")]
    ToSheets {
        /// Input PDF file path
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Leave the first slot of the first sheet empty
        #[arg(long)]
        skip_first: bool,

        /// Inward offset of each label in points
        #[arg(long, default_value_t = SHEET_MARGIN)]
        margin: f32,

        /// Use the narrow 1/4 in margin
        #[arg(long, conflicts_with = "margin")]
        narrow: bool,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE", default_value = OUTPUT_FILE)]
        output: PathBuf,
    },

    /// List the bands of the configured account
    Bands {
        #[command(flatten)]
        api: ApiArgs,
    },

    /// List the text fragments of each page (for checking reference matching)
    Extract {
        /// Input PDF file path
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ApiArgs {
    /// Credentials file with id, secret and band_id [default: next to the executable]
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// Cached OAuth token file [default: next to the executable]
    #[arg(long, value_name = "FILE")]
    token_file: Option<PathBuf>,

    /// Base URL of the merch API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL)]
    base_url: String,
}

#[derive(Args, Clone)]
struct LabelArgs {
    #[command(flatten)]
    api: ApiArgs,

    /// Only fetch orders that have not been shipped yet
    #[arg(long)]
    unshipped_only: bool,

    /// Only fetch orders placed after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start_time: Option<String>,

    /// Text removed from item names
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_STRIP)]
    strip: String,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE", default_value = OUTPUT_FILE)]
    output: PathBuf,
}

/// Command handler shared by all subcommands.
struct LabelHandler;

impl LabelHandler {
    fn connect(api: &ApiArgs) -> Result<(Credentials, BandcampApi<UreqTransport, FileTokenStore>)> {
        let credentials_path = colocated(api.credentials.as_deref(), CREDENTIALS_FILE);
        let credentials = Credentials::load(&credentials_path)
            .with_context(|| "Failed to load Bandcamp credentials")?;
        let tokens = FileTokenStore::new(colocated(api.token_file.as_deref(), TOKEN_FILE));
        log::debug!("token cache: {}", tokens.path().display());
        let client = BandcampApi::connect(&api.base_url, &credentials, tokens);
        Ok((credentials, client))
    }

    /// Fetches orders and lays out annotated labels.
    fn to_labels(&self, input: &Path, args: &LabelArgs) -> Result<()> {
        ensure_exists(input)?;
        let (credentials, api) = Self::connect(&args.api)?;

        let mut query = OrderQuery::new(credentials.band_id).unshipped_only(args.unshipped_only);
        if let Some(start_time) = &args.start_time {
            query = query.start_time(start_time);
        }
        let items = api.orders(&query).with_context(|| "Failed to fetch orders")?;
        let orders = group_by_payment_id(items);
        log::info!("{} order(s) by payment id", orders.len());

        let composer = LabelComposer::new(orders)
            .with_formatter(OrderLineFormatter::with_strip(args.strip.clone()));
        let service = ComposeService::new(Box::new(composer));
        let result = service
            .compose(input, &args.output)
            .with_context(|| "Label layout failed")?;

        report(&result, &args.output);
        if result.has_unmatched() {
            println!(
                "⚠ No orders found for page(s) {:?}",
                result.unmatched_pages
            );
        }
        Ok(())
    }

    /// Tiles labels onto A4 sheets.
    fn to_sheets(&self, input: &Path, skip_first: bool, margin: f32, output: &Path) -> Result<()> {
        ensure_exists(input)?;
        let composer = SheetComposer::new()
            .with_skip_first(skip_first)
            .with_margin(margin);
        let service = ComposeService::new(Box::new(composer));
        let result = service
            .compose(input, output)
            .with_context(|| "Sheet layout failed")?;
        report(&result, output);
        Ok(())
    }

    /// Prints the bands the credentials give access to.
    fn bands(&self, api: &ApiArgs) -> Result<()> {
        let (_, api) = Self::connect(api)?;
        let bands = api.my_bands().with_context(|| "Failed to list bands")?;
        for band in bands {
            println!("{}\t{}\t{}", band.band_id, band.subdomain, band.name);
        }
        Ok(())
    }

    /// Lists the text fragments the reference matcher sees on each page.
    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        ensure_exists(input)?;
        let source = SourceDocument::load(input).with_context(|| "Failed to load PDF")?;

        let mut text = String::new();
        for page in 1..=source.page_count() {
            let fragments = source
                .page_fragments(page)
                .with_context(|| format!("Text extraction failed on page {}", page))?;
            writeln!(text, "Page {}:", page)?;
            for (n, fragment) in fragments.iter().enumerate() {
                writeln!(text, "  {}. {}", n + 1, fragment)?;
            }
        }

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} page(s) → {}",
                source.page_count(),
                output_path.display()
            );
        } else {
            print!("{}", text);
        }
        Ok(())
    }
}

fn ensure_exists(input: &Path) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    Ok(())
}

fn report(result: &ComposeResult, output: &Path) {
    println!(
        "✓ Laid out {} page(s) onto {} page(s) → {}",
        result.pages_processed,
        result.pages_written,
        output.display()
    );
}

/// Exits with -1 when no input filename was given.
fn require_input(input: Option<&PathBuf>) -> &Path {
    match input {
        Some(path) => path.as_path(),
        None => {
            eprintln!("A filename must be given");
            std::process::exit(-1);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let handler = LabelHandler;
    match &cli.command {
        Some(Commands::ToLabels { input, label }) => {
            handler.to_labels(require_input(input.as_ref()), label)?;
        }
        Some(Commands::ToSheets {
            input,
            skip_first,
            margin,
            narrow,
            output,
        }) => {
            let margin = if *narrow { SHEET_MARGIN_NARROW } else { *margin };
            handler.to_sheets(require_input(input.as_ref()), *skip_first, margin, output)?;
        }
        Some(Commands::Bands { api }) => {
            handler.bands(api)?;
        }
        Some(Commands::Extract { input, output }) => {
            handler.extract(require_input(input.as_ref()), output.as_deref())?;
        }
        None => {
            // Default: label mode
            handler.to_labels(require_input(cli.input.as_ref()), &cli.label)?;
        }
    }

    Ok(())
}
