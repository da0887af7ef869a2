//! CLI binary for zahlungsplan.
//!
//! A thin shim over the library crate: flags map onto `PlanInput` and
//! `PlanConfig`, invoices are read when given, and the result is written
//! as `Zahlungsplan.pdf` (or previewed on stdout).

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zahlungsplan::pipeline::layout::Table;
use zahlungsplan::{
    engine, extract_invoices, generate_to_file, preview, AssignmentStrategy, InvoiceReport,
    MonetaryAmount, PlanConfig, PlanInput, PlanRequest, TableLayout, TenantIdentity,
    ZeroFeePolicy,
};

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Typed amounts
  zahlungsplan --name "Café Sonnenschein UG" --address "Hauptstraße 12, 20095 Hamburg" \
      --contract MV-2023-118 --rent 1.234,50 --advertising 600 --food-fee 45

  # Amounts from two or three invoices (largest = rent, next = advertising, rest = food fee)
  zahlungsplan miete.pdf werbung.pdf gastro.pdf --contract MV-2023-118 -o plan.pdf

  # Check what the invoices yield without rendering
  zahlungsplan --extract-only miete.pdf werbung.pdf

  # Print the table instead of a PDF
  zahlungsplan --rent 1000 --advertising 300 --preview

AMOUNTS:
  German (1.234,56) and plain (1234.56) notation are accepted, with or
  without a trailing EUR / €. Typed amounts override invoice amounts.

ENVIRONMENT VARIABLES:
  ZAHLUNGSPLAN_*          Every flag, e.g. ZAHLUNGSPLAN_CONTRACT, ZAHLUNGSPLAN_LAYOUT
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips the download
  PDFIUM_AUTO_CACHE_DIR   Override the pdfium cache directory

  PDFium (~30 MB) is downloaded on first use and cached in
  ~/.cache/zahlungsplan/pdfium-7690/. --preview and --json never need it.
"#;

/// Generate a twelve-month payment schedule (Zahlungsplan) as PDF.
#[derive(Parser, Debug)]
#[command(
    name = "zahlungsplan",
    version,
    about = "Generate a twelve-month tenant payment schedule (Zahlungsplan) as PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Two or three invoice PDFs (paths or HTTP/HTTPS URLs).
    invoices: Vec<String>,

    /// Tenant name (Mieter).
    #[arg(long, env = "ZAHLUNGSPLAN_NAME", default_value = "")]
    name: String,

    /// Tenant address.
    #[arg(long, env = "ZAHLUNGSPLAN_ADDRESS", default_value = "")]
    address: String,

    /// Contract number, printed as Verwendungszweck.
    #[arg(long, env = "ZAHLUNGSPLAN_CONTRACT", default_value = "")]
    contract: String,

    /// Monthly rent incl. service charges.
    #[arg(long, env = "ZAHLUNGSPLAN_RENT")]
    rent: Option<MonetaryAmount>,

    /// Half-yearly advertising contribution (due Januar and Juli).
    #[arg(long, env = "ZAHLUNGSPLAN_ADVERTISING")]
    advertising: Option<MonetaryAmount>,

    /// Monthly food-service (Gastro / Fettabluft) fee.
    #[arg(long, env = "ZAHLUNGSPLAN_FOOD_FEE")]
    food_fee: Option<MonetaryAmount>,

    /// Output PDF path.
    #[arg(short, long, env = "ZAHLUNGSPLAN_OUTPUT", default_value = "Zahlungsplan.pdf")]
    output: PathBuf,

    /// Table columns.
    #[arg(long, env = "ZAHLUNGSPLAN_LAYOUT", value_enum, default_value = "transfer")]
    layout: LayoutArg,

    /// What a food fee of 0,00 means.
    #[arg(long, env = "ZAHLUNGSPLAN_ZERO_FOOD_FEE", value_enum, default_value = "omit")]
    zero_food_fee: ZeroFeeArg,

    /// How invoice amounts are assigned.
    #[arg(long, env = "ZAHLUNGSPLAN_ASSIGN", value_enum, default_value = "magnitude")]
    assign: AssignArg,

    /// JSON file replacing the default payees.
    #[arg(long, env = "ZAHLUNGSPLAN_PAYEES")]
    payees: Option<PathBuf>,

    /// Sentence printed under the address.
    #[arg(long, env = "ZAHLUNGSPLAN_DISCLAIMER")]
    disclaimer: Option<String>,

    /// Print the table to stdout instead of writing a PDF.
    #[arg(long, env = "ZAHLUNGSPLAN_PREVIEW")]
    preview: bool,

    /// Print the request and schedule as JSON instead of writing a PDF.
    #[arg(long, env = "ZAHLUNGSPLAN_JSON")]
    json: bool,

    /// Only report what the invoices yield.
    #[arg(long)]
    extract_only: bool,

    /// Never download pdfium.
    #[arg(long, env = "ZAHLUNGSPLAN_NO_DOWNLOAD")]
    no_download: bool,

    /// Disable the download progress bar.
    #[arg(long, env = "ZAHLUNGSPLAN_NO_PROGRESS")]
    no_progress: bool,

    /// Invoice URL download timeout in seconds.
    #[arg(long, env = "ZAHLUNGSPLAN_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ZAHLUNGSPLAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ZAHLUNGSPLAN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    /// Amount columns each followed by an empty "Überwiesen" column.
    Transfer,
    /// Amount columns only.
    Compact,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ZeroFeeArg {
    Omit,
    Show,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AssignArg {
    /// Largest amount is the rent, then advertising, then food fee.
    Magnitude,
    /// Classify each invoice by its keywords.
    Kind,
}

impl From<LayoutArg> for TableLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Transfer => TableLayout::TransferColumns,
            LayoutArg::Compact => TableLayout::Compact,
        }
    }
}

impl From<ZeroFeeArg> for ZeroFeePolicy {
    fn from(v: ZeroFeeArg) -> Self {
        match v {
            ZeroFeeArg::Omit => ZeroFeePolicy::Omit,
            ZeroFeeArg::Show => ZeroFeePolicy::Show,
        }
    }
}

impl From<AssignArg> for AssignmentStrategy {
    fn from(v: AssignArg) -> Self {
        match v {
            AssignArg::Magnitude => AssignmentStrategy::ByMagnitude,
            AssignArg::Kind => AssignmentStrategy::ByKind,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Library INFO logs stay quiet while the terminal shows bars and ticks.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.preview;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let needs_engine = !cli.invoices.is_empty() || !(cli.preview || cli.json);

    if cli.extract_only && cli.invoices.is_empty() {
        bail!("--extract-only needs two or three invoice PDFs");
    }
    if needs_engine && config.allow_engine_download && engine::needs_download() {
        ensure_engine(&cli)?;
    }

    // ── Invoices ─────────────────────────────────────────────────────────
    let reports = if cli.invoices.is_empty() {
        Vec::new()
    } else {
        extract_invoices(cli.invoices.as_slice(), &config).context("Failed to read invoices")?
    };

    if cli.extract_only {
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?
            );
        } else {
            print_reports(&reports);
        }
        return Ok(());
    }

    let input = PlanInput {
        identity: TenantIdentity {
            tenant_name: cli.name.clone(),
            address: cli.address.clone(),
            contract_reference: cli.contract.clone(),
        },
        rent: cli.rent,
        advertising: cli.advertising,
        food_fee: cli.food_fee,
    };
    let request = PlanRequest::assemble(input, &reports, config.assignment)
        .context("Cannot build the payment schedule")?;

    // ── Preview modes ────────────────────────────────────────────────────
    if cli.json {
        let doc = serde_json::json!({
            "request": &request,
            "schedule": preview(&request, &config),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("Failed to serialise schedule")?
        );
        return Ok(());
    }
    if cli.preview {
        let schedule = preview(&request, &config);
        print!("{}", Table::new(&schedule, config.table_layout).to_text());
        println!("Jahressumme: {}", schedule.annual_total());
        return Ok(());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let schedule = generate_to_file(&request, &cli.output, &config)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&cli.output.display().to_string()),
            dim(&format!("Jahressumme {}", schedule.annual_total())),
        );
    }
    Ok(())
}

/// Map CLI args to `PlanConfig`.
fn build_config(cli: &Cli) -> Result<PlanConfig> {
    let mut builder = PlanConfig::builder()
        .table_layout(cli.layout.into())
        .zero_food_fee(cli.zero_food_fee.into())
        .assignment(cli.assign.into())
        .allow_engine_download(!cli.no_download)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.payees {
        builder = builder
            .payees_from_file(path)
            .with_context(|| format!("Failed to load payees from {}", path.display()))?;
    }
    if let Some(ref text) = cli.disclaimer {
        builder = builder.disclaimer(text.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Download pdfium once, with a progress bar unless asked to be quiet.
fn ensure_engine(cli: &Cli) -> Result<()> {
    if cli.quiet || cli.no_progress {
        engine::ensure_engine_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix("PDF engine");
    bar.enable_steady_tick(Duration::from_millis(80));

    let on_progress = |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            if bar.length() != Some(t) {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    };
    let result = engine::ensure_engine_library(Some(&on_progress));
    match result {
        Ok(_) => {
            bar.finish_with_message("ready");
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e).context("Failed to download PDFium engine")
        }
    }
}

fn print_reports(reports: &[InvoiceReport]) {
    for report in reports {
        match (&report.error, report.amount()) {
            (None, Some(amount)) => println!(
                "{} {:<28} {:<12} {}",
                green("✓"),
                report.source,
                report
                    .kind
                    .map(|k| format!("{k:?}"))
                    .unwrap_or_default(),
                bold(&zahlungsplan::format_eur(amount)),
            ),
            (Some(err), _) => println!("{} {}", red("✗"), red(&err.to_string())),
            (None, None) => println!("{} {}: no amount", red("✗"), report.source),
        }
        let id = &report.identity;
        for (label, value) in [
            ("Mieter", &id.tenant_name),
            ("Adresse", &id.address),
            ("Vertrag", &id.contract_reference),
        ] {
            if !value.is_empty() {
                println!("    {} {}", dim(&format!("{label}:")), value);
            }
        }
    }
}
