//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
#[cfg(feature = "http")]
use crate::adapters::http_adapter::HttpAdapter;
use crate::adapters::sheet_csv_adapter;
#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::config_validation::validate_sheet_config;
use crate::domain::dispatcher::{PriceSheet, Resolution, SheetConfig};
use crate::domain::error::{ProviderError, SheetError};
use crate::domain::formula;
use crate::domain::grid::GridDimensions;
use crate::domain::price::PriceRow;
use crate::domain::scan::ScanWindow;
use crate::domain::tenor::Tenor;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceProvider;

#[derive(Parser, Debug)]
#[command(name = "pricesheet", about = "Resolve =PRICES(...) formulas in a price sheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the formulas in a sheet and print the result as CSV
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        /// Initial sheet contents, headerless CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the resolved sheet here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Resolve only the first formula
        #[arg(long)]
        once: bool,
    },
    /// Check whether cell text is a price formula
    Parse { text: String },
    /// Show the date range a tenor selects
    Tenor {
        text: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        anchor: Option<String>,
        /// Count forward from the anchor instead of back
        #[arg(long)]
        forward: bool,
    },
    /// Copy one instrument's CSV history into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        market: String,
        #[arg(long)]
        code: String,
        /// Directory holding {CODE}_{MARKET}.csv
        #[arg(long)]
        from: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Resolve {
            config,
            input,
            output,
            once,
        } => run_resolve(&config, input.as_deref(), output.as_deref(), once),
        Command::Parse { text } => run_parse(&text),
        Command::Tenor {
            text,
            anchor,
            forward,
        } => run_tenor(&text, anchor.as_deref(), forward),
        Command::Import {
            config,
            market,
            code,
            from,
        } => run_import(&config, &market, &code, &from),
    }
}

fn report(err: SheetError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SheetError> {
    FileConfigAdapter::from_file(path).map_err(|e| SheetError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Grid and scan window sizes from `[sheet]`, defaulting missing keys.
pub fn build_sheet_config(config: &dyn ConfigPort) -> SheetConfig {
    let defaults = SheetConfig::default();
    SheetConfig {
        grid: GridDimensions {
            rows: config.get_usize("sheet", "rows", defaults.grid.rows),
            cols: config.get_usize("sheet", "cols", defaults.grid.cols),
        },
        window: ScanWindow {
            rows: config.get_usize("sheet", "scan_rows", defaults.window.rows),
            cols: config.get_usize("sheet", "scan_cols", defaults.window.cols),
        },
    }
}

/// Whichever provider `[provider] kind` selects.
pub enum AnyProvider {
    Csv(CsvAdapter),
    #[cfg(feature = "http")]
    Http(HttpAdapter),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteAdapter),
}

impl PriceProvider for AnyProvider {
    async fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        match self {
            Self::Csv(p) => p.fetch_prices(market, code, tenor).await,
            #[cfg(feature = "http")]
            Self::Http(p) => p.fetch_prices(market, code, tenor).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(p) => p.fetch_prices(market, code, tenor).await,
        }
    }
}

pub fn build_provider(config: &dyn ConfigPort) -> Result<AnyProvider, SheetError> {
    let kind = config
        .get_string("provider", "kind")
        .ok_or_else(|| SheetError::ConfigMissing {
            section: "provider".into(),
            key: "kind".into(),
        })?
        .trim()
        .to_lowercase();

    match kind.as_str() {
        "csv" => Ok(AnyProvider::Csv(CsvAdapter::from_config(config)?)),
        #[cfg(feature = "http")]
        "http" => Ok(AnyProvider::Http(HttpAdapter::from_config(config)?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(AnyProvider::Sqlite(SqliteAdapter::from_config(config)?)),
        other => Err(SheetError::ConfigInvalid {
            section: "provider".into(),
            key: "kind".into(),
            reason: format!("provider '{}' is not available in this build", other),
        }),
    }
}

/// Run resolutions until the sheet is done, or just one with `once`.
pub async fn resolve_sheet<P: PriceProvider>(
    sheet: &PriceSheet<P>,
    once: bool,
) -> Result<usize, SheetError> {
    if !once {
        return sheet.resolve_all().await;
    }
    match sheet.resolve().await? {
        Resolution::Resolved { .. } => Ok(1),
        Resolution::NoFormula => Ok(0),
    }
}

fn run_resolve(
    config_path: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    once: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    if let Err(e) = validate_sheet_config(&config) {
        return report(e);
    }

    let provider = match build_provider(&config) {
        Ok(p) => p,
        Err(e) => return report(e),
    };
    let sheet = PriceSheet::new(provider, build_sheet_config(&config));

    if let Some(input) = input {
        eprintln!("Loading sheet from {}", input.display());
        let entries = match sheet_csv_adapter::load_cells(input) {
            Ok(e) => e,
            Err(e) => return report(e),
        };
        for entry in entries {
            if let Err(e) = sheet.set_cell(entry.row, entry.col, entry.value) {
                return report(e);
            }
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return report(e.into()),
    };
    let outcome = runtime.block_on(resolve_sheet(&sheet, once));

    match &outcome {
        Ok(count) => eprintln!("Resolved {} formula(s)", count),
        Err(e) => eprintln!("error: {e}"),
    }

    let grid = sheet.snapshot();
    let written = match output {
        Some(path) => sheet_csv_adapter::save_grid(&grid, path),
        None => sheet_csv_adapter::write_grid(&grid, io::stdout().lock()),
    };
    if let Err(e) = written {
        return report(e);
    }
    if let Some(path) = output {
        eprintln!("Sheet written to {}", path.display());
    }

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => (&e).into(),
    }
}

fn run_parse(text: &str) -> ExitCode {
    match formula::parse(text) {
        Some(f) => {
            println!("market: {}", f.market);
            println!("code:   {}", f.code);
            println!("tenor:  {}", f.tenor.as_deref().unwrap_or("(all history)"));
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("not a price formula: {}", text);
            ExitCode::from(1)
        }
    }
}

fn run_tenor(text: &str, anchor: Option<&str>, forward: bool) -> ExitCode {
    let anchor = match anchor {
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                eprintln!("error: invalid anchor date '{}' (expected YYYY-MM-DD)", s);
                return ExitCode::from(2);
            }
        },
        None => Local::now().date_naive(),
    };

    let tenor = match Tenor::parse(text) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let range = if forward {
        tenor.starting_from(anchor)
    } else {
        tenor.ending_at(anchor)
    };
    println!("{} {} to {}", tenor, range.start(), range.end());
    ExitCode::SUCCESS
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _market: &str, _code: &str, _from: &Path) -> ExitCode {
    eprintln!("error: sqlite feature is required for import");
    ExitCode::from(1)
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, market: &str, code: &str, from: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let store = match SqliteAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return report(e.into()),
    };
    let source = CsvAdapter::new(from.to_path_buf());
    let prices = match runtime.block_on(source.fetch_prices(market, code, None)) {
        Ok(p) => p,
        Err(e) => return report(e.into()),
    };

    match store.insert_prices(market, code, &prices) {
        Ok(inserted) => {
            eprintln!(
                "Persisted {} of {} prices ({} duplicates skipped)",
                inserted,
                prices.len(),
                prices.len() - inserted
            );
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}
