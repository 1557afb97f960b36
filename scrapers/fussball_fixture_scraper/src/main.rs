use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ParallelProgressIterator, ProgressStyle};
use rayon::prelude::*;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use fussball_fixture_scraper::{
    club_list::parse_club_list,
    config::ScraperConfig,
    deobfuscator::{DeobfuscationReport, Deobfuscator, FontFetcher},
    export,
    http::{DirFontFetcher, HttpClient, HttpFontFetcher},
    pipeline::{self, ProcessedPage},
    utils::is_valid_postal_code,
};

const OUTPUT_DIR: &str = "parsed_html_output";

type SharedFetcher = Box<dyn FontFetcher + Send + Sync>;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// De-obfuscate and parse a saved fixture page
    ProcessFile {
        /// Path to the HTML file to process
        #[arg(short, long)]
        file: PathBuf,
        /// Read fonts from `{dir}/{id}.woff` instead of downloading them
        #[arg(long)]
        fonts_dir: Option<PathBuf>,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },
    /// Process every `.html` file in a directory in parallel
    ProcessDir {
        #[arg(short, long)]
        dir: PathBuf,
        #[arg(long)]
        fonts_dir: Option<PathBuf>,
        #[arg(short, long, default_value = OUTPUT_DIR)]
        output_dir: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
        /// Number of files to process (for testing)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Download and parse one club's fixtures for a date range
    FetchClub {
        /// External club id as used in fussball.de URLs
        #[arg(short, long)]
        club: String,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: NaiveDate,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },
    /// List clubs from a saved club search page
    ParseClubs {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search clubs by postal code
    FetchClubs {
        #[arg(short, long)]
        postal_code: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn font_fetcher(config: &ScraperConfig, fonts_dir: Option<PathBuf>) -> Result<SharedFetcher> {
    let fetcher: SharedFetcher = match fonts_dir {
        Some(dir) => Box::new(DirFontFetcher::new(dir)),
        None => Box::new(HttpFontFetcher::new(
            HttpClient::new(config).context("Failed to create HTTP client")?,
        )),
    };
    Ok(fetcher)
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(export::create_output_file(path)?),
        None => Box::new(io::stdout().lock()),
    };
    Ok(writer)
}

fn write_page(processed: &ProcessedPage, source: &str, format: Format, writer: impl Write) -> Result<()> {
    let parse = processed.page.clone().into_table_parse();
    match format {
        Format::Csv => export::write_fixtures_csv(writer, &parse.fixtures),
        Format::Json => export::write_parse_json(writer, source, &parse),
    }
}

fn log_report(source: &str, report: &DeobfuscationReport) {
    for group in report.failed_groups() {
        if let Some(failure) = &group.failure {
            warn!("{}: obfuscation group {} left as is: {}", source, group.obfuscation_id, failure);
        }
    }
    if report.has_unresolved_glyphs() {
        warn!("{}: some glyphs could not be mapped to characters", source);
    }
}

fn process_file(
    deobfuscator: &Deobfuscator<SharedFetcher>,
    path: &Path,
    output: Option<&Path>,
    format: Format,
) -> Result<usize> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    info!("Processing fixture page: {:?}", path);

    let source = path.display().to_string();
    let processed = pipeline::process_fixture_page(deobfuscator, &html);
    log_report(&source, &processed.report);

    write_page(&processed, &source, format, open_output(output)?)?;
    Ok(processed.page.fixtures().len())
}

fn html_files(dir: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
        .collect();
    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

fn process_dir(
    deobfuscator: &Deobfuscator<SharedFetcher>,
    dir: &Path,
    output_dir: &Path,
    format: Format,
    limit: Option<usize>,
) -> Result<()> {
    let files = html_files(dir, limit)?;
    info!("Processing {} file(s) from {:?}", files.len(), dir);

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta})")?;

    let fixtures: usize = files
        .par_iter()
        .progress_with_style(style)
        .filter_map(|path| {
            let file_name = path.file_name()?;
            let output = output_dir.join(file_name).with_extension(format.extension());
            match process_file(deobfuscator, path, Some(&output), format) {
                Ok(count) => Some(count),
                Err(e) => {
                    error!("Failed to process {:?}: {:#}", path, e);
                    None
                }
            }
        })
        .sum();

    info!("Wrote {} fixture(s) to {:?}", fixtures, output_dir);
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = ScraperConfig::from_env();
    tracing_subscriber::fmt()
        .with_max_level(config.logging.level())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ProcessFile {
            file,
            fonts_dir,
            output,
            format,
        } => {
            let deobfuscator = Deobfuscator::new(font_fetcher(&config, fonts_dir)?);
            let count = process_file(&deobfuscator, &file, output.as_deref(), format)?;
            info!("Extracted {} fixture(s)", count);
        }
        Commands::ProcessDir {
            dir,
            fonts_dir,
            output_dir,
            format,
            limit,
        } => {
            let deobfuscator = Deobfuscator::new(font_fetcher(&config, fonts_dir)?);
            process_dir(&deobfuscator, &dir, &output_dir, format, limit)?;
        }
        Commands::FetchClub {
            club,
            from,
            to,
            output,
            format,
        } => {
            if from > to {
                bail!("--from {} is after --to {}", from, to);
            }
            let client = HttpClient::new(&config).context("Failed to create HTTP client")?;
            let deobfuscator = Deobfuscator::new(HttpFontFetcher::new(client.clone()));

            let processed = pipeline::fetch_club_fixtures(&client, &deobfuscator, &club, from, to)
                .with_context(|| format!("Failed to fetch fixtures for club {}", club))?;
            log_report(&club, &processed.report);
            write_page(&processed, &club, format, open_output(output.as_deref())?)?;
        }
        Commands::ParseClubs { file, output } => {
            let html =
                fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let clubs = parse_club_list(&html);
            info!("Found {} club(s)", clubs.len());
            export::write_clubs_csv(open_output(output.as_deref())?, &clubs)?;
        }
        Commands::FetchClubs {
            postal_code,
            output,
        } => {
            if !is_valid_postal_code(&postal_code) {
                bail!("Invalid postal code {:?}, expected five digits", postal_code);
            }
            let client = HttpClient::new(&config).context("Failed to create HTTP client")?;
            let clubs = pipeline::fetch_clubs_for_postal_code(&client, &postal_code)
                .with_context(|| format!("Failed to search clubs for {}", postal_code))?;
            info!("Found {} club(s) for {}", clubs.len(), postal_code);
            export::write_clubs_csv(open_output(output.as_deref())?, &clubs)?;
        }
    }

    Ok(())
}
