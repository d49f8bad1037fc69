//! geoipdb-gen: CLI tool for building GeoIP databases from delegation reports.

use clap::{Parser, Subcommand};
use geoipdb::{
    build_and_write, read_report_file, BuildOptions, CountryCode, CountryFilter, DatabaseReader,
    ReportFetcher, DEFAULT_REPORT_URL,
};
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geoipdb-gen")]
#[command(version = "0.1.0")]
#[command(about = "Build a per-country IPv4 range database from a registry delegation report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a delegation report and build the database files
    Build {
        /// Delegation report URL
        #[arg(short, long, default_value = DEFAULT_REPORT_URL)]
        url: String,

        /// Read the report from a local file instead of fetching it
        #[arg(long)]
        input: Option<PathBuf>,

        /// Database file path
        #[arg(short, long, default_value = "geoipdb.bin")]
        bin: PathBuf,

        /// Index file path
        #[arg(short = 'x', long, default_value = "geoipdb.idx")]
        idx: PathBuf,

        /// Country codes, e.g. "CN", "CN, US" or "All"
        #[arg(short, long, default_value = "CN")]
        cc: String,

        /// Truncate and write the output files in place
        #[arg(long)]
        no_atomic: bool,

        /// Keep the last report here and revalidate it with its ETag
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Query an existing database
    Lookup {
        /// Database file path
        #[arg(short, long, default_value = "geoipdb.bin")]
        bin: PathBuf,

        /// Index file path
        #[arg(short = 'x', long, default_value = "geoipdb.idx")]
        idx: PathBuf,

        /// Country to inspect
        #[arg(short, long)]
        cc: Option<String>,

        /// Address to locate
        #[arg(short, long)]
        ip: Option<Ipv4Addr>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            url,
            input,
            bin,
            idx,
            cc,
            no_atomic,
            cache_dir,
            verbose,
        } => build(
            &url,
            input.as_ref(),
            &bin,
            &idx,
            &cc,
            !no_atomic,
            cache_dir.as_ref(),
            verbose,
        ),
        Commands::Lookup { bin, idx, cc, ip } => lookup(&bin, &idx, cc.as_deref(), ip),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    url: &str,
    input: Option<&PathBuf>,
    bin: &PathBuf,
    idx: &PathBuf,
    cc: &str,
    atomic: bool,
    cache_dir: Option<&PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let countries: CountryFilter = cc.parse()?;

    let text = match input {
        Some(path) => {
            if verbose {
                println!("Reading report: {:?}", path);
            }
            read_report_file(path)?
        }
        None => {
            if verbose {
                println!("Downloading report: {}", url);
            }
            let mut fetcher = ReportFetcher::new();
            if let Some(dir) = cache_dir {
                fetcher = fetcher.with_cache_dir(dir);
            }
            fetcher.fetch(url)?
        }
    };

    let options = BuildOptions {
        countries,
        atomic,
        ..BuildOptions::default()
    };
    let encoded = build_and_write(&text, &options, bin, idx)?;

    if verbose {
        println!(
            "Countries: {}, database: {} bytes, index: {} bytes",
            encoded.idx.len() / geoipdb::database::INDEX_ENTRY_SIZE,
            encoded.bin.len(),
            encoded.idx.len()
        );
    }

    println!("Successfully built {:?} and {:?}", bin, idx);
    Ok(())
}

fn lookup(
    bin: &PathBuf,
    idx: &PathBuf,
    cc: Option<&str>,
    ip: Option<Ipv4Addr>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = DatabaseReader::open(bin, idx)?;

    match (cc, ip) {
        (Some(cc), Some(ip)) => {
            let country: CountryCode = cc.parse()?;
            println!("{} in {}: {}", ip, country, reader.contains(country, ip));
        }
        (None, Some(ip)) => match reader.lookup(ip) {
            Some(country) => println!("{} -> {}", ip, country),
            None => println!("{} -> not found", ip),
        },
        (Some(cc), None) => {
            let country: CountryCode = cc.parse()?;
            match reader.ranges(country) {
                Some(ranges) => {
                    for (begin, end) in ranges {
                        println!("{} - {}", Ipv4Addr::from(begin), Ipv4Addr::from(end));
                    }
                }
                None => println!("{} not in database", country),
            }
        }
        (None, None) => {
            for country in reader.countries() {
                let count = reader.ranges(country).map_or(0, |ranges| ranges.len());
                println!("{} {}", country, count);
            }
        }
    }
    Ok(())
}
