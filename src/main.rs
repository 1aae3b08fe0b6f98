use clap::{Parser, Subcommand};
use realty_desk::config::{self, DeskConfig};
use realty_desk::imaging::{CompressionConfig, RustBackend, compress_batch};
use realty_desk::output::{self, CheckReport};
use realty_desk::records::{
    BlogPost, ChatConversation, Collection, HomepageSettings, Lead, PortfolioItem, Property,
};
use realty_desk::store::FileStore;
use realty_desk::types::{UploadFile, mime_for_name};
use realty_desk::{api, media};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "realty-desk")]
#[command(about = "Back-office and media service for a real-estate website")]
#[command(long_about = "\
Back-office and media service for a real-estate website

Serves a JSON API for listings, portfolio, blog, homepage settings, leads
and chat, stores documents as one JSON file per collection, and compresses
uploaded images before saving them.

Layout of the config directory:

  ./
  ├── config.toml        # Optional overrides (see 'realty-desk gen-config')
  ├── data/              # properties.json, portfolio.json, blog.json, ...
  └── media/             # Compressed uploads, served at /media

The admin API is enabled by setting REALTY_DESK_ADMIN_TOKEN.
Log verbosity follows RUST_LOG (default: info).")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml; relative storage paths resolve here
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Compress image files the way uploads are compressed
    Compress {
        /// Image files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Where compressed files are written
        #[arg(long, default_value = "compressed")]
        out_dir: PathBuf,
    },
    /// Validate config and report on stored collections and media
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve => {
            let config = config::load_config(&cli.config_dir)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(api::serve(config, config::admin_token_from_env()))?;
        }
        Command::Compress { files, out_dir } => {
            let config = config::load_config(&cli.config_dir)?;
            run_compress(&config, files, &out_dir)?;
        }
        Command::Check => {
            println!("==> Checking {}", cli.config_dir.display());
            let config = config::load_config(&cli.config_dir)?;
            let report = check(&config)?;
            output::print_check_report(&report);
            if !report.is_healthy() {
                return Err("one or more collections could not be loaded".into());
            }
            println!("==> All good");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_compress(
    config: &DeskConfig,
    paths: Vec<PathBuf>,
    out_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("not a file: {}", path.display()))?;
        let data = std::fs::read(path)?;
        let mime = mime_for_name(&name);
        files.push(UploadFile::new(name, mime, data));
    }

    std::fs::create_dir_all(out_dir)?;
    let cfg = CompressionConfig::from_images_config(&config.images);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let outcomes = compress_batch(&RustBackend::new(), files, &cfg, Some(tx));
    printer.join().ok();

    let mut failed = 0;
    for outcome in &outcomes {
        let saved = match &outcome.result {
            Ok(compressed) => {
                let path = out_dir.join(&compressed.file.name);
                std::fs::write(&path, &compressed.file.data)?;
                Some(path)
            }
            Err(_) => {
                failed += 1;
                None
            }
        };
        output::print_file_outcome(outcome, saved.as_deref());
    }

    if failed > 0 {
        return Err(format!("{failed} of {} files failed to compress", outcomes.len()).into());
    }
    Ok(())
}

fn count<T: Collection>(store: &FileStore) -> (&'static str, Result<usize, String>) {
    (T::NAME, store.list::<T>().map(|docs| docs.len()).map_err(|e| e.to_string()))
}

fn check(config: &DeskConfig) -> Result<CheckReport, Box<dyn std::error::Error>> {
    let store = FileStore::open(&config.storage.data_dir)?;
    let collections = vec![
        count::<Property>(&store),
        count::<PortfolioItem>(&store),
        count::<BlogPost>(&store),
        count::<HomepageSettings>(&store),
        count::<Lead>(&store),
        count::<ChatConversation>(&store),
    ];
    let media = media::list_media(&config.storage.media_dir)?;

    Ok(CheckReport {
        bind_address: config.bind_address(),
        data_dir: config.storage.data_dir.clone(),
        media_dir: config.storage.media_dir.clone(),
        admin_enabled: config::admin_token_from_env().is_some(),
        collections,
        media_files: media.len(),
        media_bytes: media.iter().map(|m| m.size).sum(),
    })
}
