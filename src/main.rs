use clap::{Parser, Subcommand};
use cloud_gal::config::{self, SiteConfig};
use cloud_gal::gallery::{self, BuildEvent, BuildResult};
use cloud_gal::media::{self, CloudinaryBackend, Credentials};
use cloud_gal::{generate, output};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that build placeholders.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the placeholder cache and fetch every placeholder again
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "cloud-gal")]
#[command(about = "Static photo gallery generator for media-CDN folders")]
#[command(long_about = "\
Static photo gallery generator for media-CDN folders

The photos live on the media service. Every asset under the configured folder
becomes a grid tile; its category is read from the public id:

  <folder>/<group>-<category>/<name>
  12/villains-joker/img1     → category \"joker\"

Site structure:

  site/
  ├── config.toml        # Site config (optional)
  └── assets/            # Logo, favicon → copied to <output>/assets

Environment:

  CLOUDINARY_CLOUD_NAME  Media account (overrides [media] cloud_name)
  CLOUDINARY_FOLDER      Folder to index (overrides [media] folder)
  CLOUDINARY_API_KEY     Search API key (fetch only)
  CLOUDINARY_API_SECRET  Search API secret (fetch only)
  RUST_LOG               Diagnostic log filter (default: warn)

Run 'cloud-gal gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory (config.toml, assets/)
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (asset index, gallery data, cache)
    #[arg(long, default_value = ".cloud-gal-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query the media index into assets.json
    Fetch,
    /// Build categories, photo records and blur placeholders
    Prepare(CacheArgs),
    /// Produce the final HTML site from gallery.json
    Generate,
    /// Run the full pipeline: fetch → prepare → generate
    Build(CacheArgs),
    /// Validate config and environment without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

const ASSETS_FILE: &str = "assets.json";
const GALLERY_FILE: &str = "gallery.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch => {
            let config = load_media_config(&cli.source)?;
            run_fetch(&config, &cli.temp_dir)?;
        }
        Command::Prepare(cache_args) => {
            let config = load_media_config(&cli.source)?;
            init_thread_pool(&config.processing);
            run_prepare(&config, &cli.temp_dir, !cache_args.no_cache)?;
        }
        Command::Generate => {
            run_generate(&cli.temp_dir, &cli.source, &cli.output)?;
        }
        Command::Build(cache_args) => {
            let config = load_media_config(&cli.source)?;
            init_thread_pool(&config.processing);

            println!(
                "==> Stage 1: Fetching {}/{}",
                config.media.cloud_name, config.media.folder
            );
            run_fetch(&config, &cli.temp_dir)?;

            println!("==> Stage 2: Preparing gallery data");
            run_prepare(&config, &cli.temp_dir, !cache_args.no_cache)?;

            println!("==> Stage 3: Generating HTML → {}", cli.output.display());
            run_generate(&cli.temp_dir, &cli.source, &cli.output)?;

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = load_media_config(&cli.source)?;
            let has_credentials = Credentials::from_env().is_ok();
            output::print_check_output(&config, has_credentials);
            if !has_credentials {
                println!(
                    "==> Warning: set {} and {} before running fetch",
                    media::ENV_API_KEY,
                    media::ENV_API_SECRET
                );
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays the build inventory.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load config with env overrides and require a media account.
fn load_media_config(source: &Path) -> Result<SiteConfig, Box<dyn std::error::Error>> {
    let config = config::load_config_with_env(source)?;
    config.media.require_account()?;
    Ok(config)
}

fn run_fetch(config: &SiteConfig, temp_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = Credentials::from_env()?;
    let backend = CloudinaryBackend::new(&config.media, Some(credentials))?;
    let manifest = media::fetch_index(&backend, &config.media)?;

    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(temp_dir.join(ASSETS_FILE), json)?;
    output::print_fetch_output(&manifest);
    Ok(())
}

fn run_prepare(
    config: &SiteConfig,
    temp_dir: &Path,
    use_cache: bool,
) -> Result<BuildResult, Box<dyn std::error::Error>> {
    // Rendition fetches are public; no credentials needed.
    let backend = CloudinaryBackend::new(&config.media, None)?;
    let (tx, printer) = spawn_printer();
    let result = gallery::prepare(
        &backend,
        &temp_dir.join(ASSETS_FILE),
        temp_dir,
        config,
        use_cache,
        Some(tx),
    );
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let result = result?;

    let json = serde_json::to_string_pretty(&result.gallery)?;
    std::fs::write(temp_dir.join(GALLERY_FILE), json)?;
    output::print_prepare_summary(&result);
    Ok(result)
}

fn run_generate(
    temp_dir: &Path,
    source: &Path,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let gallery = generate::generate(&temp_dir.join(GALLERY_FILE), source, output_dir)?;
    output::print_generate_output(&gallery);
    Ok(())
}

/// Print build events as they arrive. The thread ends when the sender drops.
fn spawn_printer() -> (Sender<BuildEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
