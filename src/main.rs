use anyhow::{Result, bail};
use clap::Parser;
use kaytu_install::commands::{self, CatalogSource, InstallRequest, host_platform};
use kaytu_install::error::{EXIT_FAILURE, exit_code};
use kaytu_install::runtime::{RealRuntime, Runtime};
use std::path::PathBuf;
use std::time::Duration;

/// kaytu-install - installer for the kaytu CLI
///
/// Picks the release artifact built for this machine, verifies its SHA-256
/// checksum and places it in the bin directory.
///
/// If the GITHUB_TOKEN environment variable is set, it is sent with every download.
///
/// Examples:
///   kaytu-install install --version 0.9.0 --sha256 linux-amd64=<hex> ...
///   kaytu-install install --catalog kaytu.json
///   kaytu-install resolve --catalog kaytu.json --os darwin --arch arm64
#[derive(Parser, Debug)]
#[command(author, version = env!("KAYTU_INSTALL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory the binary is installed into (also via KAYTU_BIN_DIR)
    #[arg(long, env = "KAYTU_BIN_DIR", value_name = "DIR", global = true)]
    pub bin_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify and install kaytu for this machine
    Install(InstallArgs),

    /// Show which artifact would be installed, without downloading it
    Resolve(ResolveArgs),

    /// Print the kaytu release catalog as JSON
    Catalog(CatalogArgs),
}

#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Catalog JSON file describing the release (also via KAYTU_CATALOG unless --version is given)
    #[arg(long, value_name = "FILE", conflicts_with = "version")]
    pub catalog: Option<PathBuf>,

    /// kaytu release version, used with --sha256
    #[arg(long, value_name = "VERSION", requires = "sha256")]
    pub version: Option<String>,

    /// Checksum of one platform's artifact, repeated for every platform
    #[arg(long, value_name = "OS-ARCH=HEX")]
    pub sha256: Vec<String>,

    /// Release download base URL, for mirrors
    #[arg(long, value_name = "URL", requires = "version")]
    pub base_url: Option<String>,
}

impl SourceArgs {
    /// `env_catalog` (KAYTU_CATALOG) is only used when neither flag is given.
    fn into_source(self, env_catalog: Option<PathBuf>) -> Result<CatalogSource> {
        match (self.catalog, self.version) {
            (Some(path), _) => Ok(CatalogSource::File(path)),
            (None, Some(version)) => Ok(CatalogSource::Release {
                version,
                checksums: self.sha256,
                base_url: self.base_url,
            }),
            (None, None) => match env_catalog {
                Some(path) => Ok(CatalogSource::File(path)),
                None => bail!("Pass --catalog FILE (or set KAYTU_CATALOG), or --version with --sha256"),
            },
        }
    }
}

fn env_catalog<R: Runtime>(runtime: &R) -> Option<PathBuf> {
    runtime
        .env_var("KAYTU_CATALOG")
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[derive(clap::Args, Debug)]
pub struct PlatformArgs {
    /// Operating system to install for instead of the detected one
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Architecture to install for instead of the detected one
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Download timeout in seconds (also via KAYTU_TIMEOUT)
    #[arg(long, env = "KAYTU_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not run the installed binary with --version
    #[arg(long)]
    pub skip_self_test: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub platform: PlatformArgs,
}

#[derive(clap::Args, Debug)]
pub struct CatalogArgs {
    /// kaytu release version
    #[arg(long, value_name = "VERSION")]
    pub version: String,

    /// Checksum of one platform's artifact, repeated for every platform
    #[arg(long, value_name = "OS-ARCH=HEX", required = true)]
    pub sha256: Vec<String>,

    /// Release download base URL, for mirrors
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write the catalog to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = RealRuntime;

    match cli.command {
        Commands::Install(args) => {
            let request = InstallRequest {
                platform: host_platform(
                    args.platform.os.as_deref(),
                    args.platform.arch.as_deref(),
                ),
                source: args.source.into_source(env_catalog(&runtime))?,
                bin_dir: cli.bin_dir,
                timeout: args.timeout.map(Duration::from_secs),
                skip_self_test: args.skip_self_test,
            };
            commands::install(runtime, request).await?;
        }
        Commands::Resolve(args) => {
            let platform =
                host_platform(args.platform.os.as_deref(), args.platform.arch.as_deref());
            let source = args.source.into_source(env_catalog(&runtime))?;
            commands::resolve(&runtime, &source, &platform)?;
        }
        Commands::Catalog(args) => {
            commands::catalog(
                &runtime,
                &args.version,
                &args.sha256,
                args.base_url.as_deref(),
                args.output.as_deref(),
            )?;
        }
    }
    Ok(())
}

/// Usage errors exit with [`EXIT_FAILURE`], keeping 2 for an unsupported platform.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        err.exit_code()
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}
