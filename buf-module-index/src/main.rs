use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use buf_module_index::config::{Config, OutputFormat};
use buf_module_index::coordinates::ModuleCoordinates;
use buf_module_index::document::FileContent;
use buf_module_index::file_types;
use buf_module_index::host::{IndexUpdate, MemoryIndexHost, ProjectScope};
use buf_module_index::index::{BufModuleIndex, FileIndexExtension, all_project_modules};
use buf_module_index::scan::scan_workspace;

#[derive(Parser)]
#[command(name = "buf-module-index")]
#[command(about = "Index Buf modules pinned by buf.lock files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a workspace and list every module pinned by its lock files
    Scan {
        /// Workspace root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output format (overrides the config file)
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Extract the modules of a single lock file
    Extract {
        /// Path to the buf.lock file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Profile lock file extraction (for use with cargo-flamegraph)
    ProfileExtract {
        /// Path to the buf.lock file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of iterations (for meaningful profiling)
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Scan {
            root,
            output,
            config,
        } => run_scan(root, output, config).await,
        Commands::Extract { file } => run_extract(file).await,
        Commands::ProfileExtract { file, iterations } => {
            run_profile_extract(file, iterations).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_scan(
    root: PathBuf,
    output: Option<OutputFormat>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let format = output.unwrap_or(config.output.format);

    let files = scan_workspace(&root, &config.scan).await?;
    let project = ProjectScope::new(
        root.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string()),
        root.clone(),
    );

    let host = MemoryIndexHost::new(BufModuleIndex::new());
    for file in &files {
        host.update_file(&project, file);
    }
    tracing::info!(
        "Indexed {} lock files under {}: {}",
        files.len(),
        root.display(),
        host.stats()
    );

    let modules = all_project_modules(&host, &project)?;
    print_modules(&modules, format)
}

async fn run_extract(file: PathBuf) -> anyhow::Result<()> {
    let content = read_lock_file(&file).await?;
    let modules: Vec<ModuleCoordinates> = BufModuleIndex::new()
        .index(&content)
        .into_keys()
        .collect();
    print_modules(&modules, OutputFormat::Json)
}

async fn run_profile_extract(file: PathBuf, iterations: usize) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&file).await?;
    let path = std::path::absolute(&file)?;
    let index = BufModuleIndex::new();

    eprintln!("Profiling extraction for: {}", file.display());
    eprintln!("Iterations: {iterations}");
    eprintln!("File size: {} bytes", text.len());

    let start = Instant::now();
    let mut total = 0;
    for _ in 0..iterations {
        let content = FileContent::from_path(&path, &text);
        total += index.index(&content).len();
    }
    let elapsed = start.elapsed();

    eprintln!("\nProfiling complete!");
    eprintln!("Modules extracted: {total}");
    eprintln!("Total time: {elapsed:?}");
    eprintln!(
        "Average per iteration: {:?}",
        elapsed / per_iteration_divisor(iterations)
    );
    Ok(())
}

/// Divisor for the per-iteration average, clamped to `1..=u32::MAX`
fn per_iteration_divisor(iterations: usize) -> u32 {
    u32::try_from(iterations).unwrap_or(u32::MAX).max(1)
}

async fn read_lock_file(file: &Path) -> anyhow::Result<FileContent> {
    let text = tokio::fs::read_to_string(file).await?;
    let path = std::path::absolute(file)?;
    if !file_types::accepts_path(&path) {
        tracing::warn!("{} is not named buf.lock, extracting anyway", file.display());
    }
    Ok(FileContent::from_path(&path, &text))
}

fn print_modules(modules: &[ModuleCoordinates], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(modules)?),
        OutputFormat::Summary => {
            if modules.is_empty() {
                println!("No Buf modules found");
            }
            for module in modules {
                println!("{module}  ({})", module.lock_file_location);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_iteration_divisor() {
        assert_eq!(per_iteration_divisor(0), 1);
        assert_eq!(per_iteration_divisor(1000), 1000);
        assert_eq!(per_iteration_divisor(u32::MAX as usize), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_per_iteration_divisor_saturates() {
        // 2^32 would truncate to 0 with a plain cast
        assert_eq!(per_iteration_divisor(1usize << 32), u32::MAX);
        let average = std::time::Duration::from_secs(1) / per_iteration_divisor(1usize << 32);
        assert!(average < std::time::Duration::from_micros(1));
    }
}
