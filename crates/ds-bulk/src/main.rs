use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use ds_bulk::cli::Args;
use ds_bulk::report;
use ds_core::services::bulk::BulkProcessor;
use ds_core::services::config_loader;
use ds_core::services::recipe_builder::{BuilderConfig, RecipeBuilders};
use ds_core::services::registry::DirectoryRegistry;
use ds_core::services::spec_store::FileSpecStore;
use ds_core::services::ssh::Ed25519KeyFactory;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _guard = setup_logging(&args);

    let config = config_loader::load(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        registry = %config.registry_dir.display(),
        store = %config.store_path.display(),
        lifecycles = config.lifecycles.len(),
        "config_loaded"
    );

    let builders = RecipeBuilders::new(BuilderConfig::from_sync_config(
        &config,
        Arc::new(Ed25519KeyFactory),
    ));
    let bulk = BulkProcessor::new(
        Arc::new(FileSpecStore::new(&config.store_path)),
        Arc::new(DirectoryRegistry::new(&config.registry_dir)),
        builders,
    );

    if args.once {
        let summary = bulk.sync_once().await?;
        if args.json {
            println!("{}", report::render_json(&summary)?);
        } else {
            print!("{}", report::render_summary(&summary));
        }
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "listening_for_shutdown_failed");
        }
    };
    bulk.run(Duration::from_secs(config.sync_interval_secs.max(1)), shutdown)
        .await;
    Ok(())
}

/// Log to stderr, or to `--log-file` when given. Returns the guard that must
/// be held alive for the duration of the program.
fn setup_logging(args: &Args) -> WorkerGuard {
    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .map(OsString::from)
                .unwrap_or_else(|| OsString::from("ds-sync.log"));
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_ansi(args.log_file.is_none())
        .init();

    guard
}
