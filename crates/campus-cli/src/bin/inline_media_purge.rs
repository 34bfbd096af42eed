use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use campus_cli::{init_tracing, OutputFormat, PurgeOutput};
use campus_core::Config;
use campus_db::{connect_pool, PgInlineMediaRepository};
use campus_services::InlineMediaLifecycleService;
use campus_storage::{create_storage, MediaStorageClient};

#[derive(Parser, Debug)]
#[command(name = "inline_media_purge")]
#[command(about = "Reclaim expired TEMP inline media uploads")]
struct Args {
    /// Maximum number of expired uploads to examine (default: INLINE_MEDIA_PURGE_BATCH_SIZE)
    #[arg(long, value_name = "N")]
    limit: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let pool = connect_pool(&config).await?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let inline_media = config.inline_media().clone();
    let limit = args.limit.unwrap_or(inline_media.purge_batch_size);
    let service = InlineMediaLifecycleService::new(
        Arc::new(PgInlineMediaRepository::new(pool)),
        MediaStorageClient::new(storage, &inline_media),
        inline_media,
    );

    let report = service.purge_expired_temp_uploads(limit).await?;
    let remaining = service.registry_summary(None).await?;

    let output = PurgeOutput {
        limit,
        report,
        remaining,
    };
    println!("{}", output.render(args.format)?);

    Ok(())
}
