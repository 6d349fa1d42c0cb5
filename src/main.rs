use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagrab::cli::{Cli, Commands};
use mediagrab::delivery::DeliveryMetadata;
use mediagrab::pipeline::{MediaPipeline, ProcessRequest};
use mediagrab::utils;
use mediagrab::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "mediagrab=debug"
    } else {
        "mediagrab=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Process {
            url,
            media_type,
            output_dir,
            json,
        } => {
            if let Some(dir) = output_dir {
                config.app.download_dir = Some(dir);
            }

            let pipeline = MediaPipeline::new(config);

            tracing::info!("Processing {} as {}", url, media_type.as_str());

            if json {
                let response = pipeline
                    .process_request(ProcessRequest {
                        url,
                        media_type: media_type.as_str().to_string(),
                    })
                    .await;

                println!("{}", serde_json::to_string_pretty(&response)?);

                if !response.success {
                    std::process::exit(1);
                }
            } else {
                let result = pipeline.process(&url, media_type.into()).await?;

                println!("{}", result.message);
                println!("Title:    {}", result.media_info.title);
                println!(
                    "Duration: {}",
                    utils::format_duration(result.media_info.duration_seconds)
                );
                println!("Artifact: {}", result.output_path.display());
                println!("URL:      {}", result.file_url);
            }
        }
        Commands::Info { url } => {
            let pipeline = MediaPipeline::new(config);
            let info = pipeline.media_info(&url).await?;

            println!("Title:     {}", info.title);
            println!("Duration:  {}", utils::format_duration(info.duration_seconds));
            if let Some(thumbnail) = &info.thumbnail_url {
                println!("Thumbnail: {}", thumbnail);
            }
            println!("Formats:   {}", info.formats.len());
        }
        Commands::Deliver {
            file,
            title,
            source,
            duration,
        } => {
            let pipeline = MediaPipeline::new(config);

            let metadata = DeliveryMetadata {
                title: title.unwrap_or_else(|| {
                    file.file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default()
                }),
                duration_seconds: duration,
                source_url: source.unwrap_or_default(),
            };

            pipeline.deliver_artifact(&file, &metadata).await?;
            println!("Delivered: {}", file.display());
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.display();
                println!();
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
