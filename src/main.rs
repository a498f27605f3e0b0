use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corpus_builder::cli::{Cli, Commands};
use corpus_builder::config::Config;
use corpus_builder::corpus::CorpusPipeline;
use corpus_builder::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "corpus_builder=debug"
    } else {
        "corpus_builder=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Build {
            urls,
            url_file,
            language,
            output_dir,
            remove_source,
            report,
        } => {
            // Check for required external dependencies (non-fatal)
            let missing_deps = utils::check_dependencies(
                &config.tools.yt_dlp_path,
                &config.tools.ffmpeg_path,
                &config.tools.ffprobe_path,
            )
            .await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            if let Some(language) = language {
                config.corpus.language = language;
            }
            if let Some(output_dir) = output_dir {
                config.corpus.output_dir = output_dir;
            }
            if remove_source {
                config.corpus.remove_source_audio = true;
            }
            config.validate()?;

            let urls = if !urls.is_empty() {
                urls
            } else if let Some(path) = url_file {
                utils::read_url_list(&path)?
            } else {
                config.corpus.urls.clone()
            };

            if urls.is_empty() {
                anyhow::bail!("No URLs given: pass them as arguments, with --url-file, or set corpus.urls in the config");
            }

            tracing::info!(
                "Building corpus from {} videos in language '{}' into {}",
                urls.len(),
                config.corpus.language,
                config.corpus.output_dir.display()
            );

            let pipeline = CorpusPipeline::new(&config, !cli.quiet);
            let (_registry, batch) = pipeline.build_corpus(&urls).await?;

            if let Some(path) = report {
                output::save_report(&batch, &path)?;
                println!("Report saved to: {}", path.display());
            }

            batch.print_summary();
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
        Commands::Check => {
            let missing = utils::check_dependencies(
                &config.tools.yt_dlp_path,
                &config.tools.ffmpeg_path,
                &config.tools.ffprobe_path,
            )
            .await;

            if missing.is_empty() {
                println!("All external tools are available.");
            } else {
                println!("Missing tools:");
                for dep in &missing {
                    println!("  • {}", dep);
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
