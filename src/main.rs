mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tubely::{AssetPipeline, KeyGenerator, LocalAssetStore, VideoRecord};
use tubely_av::tools::{FFMPEG, FFPROBE};
use tubely_av::{AspectProber, FastStartTranscoder, ProcessRunner, ToolRegistry};
use tubely_core::config::Config;
use tubely_core::UserId;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults based on the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubely=trace,tubely_av=trace,tubely_core=debug".to_string()
        } else {
            "tubely=info,tubely_av=info,tubely_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Probe { file, json } => block_on(probe_file(&config, &file, json)),
        Commands::Faststart { file } => block_on(faststart_file(&config, &file)),
        Commands::Key { media_type } => {
            println!("{}", KeyGenerator::default().new_asset_key(&media_type));
            Ok(())
        }
        Commands::Publish {
            file,
            media_type,
            title,
            thumbnail,
        } => block_on(publish_file(&config, &file, &media_type, &title, thumbnail)),
        Commands::CheckTools => check_tools(&config),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubely {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let prober = AspectProber::new(tools.require(FFPROBE)?.clone(), Arc::new(ProcessRunner))
        .with_tolerance(config.probe.tolerance());

    let (width, height) = prober.dimensions(file).await?;
    let aspect = prober.classify(width, height);

    if json {
        let out = serde_json::json!({
            "file": file,
            "width": width,
            "height": height,
            "aspect_ratio": aspect,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("File: {}", file.display());
        println!("Dimensions: {}x{}", width, height);
        println!("Aspect ratio: {}", aspect);
    }

    Ok(())
}

async fn faststart_file(config: &Config, file: &Path) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let transcoder = FastStartTranscoder::new(tools.require(FFMPEG)?.clone(), Arc::new(ProcessRunner));

    let output = transcoder
        .remux(file)
        .await
        .with_context(|| format!("fast-start remux of {} failed", file.display()))?;
    println!("{}", output.display());
    Ok(())
}

async fn publish_file(
    config: &Config,
    file: &Path,
    media_type: &str,
    title: &str,
    thumbnail: bool,
) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let store = LocalAssetStore::new(&config.assets.root, config.assets_base_url());
    store.ensure_dir().await?;

    let pipeline =
        AssetPipeline::from_config(config, &tools, Arc::new(ProcessRunner), Arc::new(store))?;

    let mut record = VideoRecord::new(UserId::new(), title);
    let reader = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;

    if thumbnail {
        pipeline
            .publish_thumbnail(&mut record, media_type, reader)
            .await?;
    } else {
        pipeline.publish_video(&mut record, media_type, reader).await?;
    }

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to publish videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("cannot read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Assets: {}", config.assets.root.display());
    println!("  Asset URL: {}", config.assets_base_url());
    println!("  Bucket: {} ({})", config.s3.bucket, config.s3.region);
    println!("  Tool timeout: {}s", config.tools.timeout_secs);

    for warning in config.validate() {
        println!("  ⚠ {}", warning);
    }

    Ok(())
}
