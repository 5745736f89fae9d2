mod cli;

use frameforge::config;
use frameforge::convert::{self, ConvertRequest};
use frameforge_av::{
    check_tools, create_transcoder, is_supported, probe, Backend, ConversionContext, MediaHost,
    ProgressSender, SoftwareHost,
};
use frameforge_common::formats::{mime_type, supported_formats};
use frameforge_common::{
    MediaKind, PartialAudioConfig, PartialConversionConfig, PartialImageConfig,
    PartialVideoConfig, Resolution, VideoQuality,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "frameforge=trace,frameforge_av=trace,frameforge_common=debug".to_string()
        } else {
            "frameforge=info,frameforge_av=info,frameforge_common=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            to,
            kind,
            output,
            backend,
            resolution,
            quality,
            codec,
            bitrate,
            sample_rate,
            width,
            height,
            image_quality,
            json,
        } => {
            let overrides = PartialConversionConfig {
                video: Some(PartialVideoConfig {
                    format: None,
                    resolution: resolution.map(Resolution::from),
                    quality: quality.map(VideoQuality::from),
                    codec,
                }),
                audio: Some(PartialAudioConfig {
                    format: None,
                    bitrate,
                    sample_rate,
                }),
                image: Some(PartialImageConfig {
                    format: None,
                    quality: image_quality,
                    width,
                    height,
                }),
            };
            let request = ConvertRequest {
                input,
                target_format: to,
                kind,
                output,
                backend,
                overrides,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(request, cli.config.as_deref(), json))
        }
        Commands::Formats { kind } => list_formats(kind),
        Commands::Check => check(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("frameforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    request: ConvertRequest,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !request.input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", request.input);
    }

    let ctx = ConversionContext::new().with_progress(ProgressSender::new(|pct, step| {
        tracing::debug!("{:>5.1}% {}", pct, step);
    }));

    // Cancel the conversion on Ctrl-C
    let token = ctx.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling conversion");
            token.cancel();
        }
    });

    let host: Arc<dyn MediaHost> = Arc::new(SoftwareHost::new());
    let report = convert::convert_file(&config, &request, host, &ctx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Converted: {}", request.input.display());
        println!("Output: {}", report.output.display());
        println!("Format: {} ({})", report.result.format, report.result.mime_type);
        println!(
            "Size: {} -> {} bytes",
            report.result.original_size, report.result.converted_size
        );
        println!("Backend: {}", report.backend);
    }

    Ok(())
}

fn list_formats(kind: Option<MediaKind>) -> Result<()> {
    let kinds = match kind {
        Some(k) => vec![k],
        None => MediaKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("{}:", kind);
        for format in supported_formats(kind) {
            println!("  {:<6} {}", format, mime_type(format));
        }
    }

    Ok(())
}

fn check(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let host: Arc<dyn MediaHost> = Arc::new(SoftwareHost::new());

    println!("Backends:\n");
    for backend in Backend::ALL {
        let transcoder = create_transcoder(backend, host.clone(), config.tools.settings());
        let primitives = transcoder.primitives();
        let caps = probe(primitives);
        let status = if is_supported(primitives) { "✓" } else { "✗" };
        println!(
            "{} {} (video: {}, audio: {})",
            status,
            backend,
            yes_no(caps.video),
            yes_no(caps.audio)
        );
    }
    println!(
        "\nCapability gate: {:?}",
        config.conversion.capability_gate
    );

    println!("\nExternal tools:\n");
    let tools = check_tools(&config.tools.settings());
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
        println!("All external tools are available!");
    } else {
        println!("Some tools are missing. The command backend needs ffmpeg.");
    }

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config_summary(config: &config::Config) {
    let effective = frameforge_common::ConversionConfig::default().merged(&config.overrides());
    println!("  Backend: {:?}", config.conversion.backend);
    println!("  Capability gate: {:?}", config.conversion.capability_gate);
    println!(
        "  Video: {} {} {} {}",
        effective.video.format, effective.video.resolution, effective.video.quality, effective.video.codec
    );
    println!(
        "  Audio: {} {} {} Hz",
        effective.audio.format, effective.audio.bitrate, effective.audio.sample_rate
    );
    println!(
        "  Image: {} quality {}",
        effective.image.format, effective.image.quality
    );
    println!("  Tool timeout: {}s", config.tools.timeout_secs);
}
