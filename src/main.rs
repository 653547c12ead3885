use clap::{Parser, Subcommand};
use imgstage::imaging::supported_input_extensions;
use imgstage::{ImageLoader, MeanRgb, PixelLayout, ResizeFilter, TargetSize, config, output};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgstage")]
#[command(about = "Stage images as float buffers in host/device mapped memory")]
#[command(long_about = "\
Stage images as float buffers in host/device mapped memory

Decodes an image, optionally resizes it to an exact size (aspect ratio is
not preserved), and converts it to one of three layouts:

  rgba   interleaved R,G,B,1.0 per pixel (raw 0-255 values)
  rgb    planar R, G, B planes, (value - mean) * scale
  bgr    planar B, G, R planes, (value - mean) * scale

Run 'imgstage gen-config' to generate a documented imgstage.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct LoadArgs {
    /// Image to load
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Output layout
    #[arg(long, value_enum, default_value_t = PixelLayout::Rgb)]
    layout: PixelLayout,

    /// Resize width (needs --height as well)
    #[arg(long, default_value_t = 0)]
    width: u32,

    /// Resize height (needs --width as well)
    #[arg(long, default_value_t = 0)]
    height: u32,

    /// Per-plane mean as "x,y,z" (overrides config)
    #[arg(long, value_name = "X,Y,Z", allow_hyphen_values = true)]
    mean: Option<MeanRgb>,

    /// Multiplier after mean subtraction (overrides config)
    #[arg(long)]
    scale: Option<f32>,

    /// Resize filter (overrides config)
    #[arg(long, value_enum)]
    filter: Option<ResizeFilter>,

    /// Write the host buffer as raw little-endian f32 to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Load an image and report the staged buffer
    Load(LoadArgs),
    /// Print a stock imgstage.toml with all options documented
    GenConfig,
    /// List image file extensions that can be decoded
    Formats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Load(args) => {
            let mut loader_config = config::load_config(cli.config.as_deref())?;
            if let Some(scale) = args.scale {
                loader_config.conversion.scale = scale;
            }
            if let Some(filter) = args.filter {
                loader_config.resize.filter = filter;
            }
            if let Some(mean) = args.mean {
                loader_config.conversion.mean = mean;
            }
            loader_config.validate()?;

            let loader = ImageLoader::from_config(&loader_config);
            let image = loader.load(
                &args.path,
                TargetSize::new(args.width, args.height),
                args.layout,
                loader.mean(),
            )?;

            let summary = output::summarize(&args.path, &image);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_summary(&summary);
            }

            if let Some(out) = &args.output {
                write_raw_f32(out, image.buffer().host())?;
                log::info!("wrote {} bytes to {}", image.buffer().byte_len(), out.display());
            }
            loader.release(image);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Formats => {
            for ext in supported_input_extensions() {
                println!("{ext}");
            }
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = log_level(verbose, std::env::var("RUST_LOG").ok().as_deref()) {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).format_target(false).init();
}

/// `-v` forces debug; otherwise a non-empty `RUST_LOG` wins over the info default.
fn log_level(verbose: bool, rust_log: Option<&str>) -> Option<log::LevelFilter> {
    if verbose {
        Some(log::LevelFilter::Debug)
    } else if rust_log.is_some_and(|v| !v.is_empty()) {
        None
    } else {
        Some(log::LevelFilter::Info)
    }
}

fn write_raw_f32(path: &Path, values: &[f32]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    for v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()
}
