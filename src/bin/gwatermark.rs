use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use image::{DynamicImage, RgbaImage};

use gwatermark::{
    codec, default_output_path, Detection, DirAssetStore, ProcessOptions, ProcessResult,
    WatermarkEngine,
};

#[derive(Parser)]
#[command(
    name = "gwatermark",
    about = "Detect and remove the visible Gemini watermark via reverse alpha blending",
    version,
    after_help = "Simple usage: gwatermark <image>  (writes <name>_unwatermarked.png)\n\n\
                  Images without a detected watermark are skipped unless --force is given."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    #[arg(required_unless_present = "base64", conflicts_with = "base64")]
    input: Option<PathBuf>,

    /// Base64 image input (optionally a data URL) instead of a file
    #[arg(long, value_name = "TEXT")]
    base64: Option<String>,

    /// Output file or directory (default: {name}_unwatermarked.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the cleaned PNG as base64 to stdout instead of writing a file
    #[arg(long)]
    out_base64: bool,

    /// Only report detection, do not remove anything
    #[arg(long)]
    detect: bool,

    /// Skip watermark detection, process unconditionally
    #[arg(short, long)]
    force: bool,

    /// Directory containing bg_48.png and bg_96.png
    /// (default: $GWATERMARK_ASSETS, then the bundled assets directory)
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(opts: &ProcessOptions) {
    let default_level = if opts.quiet {
        "error"
    } else if opts.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();

    let opts = ProcessOptions {
        force: cli.force,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    init_tracing(&opts);

    let engine = match &cli.assets {
        Some(dir) => WatermarkEngine::with_store(DirAssetStore::new(dir)),
        None => WatermarkEngine::new(),
    };

    if let Some(text) = &cli.base64 {
        process::exit(run_base64(&engine, &cli, text, &opts));
    }

    let Some(input_path) = cli.input.as_deref() else {
        eprintln!("Error: an input path or --base64 is required");
        process::exit(1);
    };
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", input_path.display());
        process::exit(1);
    }

    if cli.detect {
        process::exit(run_detect(&engine, input_path));
    }

    if !opts.quiet && opts.force {
        eprintln!("WARNING: Force mode - processing ALL images without detection!");
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = &cli.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: gwatermark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, output_dir, &opts)
    } else if cli.out_base64 {
        process::exit(run_file_to_base64(&engine, input_path, &opts));
    } else {
        let output_path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input_path));
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_detection(source: &str, d: &Detection) {
    let verdict = if d.present { "present" } else { "absent" };
    println!(
        "{source}: watermark {verdict} (score {:.2}, correlation {:.3}) {}x{} at {}",
        d.score, d.correlation, d.info.size, d.info.size, d.info.position
    );
}

fn run_detect(engine: &WatermarkEngine, path: &Path) -> i32 {
    let detection = std::fs::read(path)
        .map_err(gwatermark::Error::from)
        .and_then(|data| engine.detect_bytes(&data));
    match detection {
        Ok(d) => {
            print_detection(&path.display().to_string(), &d);
            0
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", path.display());
            1
        }
    }
}

fn run_base64(engine: &WatermarkEngine, cli: &Cli, text: &str, opts: &ProcessOptions) -> i32 {
    let (image, format) = match codec::decode_base64_image(text) {
        Ok(decoded) => decoded,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let source = format!("base64 ({format:?})");

    if cli.detect {
        return match engine.detect(&image) {
            Ok(d) => {
                print_detection(&source, &d);
                0
            }
            Err(e) => {
                eprintln!("[FAIL] {source}: {e}");
                1
            }
        };
    }

    let cleaned = match clean(engine, &image, opts) {
        Ok(Some(cleaned)) => cleaned,
        Ok(None) => return 0,
        Err(e) => {
            eprintln!("[FAIL] {source}: {e}");
            return 1;
        }
    };

    match &cli.output {
        Some(out) if !cli.out_base64 => match gwatermark::save_image(&cleaned, out) {
            Ok(()) => {
                if !opts.quiet {
                    eprintln!("[OK] {source} -> {}", out.display());
                }
                0
            }
            Err(e) => {
                eprintln!("[FAIL] {source}: {e}");
                1
            }
        },
        _ => print_base64(&cleaned),
    }
}

fn run_file_to_base64(engine: &WatermarkEngine, path: &Path, opts: &ProcessOptions) -> i32 {
    let decoded = std::fs::read(path)
        .map_err(gwatermark::Error::from)
        .and_then(|data| codec::decode_image_bytes(&data));
    let cleaned = decoded.and_then(|(image, _)| clean(engine, &image, opts));

    match cleaned {
        Ok(Some(cleaned)) => print_base64(&cleaned),
        Ok(None) => 0,
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", path.display());
            1
        }
    }
}

fn print_base64(cleaned: &RgbaImage) -> i32 {
    match codec::encode_png_base64(cleaned) {
        Ok(encoded) => {
            println!("{encoded}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

/// Detect (unless forced) and remove. `None` means no watermark was found.
fn clean(
    engine: &WatermarkEngine,
    image: &DynamicImage,
    opts: &ProcessOptions,
) -> gwatermark::Result<Option<RgbaImage>> {
    if !opts.force {
        let detection = engine.detect(image)?;
        if !detection.present {
            if !opts.quiet {
                eprintln!(
                    "No visible watermark detected (score {:.2}). Skipping removal.",
                    detection.score
                );
            }
            return Ok(None);
        }
    }
    engine.remove(image).map(Some)
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            if result.score > 0.0 {
                eprintln!("[OK] {filename} (score {:.2})", result.score);
            } else {
                eprintln!("[OK] {filename}");
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
