use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use pixel_enhance::{
    default_output_path, EnhanceEngine, EnhanceOptions, OutputFormat, ProcessResult,
    SimulatedEstimator,
};

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
    Webp,
}

#[derive(Parser)]
#[command(
    name = "pixel-enhance",
    about = "Lift contrast, sharpen and boost saturation of JPEG, PNG and WebP images",
    version,
    after_help = "Simple usage: pixel-enhance <image>  (writes enhanced-<name>.jpg next to it)\n\n\
                  NOTE: Reported quality metrics are illustrative placeholders, not measurements."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: enhanced-{name}.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Output image format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Jpeg)]
    format: FormatArg,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 95)]
    quality: u8,

    /// Maximum input size in megabytes
    #[arg(long, default_value_t = 5)]
    max_size_mb: usize,

    /// Seed for repeatable quality metrics
    #[arg(long)]
    seed: Option<u64>,

    /// Print the enhanced image as a data URL instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if !(1..=100).contains(&cli.quality) {
        eprintln!("Error: Quality must be between 1 and 100");
        process::exit(1);
    }

    if cli.max_size_mb == 0 {
        eprintln!("Error: Maximum input size must be at least 1 MB");
        process::exit(1);
    }

    let output_format = match cli.format {
        FormatArg::Jpeg => OutputFormat::Jpeg {
            quality: cli.quality,
        },
        FormatArg::Png => OutputFormat::Png,
        FormatArg::Webp => OutputFormat::WebP,
    };

    let opts = EnhanceOptions {
        output_format,
        max_input_bytes: cli.max_size_mb.saturating_mul(1024 * 1024),
    };

    let mut engine = EnhanceEngine::with_options(opts);
    if let Some(seed) = cli.seed {
        engine = engine.with_estimator(SimulatedEstimator::seeded(seed));
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if cli.data_url {
        if input_path.is_dir() {
            eprintln!("Error: --data-url only works with a single input file");
            process::exit(1);
        }
        print_data_url(&engine, input_path);
        return;
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: pixel-enhance <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path, output_format),
        };
        vec![engine.process_file(input_path, &output_path)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Enhanced: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn print_data_url(engine: &EnhanceEngine, input: &Path) {
    let bytes = match std::fs::read(input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("[FAIL] {}: Failed to read: {e}", input.display());
            process::exit(1);
        }
    };
    match engine.enhance_bytes(&bytes) {
        Ok(result) => println!("{}", result.encoded.to_data_url()),
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", input.display());
            process::exit(1);
        }
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if !result.success {
        eprintln!("[FAIL] {filename}: {}", result.message);
        return;
    }

    match result.metrics {
        Some(m) => eprintln!(
            "[OK] {filename} (sharpness {}%, noise reduction {}%, color {}%)",
            m.sharpness,
            m.noise_reduction(),
            m.color_enhance
        ),
        None => eprintln!("[OK] {filename}"),
    }
}
