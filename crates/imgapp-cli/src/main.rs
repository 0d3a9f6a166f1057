//! imgapp - Convert raw RGBA buffers to and from encoded images
//!
//! A command-line harness around the `imgapp` library. Every subcommand builds
//! a parameter set and hands it to the same validator, so `run -e ...` and the
//! typed `encode` / `decode` subcommands fail in exactly the same way.

use clap::{ArgAction, Parser, Subcommand};
use imgapp::params::keys;
use imgapp::{analyze_bytes, analyze_grid, read_raw, ImageCodec, ImgError, ParameterSet, RawStats};
use log::{error, info};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status for requests rejected before any I/O.
const EXIT_INVALID: u8 = 2;

#[derive(Parser)]
#[command(name = "imgapp")]
#[command(version)]
#[command(about = "Convert raw RGBA buffers to and from encoded images", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a raw parameter bundle, e.g. `-e decode a -e input in.png -e output out.rgba`
    Run {
        /// Parameter as KEY VALUE (repeatable)
        #[arg(short = 'e', long = "extra", num_args = 2, value_names = ["KEY", "VALUE"], action = ArgAction::Append)]
        extras: Vec<String>,

        /// Base directory for relative paths
        #[arg(long, env = "IMGAPP_WORKDIR")]
        workdir: Option<String>,
    },

    /// Encode a raw RGBA buffer into an image file
    Encode {
        /// Input raw RGBA file
        #[arg(short, long)]
        input: String,

        /// Output image file
        #[arg(short, long)]
        output: String,

        /// Width of the raw buffer in pixels
        #[arg(long)]
        width: String,

        /// Height of the raw buffer in pixels
        #[arg(long)]
        height: String,

        /// PNG, JPEG, WEBP_LOSSY or WEBP_LOSSLESS (default: PNG)
        #[arg(long)]
        compress_format: Option<String>,

        /// Quality level (0-100, ignored by lossless formats)
        #[arg(long)]
        compress_quality: Option<String>,

        /// Base directory for relative paths
        #[arg(long, env = "IMGAPP_WORKDIR")]
        workdir: Option<String>,
    },

    /// Decode an image file into a raw RGBA buffer
    Decode {
        /// Input image file (PNG, JPEG, GIF, WebP)
        #[arg(short, long)]
        input: String,

        /// Output raw RGBA file
        #[arg(short, long)]
        output: String,

        /// Named color space for the decoded pixels (e.g. SRGB, LINEAR_SRGB)
        #[arg(long)]
        in_preferred_color_space: Option<String>,

        /// Base directory for relative paths
        #[arg(long, env = "IMGAPP_WORKDIR")]
        workdir: Option<String>,
    },

    /// Print per-channel mean and standard deviation of raw RGBA files
    Analyze {
        /// Raw RGBA file, or a directory of *.rgba files
        input: PathBuf,

        /// Write CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Expected width; checks the buffer size together with --height
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Expected height
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
}

impl Commands {
    /// Parameter set for the conversion subcommands.
    fn parameters(&self) -> Option<ParameterSet> {
        let mut params = ParameterSet::new();
        match self {
            Commands::Run { extras, workdir } => {
                if let Some(dir) = workdir {
                    params.insert(keys::WORKDIR, dir.as_str());
                }
                for pair in extras.chunks_exact(2) {
                    params.insert(pair[0].as_str(), pair[1].as_str());
                }
            }
            Commands::Encode {
                input,
                output,
                width,
                height,
                compress_format,
                compress_quality,
                workdir,
            } => {
                params.insert(keys::ENCODE, "");
                params.insert(keys::INPUT, input.as_str());
                params.insert(keys::OUTPUT, output.as_str());
                params.insert(keys::WIDTH, width.as_str());
                params.insert(keys::HEIGHT, height.as_str());
                insert_opt(&mut params, keys::COMPRESS_FORMAT, compress_format);
                insert_opt(&mut params, keys::COMPRESS_QUALITY, compress_quality);
                insert_opt(&mut params, keys::WORKDIR, workdir);
            }
            Commands::Decode {
                input,
                output,
                in_preferred_color_space,
                workdir,
            } => {
                params.insert(keys::DECODE, "");
                params.insert(keys::INPUT, input.as_str());
                params.insert(keys::OUTPUT, output.as_str());
                insert_opt(
                    &mut params,
                    keys::IN_PREFERRED_COLOR_SPACE,
                    in_preferred_color_space,
                );
                insert_opt(&mut params, keys::WORKDIR, workdir);
            }
            Commands::Analyze { .. } => return None,
        }
        Some(params)
    }
}

fn insert_opt(params: &mut ParameterSet, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        params.insert(key, value.as_str());
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Analyze {
            input,
            output,
            width,
            height,
        } => analyze(input, output.as_deref(), (*width).zip(*height)),
        command => command.parameters().map_or(Ok(()), |params| {
            imgapp::run(&params, &ImageCodec).map(|_| ())
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &ImgError) -> u8 {
    match e {
        ImgError::InvalidInvocation(_)
        | ImgError::MissingParameter(_)
        | ImgError::InvalidParameter { .. } => EXIT_INVALID,
        _ => 1,
    }
}

/// Raw files to analyze: `input` itself, or its `*.rgba` entries sorted.
fn analysis_inputs(input: &Path) -> imgapp::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let entries = fs::read_dir(input).map_err(|e| ImgError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ImgError::Io {
                path: input.to_path_buf(),
                source: e,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rgba") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn analyze_file(path: &Path, dimensions: Option<(u32, u32)>) -> imgapp::Result<RawStats> {
    match dimensions {
        Some((width, height)) => read_raw(path, width, height).map(|grid| analyze_grid(&grid)),
        None => {
            let bytes = fs::read(path).map_err(|e| ImgError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            analyze_bytes(&bytes)
        }
    }
}

fn analyze(
    input: &Path,
    output: Option<&Path>,
    dimensions: Option<(u32, u32)>,
) -> imgapp::Result<()> {
    let files = analysis_inputs(input)?;
    if files.is_empty() {
        info!("no .rgba files in '{}'", input.display());
    }

    let mut rows = vec![RawStats::csv_header().to_string()];
    for path in &files {
        let stats = analyze_file(path, dimensions)?;
        rows.push(stats.to_csv_row(&path.to_string_lossy()));
    }

    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| ImgError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            write_rows(BufWriter::new(file), &rows).map_err(|e| ImgError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            info!("Written {} rows to '{}'", files.len(), path.display());
        }
        None => write_rows(io::stdout().lock(), &rows)?,
    }
    Ok(())
}

fn write_rows<W: Write>(mut out: W, rows: &[String]) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{row}")?;
    }
    out.flush()
}
