use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use log::error;
use shader_header::{build_headers, BuildOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Shader files or folders containing shader files.
    /// Each shader file produces a header next to it.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// The file pattern for shaders in input folders.
    #[arg(long, default_value = "*.glsl")]
    pattern: String,

    /// Includes starting with this prefix are relative to the working directory
    /// instead of the including file.
    #[arg(long, default_value = shader_header::resolve::THIRD_PARTY_PREFIX)]
    third_party_prefix: String,

    /// The suffix appended to each input path for the generated header.
    #[arg(
        long,
        default_value = shader_header::header::OUTPUT_SUFFIX,
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    suffix: String,

    /// Don't insert a newline after each line of the embedded shader source.
    #[arg(long)]
    no_newline: bool,

    /// Log each file and section as it is resolved.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init()
        .context("failed to initialize logger")?;

    let start = std::time::Instant::now();

    let mut paths = Vec::new();
    for input in &cli.inputs {
        paths.extend(shader_paths(Path::new(input), &cli.pattern)?);
    }

    let options = BuildOptions {
        third_party_prefix: cli.third_party_prefix,
        output_suffix: cli.suffix,
        insert_newline: !cli.no_newline,
    };

    let results = build_headers(&paths, &options);
    let mut failed = 0;
    for (path, result) in paths.iter().zip(results) {
        if let Err(e) = result {
            error!("Error building header for {path:?}: {:#}", anyhow::Error::from(e));
            failed += 1;
        }
    }

    println!("Finished in {:?}", start.elapsed());

    if failed > 0 {
        bail!("{failed} of {} shader files failed", paths.len());
    }
    Ok(())
}

fn shader_paths(input: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_dir() {
        // Sort for a consistent processing order across platforms.
        let mut paths: Vec<_> = globwalk::GlobWalkerBuilder::from_patterns(input, &[pattern])
            .build()
            .with_context(|| format!("invalid pattern {pattern:?} for {input:?}"))?
            .filter_map(|e| e.map(|e| e.path().to_owned()).ok())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    } else {
        // Missing files are reported when building the header.
        Ok(vec![input.to_owned()])
    }
}
