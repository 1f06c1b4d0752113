use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use protocrate::{
    Options, RustGenerator, crate_mapping::CrateMapping, descriptor::GeneratorRequest,
    host::DirectoryHost,
};

#[derive(Parser, Debug)]
#[command(
    name = "protocrate",
    version,
    about = "Generate a Rust crate from a compiled Protocol Buffers descriptor set"
)]
struct Cli {
    /// Descriptor set (TOML) listing the schema files and the files to generate
    #[arg(short, long)]
    descriptor_set: PathBuf,

    /// Directory receiving the generated sources
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Generator options, e.g. `kernel=upb,experimental-codegen=enabled`
    #[arg(long = "opt", default_value = "")]
    options: String,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("{cli:?}");

    let request = GeneratorRequest::load(&cli.descriptor_set)?;
    let opts = Options::parse(&cli.options).context("Invalid generator options")?;
    let crate_mapping = CrateMapping::from_options(&opts).context("Invalid crate mapping")?;

    let mut host = DirectoryHost::new(&cli.out_dir, request.files_to_generate.clone());
    let generator = RustGenerator::skeleton();
    for &file in &request.files_to_generate {
        generator
            .generate_with(file, &opts, &crate_mapping, &request.pool, &mut host)
            .with_context(|| format!("Failed to generate '{}'", request.pool.file(file).name))?;
    }

    info!(
        "Wrote {} files to {}",
        host.opened().len(),
        host.root().display()
    );
    Ok(())
}
