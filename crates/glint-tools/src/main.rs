//! `glint`: loads a glTF or GLB file and prints what it contains.

mod summary;

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use futures::executor::block_on;
use glint_io::{FsFetcher, GltfLoader, ImageTextureDecoder};

#[derive(Parser, Debug)]
#[command(name = "glint")]
#[command(about = "Inspect glTF 2.0 and GLB assets")]
struct Cli {
    /// Input .gltf or .glb file
    file: PathBuf,

    /// Merge the primitives of each mesh into one grouped geometry
    #[arg(long)]
    merge_geometries: bool,

    /// Log loader progress
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let loader = GltfLoader::new()
        .with_fetcher(Rc::new(FsFetcher::new()))
        .with_texture_decoder(Rc::new(ImageTextureDecoder::new()))
        .with_geometry_merge(cli.merge_geometries);

    let path = cli.file.to_string_lossy();
    let gltf = block_on(loader.load(&path))?;
    summary::write_summary(out, &gltf)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let stdout = io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to load {}: {}", cli.file.display(), e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
