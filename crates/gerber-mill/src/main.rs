use clap::Parser;
use gerber_mill::project::{render_layers, LayerPrimitives};
use gerber_mill::{MillOptions, MilledImages, ProjectFiles};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gerber-mill",
    about = "Render KiCad Gerber and drill files into PNG images for PCB milling"
)]
struct Cli {
    /// Project prefix; layers are read from <PROJECT>-Edge_Cuts.gbr, <PROJECT>-B_Cu.gbl, ...
    project: String,

    /// Pixels per file unit (also written as the PNG's DPI)
    #[arg(long, default_value_t = 1000.0)]
    resolution: f64,

    /// Pixel spacing between aperture stamps along drawn lines
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Border around the board in millimeters
    #[arg(long, default_value_t = 0.5)]
    border: f64,

    /// Also write the parsed primitive lists as JSON into this directory
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let opts = MillOptions {
        resolution: cli.resolution,
        step: cli.step,
        border_mm: cli.border,
    };
    if let Err(e) = opts.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let files = ProjectFiles::discover(&cli.project);
    let layers = match LayerPrimitives::parse(&files, &opts) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(dir) = &cli.dump {
        if let Err(e) = layers.dump_json(dir) {
            eprintln!("Error writing primitives: {e}");
            std::process::exit(1);
        }
    }

    let outputs = MilledImages::for_prefix(&cli.project);
    match render_layers(&layers, &outputs, &opts) {
        Ok(()) => {
            eprintln!("Written to {}", outputs.traces.display());
            eprintln!("Written to {}", outputs.cutout.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
