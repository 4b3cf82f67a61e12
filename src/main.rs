mod builder;
mod logging;
mod parser;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wiki-deploy")]
#[command(version)]
#[command(about = "Deploys a markdown wiki as a static site with a navigation sidebar", long_about = None)]
struct Cli {
    /// URL path prefix of every sidebar link, e.g. `/AurorasDecorations`
    #[arg(default_value = "")]
    root: String,

    /// Wiki source directory
    #[arg(short, long, default_value = ".")]
    source: PathBuf,
}

fn main() -> Result<()> {
    logging::init()?;

    let cli = Cli::parse();
    builder::deploy(&cli.source, &cli.root)
}
