use clap::Parser;
use std::{fs, path::PathBuf};

use restaurant_api::openapi::document_json;

#[derive(Parser)]
#[command(name = "openapi-export", about = "Write the restaurant API OpenAPI document")]
struct Cli {
    /// Destination file; parent directories are created
    #[arg(short, long, default_value = "openapi/restaurant-api.v1.json")]
    output: PathBuf,

    /// Emit single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Print to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = document_json(!cli.compact)?;

    if cli.stdout {
        println!("{json}");
        return Ok(());
    }

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&cli.output, json)?;

    eprintln!("OpenAPI document written to {}", cli.output.display());
    Ok(())
}
