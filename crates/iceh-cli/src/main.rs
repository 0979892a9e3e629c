use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(
    name = "iceh-rs",
    version,
    about = "iCloud Photo Export Helper - restamp exported photos from their Photo Details index and archive them by capture date"
)]
struct Cli {
    /// Input directory, where pictures and index files will be found
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory, where pictures are going to be moved
    #[arg(short, long, default_value = "./target")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let options = iceh_core::RunOptions {
        input: cli.input,
        output: cli.output,
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} {prefix} {msg}")
            .unwrap(),
    );

    let pb_cb = pb.clone();
    let report = iceh_core::run(&options, &move |stage, current, total, message| {
        if pb_cb.length() != Some(total) {
            pb_cb.set_length(total);
        }
        pb_cb.set_prefix(stage.to_string());
        pb_cb.set_message(message.to_string());
        pb_cb.set_position(current);
    })?;
    pb.finish_and_clear();

    for warning in &report.warnings {
        eprintln!("WARNING: {warning}");
    }
    eprintln!(
        "Done! {} index entries, {} files placed, {} skipped, {} failed ({:.2}s)",
        report.indexed,
        report.placed,
        report.skipped,
        report.failed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
