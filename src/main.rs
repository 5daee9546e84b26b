// src/main.rs

use std::fs;
use std::path::Path;

use patrol::{logging, Patrol, WatchPoint};
use tracing::{info, warn};

const STARTER_WATCH_FILE: &str = "\
# Files under patrol. Each entry needs a `source` and a `name`.
- source: README.md
  name: readme
";

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("patrol error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let patrol = Patrol::builder("patrol")
        .help("Report on files listed in patrol.yaml whenever they change.")
        .bootstrap(write_starter_watch_file)
        .on_inspection(describe)
        .build()?;

    let args = patrol.parse_args();
    logging::init_logging(args.log_level, args.debug || patrol.debug())?;
    patrol.run(args).await?;
    Ok(())
}

fn write_starter_watch_file(path: &Path) -> bool {
    match fs::write(path, STARTER_WATCH_FILE) {
        Ok(()) => {
            info!("created {}", path.display());
            true
        }
        Err(err) => {
            warn!("could not create {}: {err}", path.display());
            false
        }
    }
}

fn describe(watch_point: &WatchPoint, dry_run: bool) -> anyhow::Result<()> {
    let metadata = fs::metadata(watch_point.path())?;
    let extra: Vec<&str> = watch_point
        .raw()
        .keys()
        .map(String::as_str)
        .filter(|k| *k != "source" && *k != "name")
        .collect();

    println!(
        "{}{}: {} ({} bytes){}",
        if dry_run { "[dry-run] " } else { "" },
        watch_point.name(),
        watch_point.path().display(),
        metadata.len(),
        if extra.is_empty() {
            String::new()
        } else {
            format!(", extra keys: {}", extra.join(", "))
        }
    );
    Ok(())
}
