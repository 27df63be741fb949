use std::io::Read;

use anyhow::Context;
use icon_layout::desktop::{restore_desktop, scan_desktop};
use icon_layout::layout::LayoutSet;
use icon_layout::logging;
use icon_layout::settings::{Settings, SETTINGS_FILE};

const USAGE: &str = "usage: icon-layout scan | icon-layout restore <file|->";

fn read_layout(source: &str) -> anyhow::Result<LayoutSet> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing layout from {source}"))
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging, settings.log_path());
    let options = settings.scan_options();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["scan"] => {
            let set = scan_desktop(&options)?;
            tracing::info!("scanned {} icons", set.len());
            println!("{}", serde_json::to_string_pretty(&set)?);
        }
        ["restore", source] => {
            let saved = read_layout(source)?;
            let outcome = restore_desktop(&saved, &options);
            println!("{outcome}");
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}
