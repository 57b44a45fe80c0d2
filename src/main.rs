// Entry point for the Minesweeper terminal client
// Loads preferences, reads the API address and mounts the UI on the client

use std::error::Error;
use std::process;

use log::LevelFilter;

use mswpr::ms_client::{Bootstrap, CookiePlugin};
use mswpr::ms_config::{config_dir, load_or_create_config};
use mswpr::ms_lang::Lang;
use mswpr::ms_log::{LogTarget, init_logger};
use mswpr::ms_settings::ClientSettings;
use mswpr::ms_ui;

fn main() -> Result<(), Box<dyn Error>> {
    let settings = match ClientSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mswpr: {e}");
            process::exit(2);
        }
    };

    // The UI owns the terminal, so records go to a file next to the config
    if let Some(dir) = config_dir() {
        if std::fs::create_dir_all(&dir).is_ok() {
            let path = dir.join("mswpr.log");
            if let Err(e) = init_logger(LevelFilter::Info, LogTarget::File(&path)) {
                eprintln!("mswpr: logging disabled: {e}");
            }
        }
    }

    let mut cfg = load_or_create_config();
    let mut lang = Lang::new(&cfg.language);

    Bootstrap::new(settings)
        .use_plugin(CookiePlugin)
        .mount(|client| ms_ui::run(client, &mut cfg, &mut lang))?
}
