// Entry point for the game API server

use std::process;
use std::sync::Arc;

use mswpr::ms_log::{LogTarget, init_logger};
use mswpr::ms_server::serve;
use mswpr::ms_settings::ServerSettings;
use mswpr::ms_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match ServerSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mswpr-server: {e}");
            process::exit(2);
        }
    };
    init_logger(settings.log_level, LogTarget::Stderr)?;

    if let Err(e) = serve(settings, Arc::new(Store::new())).await {
        log::error!("{e:#}");
        process::exit(1);
    }
    Ok(())
}
