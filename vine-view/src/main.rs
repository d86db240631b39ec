//! Application entry point for the vine planter viewer.
//!
//! Usage: `vine-view [config.toml]`. Without an argument, or if the file
//! cannot be loaded, the default config is used.

mod viewer;

use vine_core::Config;
use viewer::Viewer;

fn load_config() -> Config {
    let Some(path) = std::env::args().nth(1) else {
        return Config::default();
    };
    match Config::load(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path, "loaded config");
            cfg
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "falling back to default config");
            Config::default()
        }
    }
}

/// Starts the native eframe application.
///
/// Installs the tracing subscriber, loads the config and opens the window
/// titled `"Vine Planter"`. All UI state and rendering are handled by
/// [`Viewer`].
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop, or
///   the config is rejected by the planter.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    let seed: u64 = rand::random();
    tracing::info!(seed, "starting vine planter");

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Vine Planter",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(config, seed)?))),
    )
}
