//! PWA wrapper update host
//!
//! Runs the staged self-update engine without a GUI:
//!   pwa-wrapper-updater [HISTORY_URL] [CURRENT_VERSION]
//!
//! The history URL falls back to `history_url` in
//! ~/.pwa-wrapper/update_config.json, the version to the shell's own.

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let mut args = std::env::args().skip(1);
    let history_url = args.next();
    let current_version = args.next();

    if let Err(e) = pwa_wrapper_lib::run(history_url, current_version) {
        log::error!("Update host failed: {}", e);
        std::process::exit(1);
    }
}
