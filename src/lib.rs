pub mod auto_update;
mod terminal_host;

use auto_update::{ensure_config_exists, load_config};
use terminal_host::{TerminalPrompt, TerminalWindow};

/// Version of this shell, used when the host does not report the app's own
pub const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the headless shell: check for an update, then wait for the user to
/// "close the window" (press Enter) and offer the staged installer
pub fn run(history_url: Option<String>, current_version: Option<String>) -> std::io::Result<()> {
    let config = load_config();

    let Some(history_url) = history_url.or(config.history_url) else {
        match ensure_config_exists() {
            Ok(path) => log::warn!(
                "No release history URL given; set history_url in {}",
                path.display()
            ),
            Err(e) => log::warn!("No release history URL given: {}", e),
        }
        return Ok(());
    };
    let current_version = current_version.unwrap_or_else(|| SHELL_VERSION.to_string());

    log::info!("Shell version: {}", SHELL_VERSION);
    log::info!("App version: {}", current_version);

    let window = TerminalWindow::default();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(auto_update::run_updater(&window, &current_version, &history_url));

    if window.has_close_handler() {
        println!("An update is ready. Press Enter to close the window.");
        window.wait_for_close()?;
        window.close(&TerminalPrompt);
    }

    Ok(())
}
