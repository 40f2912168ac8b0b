// Terminal host for the update engine
// Stands in for the GUI window: closing is pressing Enter, the dialog is a
// y/n question on stdin

use std::io::{BufRead, Write};
use std::sync::Mutex;

use crate::auto_update::{CloseHandler, HostWindow, InstallNotice, UpdatePrompt};

#[derive(Default)]
pub struct TerminalWindow {
    close_handler: Mutex<Option<CloseHandler>>,
}

impl TerminalWindow {
    pub fn has_close_handler(&self) -> bool {
        self.close_handler
            .lock()
            .map(|handler| handler.is_some())
            .unwrap_or(false)
    }

    /// Block until the user presses Enter
    pub fn wait_for_close(&self) -> std::io::Result<()> {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }

    /// Fire the close event once
    pub fn close(&self, prompt: &dyn UpdatePrompt) {
        let handler = match self.close_handler.lock() {
            Ok(mut handler) => handler.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handler) = handler {
            handler(prompt);
        }
    }
}

impl HostWindow for TerminalWindow {
    fn on_close(&self, handler: CloseHandler) {
        match self.close_handler.lock() {
            Ok(mut slot) => *slot = Some(handler),
            Err(poisoned) => *poisoned.into_inner() = Some(handler),
        }
    }
}

/// Asks on stdin; anything but "n"/"no"/"cancel" accepts
pub struct TerminalPrompt;

impl UpdatePrompt for TerminalPrompt {
    fn confirm_install(&self, notice: &InstallNotice) -> bool {
        println!("{}", notice.title);
        println!("{}", notice.detail);
        print!("[{}] ", notice.buttons.join("/"));
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_accept(&answer)
    }
}

fn is_accept(answer: &str) -> bool {
    !matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "n" | "no" | "cancel"
    )
}
