//! Terminal implementations of the alert collaborators.

use std::io::{self, IsTerminal, Write};

use tock_core::{AlertError, AudioPlayer, Notifier, Sound};

/// Rings the terminal bell. Louder sounds ring more than once.
#[derive(Debug, Clone, Copy)]
pub struct TerminalBell {
    enabled: bool,
}

impl TerminalBell {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl AudioPlayer for TerminalBell {
    fn play(&self, sound: Sound) -> Result<(), AlertError> {
        if !self.enabled {
            return Ok(());
        }
        let rings = match sound {
            Sound::Gentle | Sound::Nature => 1,
            Sound::Default => 2,
            Sound::Loud => 3,
        };
        let mut stderr = io::stderr().lock();
        stderr
            .write_all("\x07".repeat(rings).as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|err| AlertError::Audio(err.to_string()))
    }
}

/// Writes notifications as a banner on stderr and sets the terminal title.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn request_permission(&self) -> Result<bool, AlertError> {
        Ok(io::stderr().is_terminal())
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "\n*** {title} ***\n    {body}")
            .map_err(|err| AlertError::Notification(err.to_string()))
    }

    fn set_title(&self, title: &str) -> Result<(), AlertError> {
        let mut stderr = io::stderr().lock();
        if !stderr.is_terminal() {
            return Ok(());
        }
        write!(stderr, "\x1b]0;{title}\x07")
            .and_then(|()| stderr.flush())
            .map_err(|err| AlertError::Notification(err.to_string()))
    }
}
