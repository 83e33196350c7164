use super::handle::OverlayHandle;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// How long the key reader waits before checking whether anyone still listens
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Commands bound to keys in the overlay's terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Refresh,
    Quit,
}

impl InputCommand {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(InputCommand::Quit)
            }
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::F(5) => Some(InputCommand::Refresh),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputCommand::Quit),
            _ => None,
        }
    }
}

/// Read key events on a blocking thread and forward the bound ones.
///
/// Stops once the receiving side of `command_tx` is gone.
pub fn spawn_key_reader(command_tx: mpsc::Sender<InputCommand>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !command_tx.is_closed() {
            match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!("Failed to poll terminal events: {}", e);
                    break;
                }
            }

            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(command) = InputCommand::from_key(&key) {
                        if command_tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read terminal event: {}", e);
                    break;
                }
            }
        }
    })
}

/// Act on commands until `Quit` or until the key reader stops
pub async fn read_commands(
    mut command_rx: mpsc::Receiver<InputCommand>,
    handle: OverlayHandle,
    quit_tx: oneshot::Sender<()>,
) {
    while let Some(command) = command_rx.recv().await {
        match command {
            InputCommand::Refresh => {
                info!("Manual refresh requested");
                if let Err(e) = handle.manual_refresh().await {
                    error!("Manual refresh failed: {}", e);
                }
            }
            InputCommand::Quit => {
                let _ = quit_tx.send(());
                return;
            }
        }
    }

    info!("Input closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(InputCommand::from_key(&key(KeyCode::Char('r'))), Some(InputCommand::Refresh));
        assert_eq!(InputCommand::from_key(&key(KeyCode::F(5))), Some(InputCommand::Refresh));
        assert_eq!(InputCommand::from_key(&key(KeyCode::Char('q'))), Some(InputCommand::Quit));
        assert_eq!(InputCommand::from_key(&key(KeyCode::Esc)), Some(InputCommand::Quit));
        assert_eq!(InputCommand::from_key(&key(KeyCode::Char('x'))), None);
        assert_eq!(InputCommand::from_key(&key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(InputCommand::from_key(&ctrl_c), Some(InputCommand::Quit));
        assert_eq!(InputCommand::from_key(&key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('r'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(InputCommand::from_key(&release), None);
    }
}
