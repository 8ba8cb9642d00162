//! Input Handling
//!
//! Turns terminal key presses and process signals into
//! [`DriverSignal`]s. Both run as tasks beside the frame driver and only
//! talk to it through the signal channel.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use court_core::DriverSignal;

/// Map a key press to a driver signal
///
/// `q`, `Esc` and `Ctrl-C` quit (raw mode delivers Ctrl-C as a key).
pub fn key_to_signal(key: &KeyEvent) -> Option<DriverSignal> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(DriverSignal::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(DriverSignal::Quit)
        }
        _ => None,
    }
}

/// Forward terminal key presses until one maps to a signal
pub async fn forward_keys(tx: mpsc::Sender<DriverSignal>) {
    let mut events = EventStream::new();
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Key(key)) => {
                if let Some(signal) = key_to_signal(&key) {
                    debug!(?signal, "Key mapped to driver signal");
                    let _ = tx.send(signal).await;
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Terminal event stream failed");
                return;
            }
        }
    }
}

/// Forward SIGINT as a quit request
pub async fn forward_ctrl_c(tx: mpsc::Sender<DriverSignal>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            debug!("Interrupt received");
            let _ = tx.send(DriverSignal::Quit).await;
        }
        Err(e) => warn!(error = %e, "Could not listen for Ctrl-C"),
    }
}
