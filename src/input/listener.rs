//! Line-oriented input listener
//!
//! Reads commands such as `hold start` or `a c` from a reader (stdin by
//! default) on a dedicated thread and publishes them into the `InputHub`.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use super::gesture::{Edge, Gesture, GestureEvent};
use super::hub::InputHub;
use crate::lifecycle::ShutdownHandle;

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Gesture(GestureEvent),
    Quit,
}

/// Errors that can occur in the input listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("input listener is already running")]
    AlreadyRunning,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("unrecognised input: {0:?}")]
    Parse(String),
}

/// Parse one line of input. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ListenerError> {
    let mut words = line.split_whitespace().map(str::to_ascii_lowercase);
    let Some(first) = words.next() else {
        return Ok(None);
    };

    if matches!(first.as_str(), "q" | "quit" | "exit") {
        return Ok(Some(Command::Quit));
    }

    let gesture = match first.as_str() {
        "h" | "hold" => Gesture::Hold,
        "a" | "action" => Gesture::Action,
        _ => return Err(ListenerError::Parse(line.trim().to_string())),
    };
    let edge = match words.next().as_deref() {
        Some("s" | "start") => Edge::Start,
        Some("p" | "perform") => Edge::Perform,
        Some("c" | "cancel") => Edge::Cancel,
        _ => return Err(ListenerError::Parse(line.trim().to_string())),
    };

    Ok(Some(Command::Gesture(GestureEvent::new(gesture, edge))))
}

/// Listens for input lines and forwards them as gesture events
pub struct InputListener {
    hub: InputHub,
    shutdown: ShutdownHandle,
    running: Arc<AtomicBool>,
}

impl InputListener {
    pub fn new(hub: InputHub, shutdown: ShutdownHandle) -> Self {
        Self {
            hub,
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start listening on stdin.
    ///
    /// The blocking read loop runs on its own thread and exits on EOF, on a
    /// `quit` command, or on the first line after `stop()` is called.
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        let hub = self.hub.clone();
        let shutdown = self.shutdown.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("input-listener".to_string())
            .spawn(move || {
                info!("input listener thread started");
                let stdin = std::io::stdin();
                read_commands(stdin.lock(), &hub, &shutdown, &running);
                running.store(false, Ordering::SeqCst);
                info!("input listener thread stopped");
            })
            .map_err(|e| ListenerError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Drain `reader` line by line until EOF, quit, shutdown, or `running` is cleared
fn read_commands<R: BufRead>(
    reader: R,
    hub: &InputHub,
    shutdown: &ShutdownHandle,
    running: &AtomicBool,
) {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) || shutdown.is_triggered() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(?e, "failed to read input");
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(Command::Gesture(event))) => {
                debug!(gesture = %event.gesture, edge = ?event.edge, "input received");
                hub.publish(event);
            }
            Ok(Some(Command::Quit)) => {
                info!("quit requested from input");
                shutdown.trigger();
                break;
            }
            Ok(None) => {}
            Err(e) => warn!(%e, "ignoring input line"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ShutdownSignal;

    #[test]
    fn test_parse_long_and_short_forms() {
        assert_eq!(
            parse_command("hold start").unwrap(),
            Some(Command::Gesture(GestureEvent::new(Gesture::Hold, Edge::Start)))
        );
        assert_eq!(
            parse_command("  A  C ").unwrap(),
            Some(Command::Gesture(GestureEvent::new(Gesture::Action, Edge::Cancel)))
        );
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_command("jump"), Err(ListenerError::Parse(_))));
        assert!(matches!(parse_command("hold"), Err(ListenerError::Parse(_))));
        assert!(matches!(parse_command("hold sideways"), Err(ListenerError::Parse(_))));
    }

    #[test]
    fn test_read_commands_stops_after_shutdown() {
        let hub = InputHub::new();
        let mut rx = hub.subscribe();
        let signal = ShutdownSignal::new();
        signal.handle().trigger();
        let running = AtomicBool::new(true);

        read_commands("hold start\n".as_bytes(), &hub, &signal.handle(), &running);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_read_commands_stops_when_listener_stopped() {
        let hub = InputHub::new();
        let mut rx = hub.subscribe();
        let signal = ShutdownSignal::new();
        let running = AtomicBool::new(false);

        read_commands("action start\n".as_bytes(), &hub, &signal.handle(), &running);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_read_commands_publishes_until_quit() {
        let hub = InputHub::new();
        let mut rx = hub.subscribe();
        let signal = ShutdownSignal::new();
        let running = AtomicBool::new(true);

        let input = "hold start\nbogus\naction p\nquit\nhold cancel\n";
        read_commands(input.as_bytes(), &hub, &signal.handle(), &running);

        assert_eq!(
            rx.try_recv().unwrap(),
            GestureEvent::new(Gesture::Hold, Edge::Start)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            GestureEvent::new(Gesture::Action, Edge::Perform)
        );
        assert!(rx.try_recv().is_err());
        assert!(signal.handle().is_triggered());
    }
}
