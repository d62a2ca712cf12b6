//! Background thread that turns "no put for `lull_time`" into a wake-up for
//! blocked batch consumers.

use super::blocking::Shared;
use crate::error::{QueueError, Result};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Handle to a running announcer thread; [`stop`](Announcer::stop) joins it.
pub(crate) struct Announcer {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Announcer {
    pub(crate) fn spawn<T: Send + 'static>(shared: Arc<Shared<T>>, tick: Duration) -> Result<Self> {
        let (stop, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(format!("{}-announcer", shared.name()))
            .spawn(move || {
                debug!(
                    queue = %shared.name(),
                    tick_ms = tick.as_millis() as u64,
                    "Lull announcer started"
                );
                // The receive timeout doubles as the tick sleep.
                loop {
                    match stop_rx.recv_timeout(tick) {
                        Err(RecvTimeoutError::Timeout) => shared.announce(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!(queue = %shared.name(), "Lull announcer exiting");
            })
            .map_err(|e| QueueError::Spawn(e.to_string()))?;

        Ok(Self { stop, handle })
    }

    /// Signal the thread and wait for it to exit
    pub(crate) fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("Lull announcer thread panicked before shutdown");
        }
    }
}
