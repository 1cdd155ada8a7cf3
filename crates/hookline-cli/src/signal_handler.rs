use futures::stream::StreamExt;
use signal_hook::consts::SIGINT;
use signal_hook_tokio::{Handle, Signals};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Signal handler routing Ctrl+C to a cancellation token
pub struct SignalHandler {
    cancel: CancellationToken,
    /// Handle used to close the signal stream
    signals_handle: Option<Handle>,
    /// Handle to the signal handling task
    task_handle: Option<JoinHandle<()>>,
}

impl SignalHandler {
    /// Create a new signal handler for the given token
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            signals_handle: None,
            task_handle: None,
        }
    }

    /// Start signal handling
    pub fn start(&mut self) -> std::io::Result<()> {
        if self.task_handle.is_some() {
            return Ok(()); // Already started
        }

        let mut signals = Signals::new([SIGINT])?;
        self.signals_handle = Some(signals.handle());
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                if signal != SIGINT {
                    continue;
                }
                if cancel.is_cancelled() {
                    eprintln!("\nInterrupted twice, exiting");
                    std::process::exit(130);
                }
                eprintln!("\n🛑 Interrupting hooks... (Ctrl+C)");
                eprintln!("   The running hook is stopped, no further hooks start.");
                cancel.cancel();
            }
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop signal handling
    pub fn stop(&mut self) {
        if let Some(handle) = self.signals_handle.take() {
            handle.close();
        }
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
