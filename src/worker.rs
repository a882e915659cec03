//! Runs blocking service calls off the UI thread.

use flume::Receiver;
use log::error;

/// How a request job is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Spawn a named worker thread per request.
    #[default]
    Background,
    /// Run the job on the calling thread. The result is still delivered
    /// through the channel, so completion handling is identical.
    Inline,
}

/// Starts `job` and returns the channel its single result arrives on.
///
/// If the worker thread cannot be spawned the sender is dropped with the
/// job, and the receiver reports a disconnect.
pub fn run<T, F>(dispatch: Dispatch, name: &str, job: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = flume::bounded(1);
    let task = move || {
        let _ = tx.send(job());
    };

    match dispatch {
        Dispatch::Inline => task(),
        Dispatch::Background => {
            if let Err(e) = std::thread::Builder::new()
                .name(name.to_string())
                .spawn(task)
            {
                error!("Failed to spawn {name} worker: {e}");
            }
        }
    }

    rx
}
