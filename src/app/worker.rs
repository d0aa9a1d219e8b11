use std::sync::mpsc;
use std::time::Duration;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Runs `work` on a background thread and hands its result to `on_result` on
/// the GTK main loop.
pub(super) fn spawn_worker_action<T, W, H>(name: &str, work: W, mut on_result: H)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    H: FnMut(T) + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    let spawned = std::thread::Builder::new()
        .name(format!("gymglow-{name}"))
        .spawn(move || {
            let result = work();
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        tracing::error!(%err, worker = name, "failed to spawn worker thread");
        return;
    }

    let name = name.to_string();
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || match rx.try_recv() {
        Ok(result) => {
            on_result(result);
            gtk4::glib::ControlFlow::Break
        }
        Err(mpsc::TryRecvError::Empty) => gtk4::glib::ControlFlow::Continue,
        Err(mpsc::TryRecvError::Disconnected) => {
            tracing::warn!(worker = %name, "worker exited without a result");
            gtk4::glib::ControlFlow::Break
        }
    });
}
