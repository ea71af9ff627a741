use tokio::sync::mpsc;

/// Create a connected stop handle / signal pair.
///
/// The handle side can be cloned freely (the registry keeps one); the signal side belongs to
/// the task supervising the process.
pub fn stop_pair() -> (StopHandle, StopSignal) {
    let (tx, rx) = mpsc::channel(1);
    (StopHandle { tx }, StopSignal { rx })
}

/// Sending half of a single-slot, deliver-at-most-once stop signal.
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: mpsc::Sender<()>,
}

impl StopHandle {
    /// Request a stop.
    ///
    /// Returns `true` only for the first request that reaches a live supervisor. Repeated
    /// requests, and requests after the supervisor has gone, return `false`.
    pub fn signal(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half owned by the supervisor.
#[derive(Debug)]
pub struct StopSignal {
    rx: mpsc::Receiver<()>,
}

impl StopSignal {
    /// Resolve once a stop has been requested.
    ///
    /// Cancel safe. After it resolves the signal is closed, so later requests are refused. If
    /// every handle is dropped without signalling, this never resolves.
    pub async fn wait(&mut self) {
        match self.rx.recv().await {
            Some(()) => self.rx.close(),
            None => std::future::pending::<()>().await,
        }
    }

    /// Refuse further requests. Returns `true` if one was already pending.
    pub fn close(&mut self) -> bool {
        self.rx.close();
        self.rx.try_recv().is_ok()
    }
}
