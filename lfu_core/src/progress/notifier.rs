use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::observer::UploadObserver;
use super::snapshot::ProgressInfo;
use crate::types::types::ProgressEvent;

/// Consumes `ProgressEvent`s from the body stream, turns them into
/// `ProgressInfo` snapshots and fans them out to every observer.
///
/// Runs until all senders are dropped or `finished` fires. The HTTP client may
/// hold on to the request body after the response arrives, so `finished` is
/// how the uploader says "no more events"; whatever is still buffered is
/// delivered before `run` returns.
pub struct ProgressNotifier {
    observers: Vec<Arc<dyn UploadObserver>>,
    start_time: Instant,
    last_loaded: Option<u64>,
}

impl ProgressNotifier {
    pub fn new(observers: Vec<Arc<dyn UploadObserver>>, start_time: Instant) -> Self {
        Self {
            observers,
            start_time,
            last_loaded: None,
        }
    }

    pub async fn run(
        mut self,
        mut progress_rx: mpsc::UnboundedReceiver<ProgressEvent>,
        finished: CancellationToken,
    ) {
        loop {
            tokio::select! {
                msg = progress_rx.recv() => match msg {
                    Some(ev) => self.dispatch(ev).await,
                    None => return,
                },
                _ = finished.cancelled() => break,
            }
        }

        progress_rx.close();
        while let Some(ev) = progress_rx.recv().await {
            self.dispatch(ev).await;
        }
    }

    async fn dispatch(&mut self, ev: ProgressEvent) {
        if let Some(info) = self.handle_event(ev) {
            for observer in &self.observers {
                observer.on_progress(&info).await;
            }
        }
    }

    /// Returns `None` when the event carries nothing worth reporting: an
    /// unknown or empty body, or no change since the previous event.
    fn handle_event(&mut self, ev: ProgressEvent) -> Option<ProgressInfo> {
        let total = ev.total.filter(|&t| t > 0)?;
        if self.last_loaded == Some(ev.loaded) {
            return None;
        }
        self.last_loaded = Some(ev.loaded);
        Some(ProgressInfo::compute(
            ev.loaded,
            total,
            self.start_time.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_total_is_skipped() {
        let mut n = ProgressNotifier::new(Vec::new(), Instant::now());
        assert!(n
            .handle_event(ProgressEvent { loaded: 10, total: None })
            .is_none());
        assert!(n
            .handle_event(ProgressEvent { loaded: 0, total: Some(0) })
            .is_none());
    }

    #[test]
    fn repeated_loaded_is_reported_once() {
        let mut n = ProgressNotifier::new(Vec::new(), Instant::now());
        let ev = ProgressEvent { loaded: 500, total: Some(1000) };
        let info = n.handle_event(ev).unwrap();
        assert_eq!(info.percent, 50);
        assert!(n.handle_event(ev).is_none());
    }
}
