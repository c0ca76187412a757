//! Load sessions running on the tokio runtime.
//!
//! The loader runs as a spawned task and relays every batch over a crossbeam
//! channel, so a render loop can drain results without awaiting anything.

use crate::{
    data::records::GeographicPoint,
    streaming::loader::{CancellationFlag, PageFetcher, SessionId, StreamSummary, StreamingLoader},
};
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use log::debug;
use tokio::task::JoinHandle;

/// Message relayed from a background load
#[derive(Debug, Clone)]
pub enum LoadMessage {
    Batch {
        session: SessionId,
        points: Vec<GeographicPoint>,
        summary: StreamSummary,
    },
    Finished(StreamSummary),
}

impl LoadMessage {
    pub fn session(&self) -> SessionId {
        match self {
            LoadMessage::Batch { session, .. } => *session,
            LoadMessage::Finished(summary) => summary.session,
        }
    }
}

/// Handle to a load running in the background
#[derive(Debug)]
pub struct BackgroundLoad {
    session: SessionId,
    cancel: CancellationFlag,
    receiver: Receiver<LoadMessage>,
    handle: JoinHandle<()>,
}

impl BackgroundLoad {
    /// Spawns the load on the current tokio runtime.
    pub fn spawn<F>(fetcher: F, session: SessionId, cancel: CancellationFlag) -> Self
    where
        F: PageFetcher + 'static,
    {
        let (sender, receiver) = unbounded();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let loader = StreamingLoader::new(fetcher).with_session(session);
            let state = loader
                .load_all(&task_cancel, |batch, state| {
                    // A dropped receiver just means nobody is listening anymore
                    let _ = sender.send(LoadMessage::Batch {
                        session,
                        points: batch.to_vec(),
                        summary: state.summary(),
                    });
                })
                .await;
            let _ = sender.send(LoadMessage::Finished(state.summary()));
            debug!("background load {} exited", session.value());
        });

        Self {
            session,
            cancel,
            receiver,
            handle,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Stops further page requests; an in-flight page is discarded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn try_recv(&self) -> Option<LoadMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All messages received so far, without blocking
    pub fn drain(&self) -> Vec<LoadMessage> {
        self.receiver.try_iter().collect()
    }

    pub fn receiver(&self) -> &Receiver<LoadMessage> {
        &self.receiver
    }

    /// True once the task has exited; queued messages may still be pending
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to exit
    pub async fn join(self) -> Receiver<LoadMessage> {
        if let Err(e) = self.handle.await {
            log::error!("background load {} panicked: {e}", self.session.value());
        }
        self.receiver
    }
}
