//! Live board: a [`ReviewBoard`] kept current by the store's change feeds

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use core_kernel::PortError;

use crate::ports::{ChangeBatch, DocumentStore, Subscription};
use crate::projection::{DashboardView, ReviewBoard};

/// Shared handle to a board
///
/// Writers hold the lock only for the synchronous mutation; every mutation
/// publishes the new revision to watchers.
#[derive(Debug, Clone)]
pub struct SharedBoard {
    board: Arc<RwLock<ReviewBoard>>,
    revisions: Arc<watch::Sender<u64>>,
}

impl Default for SharedBoard {
    fn default() -> Self {
        Self::new(ReviewBoard::new())
    }
}

impl SharedBoard {
    pub fn new(board: ReviewBoard) -> Self {
        let (revisions, _) = watch::channel(board.revision());
        Self {
            board: Arc::new(RwLock::new(board)),
            revisions: Arc::new(revisions),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ReviewBoard> {
        self.board.read().await
    }

    /// Snapshot of the current view
    pub async fn view(&self) -> DashboardView {
        self.board.read().await.view().clone()
    }

    /// Mutates the board and publishes its new revision
    pub async fn update<F, T>(&self, mutate: F) -> T
    where
        F: FnOnce(&mut ReviewBoard) -> T,
    {
        let mut board = self.board.write().await;
        let out = mutate(&mut board);
        self.revisions.send_replace(board.revision());
        out
    }

    pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
        self.revisions.subscribe()
    }

    /// Waits until the board reaches at least `revision`
    ///
    /// # Returns
    ///
    /// `false` if the deadline passed first
    pub async fn wait_for_revision(&self, revision: u64, deadline: Duration) -> bool {
        let mut rx = self.subscribe_revisions();
        tokio::time::timeout(deadline, rx.wait_for(|current| *current >= revision))
            .await
            .map(|changed| changed.is_ok())
            .unwrap_or(false)
    }
}

/// A board attached to a store's change feeds
///
/// One pump task per collection applies deliveries in the order received.
/// Detaching (or dropping) aborts both pumps; review writes already in flight
/// are owned by the review service and are not affected.
pub struct LiveBoard {
    board: SharedBoard,
    pumps: Vec<JoinHandle<()>>,
}

impl LiveBoard {
    /// Subscribes to both collections and starts applying their deliveries
    ///
    /// # Errors
    ///
    /// Returns the store's error if either subscription fails; nothing is left
    /// running in that case.
    pub async fn attach(store: Arc<dyn DocumentStore>, board: SharedBoard) -> Result<Self, PortError> {
        let claims = store.subscribe_claims().await?;
        let analyses = store.subscribe_analyses().await?;

        let pumps = vec![
            tokio::spawn(pump(claims, board.clone(), |b, batch| b.apply_claims(batch), "claims")),
            tokio::spawn(pump(
                analyses,
                board.clone(),
                |b, batch| b.apply_analyses(batch),
                "fraud_analyses",
            )),
        ];
        info!("Live board attached to change feeds");

        Ok(Self { board, pumps })
    }

    pub fn board(&self) -> &SharedBoard {
        &self.board
    }

    /// Whether both feed pumps are still running
    pub fn is_attached(&self) -> bool {
        self.pumps.iter().all(|p| !p.is_finished())
    }

    /// Stops consuming both feeds
    pub fn detach(mut self) {
        self.abort_pumps();
        info!("Live board detached from change feeds");
    }

    fn abort_pumps(&mut self) {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

impl Drop for LiveBoard {
    fn drop(&mut self) {
        self.abort_pumps();
    }
}

async fn pump<T, F>(mut feed: Subscription<T>, board: SharedBoard, apply: F, collection: &'static str)
where
    T: Send + 'static,
    F: Fn(&mut ReviewBoard, ChangeBatch<T>) + Send + Sync + 'static,
{
    while let Some(batch) = feed.next().await {
        let size = batch.len();
        let revision = board.update(|b| {
            apply(b, batch);
            b.revision()
        })
        .await;
        debug!(collection, size, revision, "Applied change batch");
    }
    warn!(collection, "Change feed ended");
}
