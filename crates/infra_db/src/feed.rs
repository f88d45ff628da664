//! Change feed over PostgreSQL LISTEN/NOTIFY
//!
//! A trigger on `documents` announces `{collection, id, op}` on the
//! `document_changes` channel. Each subscription runs one listener task that
//! filters notifications for its collection, fetches the current body of
//! upserted documents, and forwards them as change batches.
//!
//! Notifications are not queued while the listener connection is down. When
//! the connection drops the task opens a new listener straight away and
//! delivers a fresh snapshot, without waiting for the next notification.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use domain_claims::ports::{ChangeBatch, DocumentChange, ListQuery, Subscription};
use domain_claims::status::Collection;

use crate::error::DatabaseError;
use crate::repositories::DocumentRepository;

/// Channel the `documents` trigger notifies on
pub const CHANGE_CHANNEL: &str = "document_changes";

const RESYNC_INITIAL_DELAY: Duration = Duration::from_millis(200);
const RESYNC_MAX_DELAY: Duration = Duration::from_secs(10);

/// Payload of one notification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeNotice {
    pub collection: String,
    pub id: String,
    pub op: ChangeOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Upsert,
    Delete,
}

impl ChangeNotice {
    pub fn parse(payload: &str) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn concerns(&self, collection: Collection) -> bool {
        self.collection == collection.as_str()
    }
}

/// Opens a subscription to one collection
///
/// Listening starts before the snapshot is read, so no change committed after
/// the snapshot can be missed.
pub(crate) async fn subscribe<T>(
    repository: DocumentRepository,
    collection: Collection,
) -> Result<Subscription<T>, DatabaseError>
where
    T: DeserializeOwned + Send + 'static,
{
    let listener = listen(&repository).await?;
    let snapshot = load_snapshot::<T>(&repository, collection).await?;
    let (tx, rx) = mpsc::unbounded_channel();
    // The receiver is still held here
    let _ = tx.send(ChangeBatch::Snapshot(snapshot));

    let pump = tokio::spawn(forward(listener, repository, collection, tx));
    info!(collection = %collection, "Change feed subscribed");

    Ok(Subscription::with_pump(rx, pump.abort_handle()))
}

async fn listen(repository: &DocumentRepository) -> Result<PgListener, DatabaseError> {
    let mut listener = PgListener::connect_with(repository.pool())
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
    listener.listen(CHANGE_CHANNEL).await?;
    Ok(listener)
}

async fn load_snapshot<T: DeserializeOwned>(
    repository: &DocumentRepository,
    collection: Collection,
) -> Result<Vec<T>, DatabaseError> {
    repository
        .list(collection, &ListQuery::default())
        .await?
        .into_iter()
        .map(|body| serde_json::from_value(body).map_err(DatabaseError::from))
        .collect()
}

async fn forward<T>(
    mut listener: PgListener,
    repository: DocumentRepository,
    collection: Collection,
    tx: mpsc::UnboundedSender<ChangeBatch<T>>,
) where
    T: DeserializeOwned + Send + 'static,
{
    while !tx.is_closed() {
        let notification = match listener.try_recv().await {
            Ok(Some(notification)) => notification,
            lost => {
                match lost {
                    Err(e) => warn!(collection = %collection, error = %e, "Change feed failed, resyncing"),
                    _ => warn!(collection = %collection, "Change feed connection lost, resyncing"),
                }
                match resync(&repository, collection, &tx).await {
                    Some(fresh) => {
                        listener = fresh;
                        continue;
                    }
                    None => break,
                }
            }
        };

        let notice = match ChangeNotice::parse(notification.payload()) {
            Ok(notice) if notice.concerns(collection) => notice,
            Ok(_) => continue,
            Err(e) => {
                warn!(payload = notification.payload(), error = %e, "Malformed change notice");
                continue;
            }
        };

        let change = match resolve(&repository, collection, notice).await {
            Ok(change) => change,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Failed to load changed document");
                continue;
            }
        };

        debug!(collection = %collection, "Forwarding document change");
        if tx.send(ChangeBatch::Changes(vec![change])).is_err() {
            break;
        }
    }

    info!(collection = %collection, "Change feed closed");
}

/// Opens a new listener and sends a fresh snapshot, retrying with backoff
///
/// Listening resumes before the snapshot is read, as in [`subscribe`].
/// Returns `None` once the subscriber is gone.
async fn resync<T: DeserializeOwned>(
    repository: &DocumentRepository,
    collection: Collection,
    tx: &mpsc::UnboundedSender<ChangeBatch<T>>,
) -> Option<PgListener> {
    let mut delay = RESYNC_INITIAL_DELAY;

    while !tx.is_closed() {
        let attempt = async {
            let listener = listen(repository).await?;
            let snapshot = load_snapshot::<T>(repository, collection).await?;
            Ok::<_, DatabaseError>((listener, snapshot))
        };

        match attempt.await {
            Ok((listener, snapshot)) => {
                info!(collection = %collection, documents = snapshot.len(), "Change feed resynced");
                return tx.send(ChangeBatch::Snapshot(snapshot)).is_ok().then_some(listener);
            }
            Err(e) => {
                warn!(
                    collection = %collection,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Change feed resync failed"
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }

    None
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(RESYNC_MAX_DELAY)
}

/// Turns a notice into a change carrying the document's current body
///
/// An upsert whose document is already gone is delivered as a removal.
async fn resolve<T: DeserializeOwned>(
    repository: &DocumentRepository,
    collection: Collection,
    notice: ChangeNotice,
) -> Result<DocumentChange<T>, DatabaseError> {
    if notice.op == ChangeOp::Delete {
        return Ok(DocumentChange::Removed(notice.id));
    }
    match repository.fetch(collection, &notice.id).await? {
        Some(body) => Ok(DocumentChange::Upsert(serde_json::from_value(body)?)),
        None => Ok(DocumentChange::Removed(notice.id)),
    }
}
