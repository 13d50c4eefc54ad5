use std::sync::Arc;

use tracing::{debug, error};

use riverlog_db::Database;
use riverlog_gateway::EventBus;
use riverlog_types::events::MutationKind;

use crate::error::{ApiError, ApiResult};
use crate::mail::Mailer;
use crate::objects::{Change, TopicRecord};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub bus: EventBus<Change>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppStateInner {
    /// Run a store call on the blocking pool.
    pub async fn store<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Store(e.into())
            })?
            .map_err(|e| {
                error!("DB error: {:#}", e);
                ApiError::Store(e)
            })
    }

    /// Announce a committed change on the record's topic.
    pub async fn publish<T: TopicRecord>(&self, mutation: MutationKind, data: T) {
        let reached = self
            .bus
            .publish(
                T::TOPIC,
                Change {
                    mutation,
                    record: data.into_record(),
                },
            )
            .await;
        debug!("{:?} on {} reached {} subscribers", mutation, T::TOPIC, reached);
    }
}
