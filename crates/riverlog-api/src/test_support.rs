use std::sync::Arc;

use tokio::sync::mpsc;

use riverlog_db::Database;
use riverlog_gateway::EventBus;

use crate::auth::Identity;
use crate::mail::{Mailer, OutgoingMail};
use crate::state::{AppState, AppStateInner};

pub const SECRET: &str = "test-secret";

/// Records outgoing mail instead of sending it.
struct ChannelMailer(mpsc::UnboundedSender<OutgoingMail>);

impl Mailer for ChannelMailer {
    fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        self.0.send(mail.clone())?;
        Ok(())
    }
}

/// Fresh in-memory state plus the receiving end of its mailer.
pub fn state() -> (AppState, mpsc::UnboundedReceiver<OutgoingMail>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(AppStateInner {
        db: Arc::new(Database::open_in_memory().unwrap()),
        jwt_secret: SECRET.to_string(),
        bus: EventBus::new(),
        mailer: Arc::new(ChannelMailer(tx)),
    });
    (state, rx)
}

/// Insert a user straight into the store, skipping password hashing.
pub fn angler(state: &AppStateInner, email: &str) -> Identity {
    let row = state.db.create_user("Test Angler", email, "not-a-real-hash").unwrap();
    Identity { user_id: row.id }
}
