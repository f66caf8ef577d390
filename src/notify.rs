//! Post-login notification-address updates — fire-and-forget.
//!
//! Login never waits on (or fails because of) this write; failures are
//! logged and dropped.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::account::model::Account;
use crate::store::AccountStore;

/// Updates an account's notification address off the login path.
#[derive(Clone)]
pub struct NotificationAddressUpdater {
    store: Arc<dyn AccountStore>,
}

impl NotificationAddressUpdater {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Persist `address` for the account on a detached task.
    pub fn update_detached(&self, account: &Account, address: String) {
        if account.notification_address.as_deref() == Some(address.as_str()) {
            return;
        }
        let store = Arc::clone(&self.store);
        let mut account = account.clone();
        tokio::spawn(async move {
            account.notification_address = Some(address);
            account.updated_at = Utc::now();
            match store.update_account(&account).await {
                Ok(()) => debug!(account_id = %account.id, "Notification address updated"),
                Err(e) => warn!(
                    account_id = %account.id,
                    error = %e,
                    "Failed to update notification address"
                ),
            }
        });
    }
}
