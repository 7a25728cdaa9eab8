//! Subscription set owned by a running listener, with rollback on partial setup.

use crate::listener::ListenerError;
use crate::observability::events;
use crate::transport::{AdvisoryHandler, AdvisoryTransport};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "subscriptions";

pub(crate) struct SubscriptionSet {
    transport: Arc<dyn AdvisoryTransport>,
    handler: Arc<dyn AdvisoryHandler>,
    subjects: Vec<String>,
}

impl SubscriptionSet {
    pub(crate) fn new(
        transport: Arc<dyn AdvisoryTransport>,
        handler: Arc<dyn AdvisoryHandler>,
    ) -> Self {
        Self {
            transport,
            handler,
            subjects: Vec::new(),
        }
    }

    /// Subscribes the handler to every subject in order. If any subscription
    /// is refused, the ones already made are torn down before the error
    /// returns.
    ///
    /// Each subject is recorded before its subscribe is awaited, so a caller
    /// that drops this future midway still finds every possibly-live
    /// subscription in the set and can release it with
    /// [`SubscriptionSet::unsubscribe_all`].
    pub(crate) async fn subscribe_all(
        &mut self,
        subjects: &[&str],
        account: &str,
    ) -> Result<(), ListenerError> {
        self.subjects.reserve(subjects.len());

        for subject in subjects {
            self.subjects.push(subject.to_string());

            if let Err(status) = self
                .transport
                .subscribe(subject, self.handler.clone())
                .await
            {
                warn!(
                    event = events::SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    account,
                    subject,
                    err = %status,
                    "unable to subscribe, rolling back"
                );
                // refused, so nothing to release for this one
                self.subjects.pop();
                self.unsubscribe_all(account).await;
                return Err(ListenerError::Subscribe {
                    subject: subject.to_string(),
                    status,
                });
            }

            debug!(
                event = events::SUBSCRIBE_OK,
                component = COMPONENT,
                account,
                subject,
                "subscribed"
            );
        }

        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub(crate) fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Best effort: failures are logged and the remaining subjects still get
    /// unsubscribed.
    pub(crate) async fn unsubscribe_all(&mut self, account: &str) {
        for subject in self.subjects.drain(..) {
            match self
                .transport
                .unsubscribe(&subject, self.handler.clone())
                .await
            {
                Ok(()) => debug!(
                    event = events::UNSUBSCRIBE_OK,
                    component = COMPONENT,
                    account,
                    subject = %subject,
                    "unsubscribed"
                ),
                Err(status) => warn!(
                    event = events::UNSUBSCRIBE_FAILED,
                    component = COMPONENT,
                    account,
                    subject = %subject,
                    err = %status,
                    "unable to unsubscribe"
                ),
            }
        }
    }
}
