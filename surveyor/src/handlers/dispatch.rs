//! Per-message dispatcher bound to one account.

use crate::handlers::{handle_ack_sample, handle_api_audit, handle_delivery_exceeded, HandlerError};
use crate::metrics::JetStreamMetrics;
use crate::observability::{events, fields};
use crate::routing::{classify, AdvisoryKind};
use crate::transport::{AdvisoryHandler, AdvisoryMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

const COMPONENT: &str = "dispatch";

/// Routes every inbound message to the handler for its [`AdvisoryKind`].
///
/// Holds no per-message state besides the shared metrics, so the transport may
/// invoke it from any number of tasks concurrently.
pub struct AdvisoryDispatcher {
    account: String,
    metrics: Arc<JetStreamMetrics>,
    active: AtomicBool,
}

impl AdvisoryDispatcher {
    pub fn new(account: &str, metrics: Arc<JetStreamMetrics>) -> Self {
        Self {
            account: account.to_string(),
            metrics,
            active: AtomicBool::new(true),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub(crate) fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Messages arriving after this call are dropped without touching metrics.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Classifies and handles one message, returning the kind it was routed to.
    pub fn dispatch(&self, message: &AdvisoryMessage) -> Result<AdvisoryKind, HandlerError> {
        let routed = classify(&message.subject);
        let account = self.account.as_str();

        match routed.kind {
            AdvisoryKind::DeliveryExceeded => {
                handle_delivery_exceeded(&self.metrics, account, &routed)?
            }
            AdvisoryKind::ApiAudit => handle_api_audit(&self.metrics, account, &message.payload)?,
            AdvisoryKind::AckLatencySample => {
                handle_ack_sample(&self.metrics, account, &routed, &message.payload)?
            }
            AdvisoryKind::Other => {
                trace!(
                    event = events::ADVISORY_UNRECOGNIZED,
                    component = COMPONENT,
                    account,
                    subject = %message.subject,
                    "ignoring unrecognized advisory subject"
                );
            }
        }

        Ok(routed.kind)
    }
}

#[async_trait]
impl AdvisoryHandler for AdvisoryDispatcher {
    async fn on_advisory(&self, message: AdvisoryMessage) {
        let account = self.account.as_str();

        if !self.is_active() {
            trace!(
                event = events::ADVISORY_DROP_INACTIVE,
                component = COMPONENT,
                account,
                subject = %message.subject,
                "dropping advisory delivered after stop"
            );
            return;
        }

        trace!(
            event = events::ADVISORY_RECEIVE,
            component = COMPONENT,
            account,
            subject = %message.subject,
            payload_len = message.payload.len(),
            "received advisory"
        );

        if let Err(err) = self.dispatch(&message) {
            warn!(
                event = events::ADVISORY_DECODE_FAILED,
                component = COMPONENT,
                account,
                subject = %message.subject,
                payload = %fields::format_payload_excerpt(&message.payload),
                err = %err,
                "unable to handle advisory"
            );
        }
    }
}
