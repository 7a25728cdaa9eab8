/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Advisory handler layer.
//!
//! One short, reentrant handler per [`AdvisoryKind`]. Handlers only decode the
//! payload they need, build the label tuple and increment. A handler error is
//! per-message: the dispatcher logs it and keeps going.
//!
//! ```
//! use nats_surveyor::handlers::AdvisoryDispatcher;
//! use nats_surveyor::metrics::JetStreamMetrics;
//! use nats_surveyor::routing::AdvisoryKind;
//! use nats_surveyor::transport::AdvisoryMessage;
//! use prometheus::Registry;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(JetStreamMetrics::register(&Registry::new()).unwrap());
//! let dispatcher = AdvisoryDispatcher::new("global", metrics);
//!
//! let message = AdvisoryMessage::new(
//!     "$JS.EVENT.ADVISORY.CONSUMER.MAX_DELIVERIES.SURVEYOR.OUT",
//!     Vec::new(),
//! );
//! assert_eq!(dispatcher.dispatch(&message).unwrap(), AdvisoryKind::DeliveryExceeded);
//! ```

mod dispatch;
pub mod payloads;

pub use dispatch::AdvisoryDispatcher;

use crate::metrics::labels::{ApiAuditLabels, ConsumerLabels};
use crate::metrics::JetStreamMetrics;
use crate::observability::events;
use crate::routing::{AdvisoryKind, RoutedSubject};
use payloads::{ApiAuditAdvisory, ConsumerAckMetric};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use tracing::debug;

const COMPONENT: &str = "handlers";

/// Per-message handler failure. Never escapes the dispatcher.
pub enum HandlerError {
    Decode {
        kind: AdvisoryKind,
        source: serde_json::Error,
    },
    MissingComponents {
        kind: AdvisoryKind,
    },
    MissingField {
        kind: AdvisoryKind,
        field: &'static str,
    },
}

impl Debug for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Decode { kind, source } => write!(f, "Decode({kind:?}, {source:?})"),
            HandlerError::MissingComponents { kind } => write!(f, "MissingComponents({kind:?})"),
            HandlerError::MissingField { kind, field } => {
                write!(f, "MissingField({kind:?}, {field:?})")
            }
        }
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Decode { kind, source } => {
                write!(f, "unable to decode {kind:?} advisory: {source}")
            }
            HandlerError::MissingComponents { kind } => {
                write!(f, "{kind:?} subject is missing stream or consumer")
            }
            HandlerError::MissingField { kind, field } => {
                write!(f, "{kind:?} advisory has no {field}")
            }
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandlerError::Decode { source, .. } => Some(source),
            HandlerError::MissingComponents { .. } | HandlerError::MissingField { .. } => None,
        }
    }
}

fn consumer_labels<'a>(
    kind: AdvisoryKind,
    account: &'a str,
    routed: &RoutedSubject<'a>,
) -> Result<ConsumerLabels<'a>, HandlerError> {
    ConsumerLabels::from_routed(account, routed).ok_or(HandlerError::MissingComponents { kind })
}

/// Subject-derived; the payload is not consulted.
pub fn handle_delivery_exceeded(
    metrics: &JetStreamMetrics,
    account: &str,
    routed: &RoutedSubject<'_>,
) -> Result<(), HandlerError> {
    let labels = consumer_labels(AdvisoryKind::DeliveryExceeded, account, routed)?;
    metrics.inc_delivery_exceeded(&labels);
    Ok(())
}

/// Counts one audit record per message whatever the audited call's outcome.
/// Records without a server or an audited subject are rejected.
pub fn handle_api_audit(
    metrics: &JetStreamMetrics,
    account: &str,
    payload: &[u8],
) -> Result<(), HandlerError> {
    let audit: ApiAuditAdvisory =
        serde_json::from_slice(payload).map_err(|source| HandlerError::Decode {
            kind: AdvisoryKind::ApiAudit,
            source,
        })?;

    for (field, value) in [("server", &audit.server), ("subject", &audit.subject)] {
        if value.is_empty() {
            return Err(HandlerError::MissingField {
                kind: AdvisoryKind::ApiAudit,
                field,
            });
        }
    }

    if let Some(error) = audit.response_error() {
        debug!(
            event = events::API_AUDIT_ERROR_RESPONSE,
            component = COMPONENT,
            account,
            server = %audit.server,
            api_subject = %audit.subject,
            code = error.code,
            description = %error.description,
            "audited API call returned an error"
        );
    }

    metrics.inc_api_audit(&ApiAuditLabels::new(account, &audit.server, &audit.subject));
    Ok(())
}

/// Counts one acknowledgement per message. The payload is optional: when it
/// decodes, its ack delay feeds the duration histogram.
pub fn handle_ack_sample(
    metrics: &JetStreamMetrics,
    account: &str,
    routed: &RoutedSubject<'_>,
    payload: &[u8],
) -> Result<(), HandlerError> {
    let labels = consumer_labels(AdvisoryKind::AckLatencySample, account, routed)?;
    metrics.inc_ack_deliveries(&labels);

    match serde_json::from_slice::<ConsumerAckMetric>(payload) {
        Ok(sample) => {
            if let Some(seconds) = sample.ack_seconds() {
                metrics.observe_ack_duration(&labels, seconds);
            }
        }
        Err(err) => {
            debug!(
                event = events::ACK_SAMPLE_UNDECODED,
                component = COMPONENT,
                account,
                stream = labels.stream,
                consumer = labels.consumer,
                err = %err,
                "ack sample counted without duration"
            );
        }
    }

    Ok(())
}
