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

//! Metrics layer.
//!
//! Owns the JetStream advisory counter families and their label tuples. The
//! [`prometheus::Registry`] is injected by the host so that any number of
//! listeners can share one set of families.
//!
//! ```
//! use nats_surveyor::metrics::{labels::ConsumerLabels, JetStreamMetrics};
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let metrics = JetStreamMetrics::register(&registry).unwrap();
//!
//! let labels = ConsumerLabels::new("global", "SURVEYOR", "OUT");
//! metrics.inc_delivery_exceeded(&labels);
//!
//! assert_eq!(
//!     metrics
//!         .delivery_exceeded()
//!         .with_label_values(&labels.values())
//!         .get(),
//!     1
//! );
//! ```

pub mod labels;

use labels::{ApiAuditLabels, ConsumerLabels};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::fmt::{Debug, Formatter};

pub const DELIVERY_EXCEEDED_COUNT: &str = "nats_survey_jetstream_delivery_exceeded_count";
pub const API_AUDIT: &str = "nats_survey_jetstream_api_audit";
pub const ACKNOWLEDGEMENT_DELIVERIES: &str = "nats_survey_jetstream_acknowledgement_deliveries";
pub const ACKNOWLEDGEMENT_DURATION: &str = "nats_survey_jetstream_acknowledgement_duration";

const ACK_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Counter families incremented by advisory handlers.
///
/// Every family is safe for concurrent use; increments on one label tuple are
/// atomic.
#[derive(Clone)]
pub struct JetStreamMetrics {
    delivery_exceeded: IntCounterVec,
    api_audit: IntCounterVec,
    ack_deliveries: IntCounterVec,
    ack_duration: HistogramVec,
}

impl JetStreamMetrics {
    /// Creates the families and registers them on `registry`.
    ///
    /// Fails with [`prometheus::Error::AlreadyReg`] when the registry already
    /// holds them; share one instance instead of registering twice.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let delivery_exceeded = IntCounterVec::new(
            Opts::new(
                DELIVERY_EXCEEDED_COUNT,
                "Advisories about JetStream Consumer Delivery Exceeded events",
            ),
            &ConsumerLabels::NAMES,
        )?;
        let api_audit = IntCounterVec::new(
            Opts::new(API_AUDIT, "JetStream API access audit events"),
            &ApiAuditLabels::NAMES,
        )?;
        let ack_deliveries = IntCounterVec::new(
            Opts::new(
                ACKNOWLEDGEMENT_DELIVERIES,
                "How many times messages took to be delivered and Acknowledged",
            ),
            &ConsumerLabels::NAMES,
        )?;
        let ack_duration = HistogramVec::new(
            HistogramOpts::new(
                ACKNOWLEDGEMENT_DURATION,
                "How long an Acknowledged message took to be Acknowledged",
            )
            .buckets(ACK_DURATION_BUCKETS.to_vec()),
            &ConsumerLabels::NAMES,
        )?;

        registry.register(Box::new(delivery_exceeded.clone()))?;
        registry.register(Box::new(api_audit.clone()))?;
        registry.register(Box::new(ack_deliveries.clone()))?;
        registry.register(Box::new(ack_duration.clone()))?;

        Ok(Self {
            delivery_exceeded,
            api_audit,
            ack_deliveries,
            ack_duration,
        })
    }

    pub fn inc_delivery_exceeded(&self, labels: &ConsumerLabels<'_>) {
        self.delivery_exceeded
            .with_label_values(&labels.values())
            .inc();
    }

    pub fn inc_api_audit(&self, labels: &ApiAuditLabels<'_>) {
        self.api_audit.with_label_values(&labels.values()).inc();
    }

    pub fn inc_ack_deliveries(&self, labels: &ConsumerLabels<'_>) {
        self.ack_deliveries.with_label_values(&labels.values()).inc();
    }

    pub fn observe_ack_duration(&self, labels: &ConsumerLabels<'_>, seconds: f64) {
        self.ack_duration
            .with_label_values(&labels.values())
            .observe(seconds);
    }

    pub fn delivery_exceeded(&self) -> &IntCounterVec {
        &self.delivery_exceeded
    }

    pub fn api_audit(&self) -> &IntCounterVec {
        &self.api_audit
    }

    pub fn ack_deliveries(&self) -> &IntCounterVec {
        &self.ack_deliveries
    }

    pub fn ack_duration(&self) -> &HistogramVec {
        &self.ack_duration
    }
}

impl Debug for JetStreamMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JetStreamMetrics").finish_non_exhaustive()
    }
}

/// Renders every family in `registry` in the text exposition format.
pub fn render_text(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
}
