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

//! # nats-surveyor
//!
//! `nats-surveyor` turns JetStream advisory events into Prometheus counters.
//!
//! An [`AdvisoryListener`] is built per account from a JSON configuration
//! document, subscribes to the advisory subjects on a host-supplied
//! [`AdvisoryTransport`], and increments the families held by a shared
//! [`JetStreamMetrics`]:
//!
//! - `nats_survey_jetstream_delivery_exceeded_count{account,consumer,stream}`
//! - `nats_survey_jetstream_api_audit{account,server,subject}`
//! - `nats_survey_jetstream_acknowledgement_deliveries{account,consumer,stream}`
//!
//! ```
//! use async_trait::async_trait;
//! use nats_surveyor::{
//!     AdvisoryConfig, AdvisoryHandler, AdvisoryListener, AdvisoryTransport, ConnectionOptions,
//!     JetStreamMetrics, TransportStatus,
//! };
//! use prometheus::Registry;
//! use std::sync::Arc;
//!
//! # struct NoopTransport;
//! #
//! # #[async_trait]
//! # impl AdvisoryTransport for NoopTransport {
//! #     async fn subscribe(
//! #         &self,
//! #         _subject: &str,
//! #         _handler: Arc<dyn AdvisoryHandler>,
//! #     ) -> Result<(), TransportStatus> {
//! #         Ok(())
//! #     }
//! #
//! #     async fn unsubscribe(
//! #         &self,
//! #         _subject: &str,
//! #         _handler: Arc<dyn AdvisoryHandler>,
//! #     ) -> Result<(), TransportStatus> {
//! #         Ok(())
//! #     }
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Registry::new();
//! let metrics = Arc::new(JetStreamMetrics::register(&registry).unwrap());
//! let transport: Arc<dyn AdvisoryTransport> = Arc::new(NoopTransport);
//!
//! let config = AdvisoryConfig::from_slice("global.json", br#"{"name": "global"}"#).unwrap();
//! let listener = AdvisoryListener::from_config(
//!     "global.json",
//!     config,
//!     &ConnectionOptions::new(["nats://127.0.0.1:4222"]),
//!     transport,
//!     metrics,
//! );
//!
//! listener.start().await.unwrap();
//! listener.stop().await;
//! listener.stop().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Config: account configuration loading, validation and connection options
//! - Routing: subject classification through an ordered rule table
//! - Metrics: counter families and label tuples
//! - Handlers: per-kind payload decoding and increments, per-message dispatch
//! - Listener: start/stop lifecycle and subscription ownership
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events and never installs a global
//! subscriber. Per-message failures are logged and contained; only
//! construction and start errors reach the caller.

pub mod config;
pub mod handlers;
pub mod listener;
pub mod manager;
pub mod metrics;
#[doc(hidden)]
pub mod observability;
pub mod routing;
pub mod transport;

pub use config::{AdvisoryConfig, ConfigError, ConnectionOptions};
pub use listener::{AdvisoryListener, ListenerError, ListenerState};
pub use manager::{AdvisoryListenerGroup, GroupError};
pub use metrics::JetStreamMetrics;
pub use transport::{
    AdvisoryHandler, AdvisoryMessage, AdvisoryTransport, StatusCode, TransportStatus,
};
