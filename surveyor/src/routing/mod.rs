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

//! Subject routing layer.
//!
//! Classifies advisory routing subjects into an [`AdvisoryKind`] plus the stream
//! and consumer tokens carried by the subject. Classification is total: any
//! subject that no rule recognizes is [`AdvisoryKind::Other`].
//!
//! ```
//! use nats_surveyor::routing::{classify, AdvisoryKind};
//!
//! let routed = classify("$JS.EVENT.ADVISORY.CONSUMER.MAX_DELIVERIES.SURVEYOR.OUT");
//! assert_eq!(routed.kind, AdvisoryKind::DeliveryExceeded);
//! assert_eq!(routed.stream, Some("SURVEYOR"));
//! assert_eq!(routed.consumer, Some("OUT"));
//!
//! assert_eq!(classify("not.an.advisory").kind, AdvisoryKind::Other);
//! ```

pub(crate) mod subject_rules;

pub use subject_rules::{classify, AdvisoryKind, RoutedSubject, SubjectRule, SUBJECT_RULES};

/// Subjects a listener subscribes to for one account.
pub const ADVISORY_SUBSCRIPTIONS: &[&str] =
    &["$JS.EVENT.ADVISORY.>", "$JS.EVENT.METRIC.>", "$JS.API.AUDIT"];
