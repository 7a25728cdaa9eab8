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

//! Transport seam.
//!
//! The advisory core never owns a connection. Host bindings implement
//! [`AdvisoryTransport`] over an already connected client and deliver each
//! inbound message to the registered [`AdvisoryHandler`], possibly from many
//! tasks at once.

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// One inbound message as delivered by the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvisoryMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

impl AdvisoryMessage {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    Unavailable,
    Internal,
}

/// Failure reported by a transport binding.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportStatus {
    pub code: StatusCode,
    pub message: String,
}

impl TransportStatus {
    pub fn fail_with_code(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Debug for TransportStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TransportStatus({:?}, {:?})", self.code, self.message)
    }
}

impl Display for TransportStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for TransportStatus {}

/// Receives messages for the subjects it was subscribed to.
#[async_trait]
pub trait AdvisoryHandler: Send + Sync {
    async fn on_advisory(&self, message: AdvisoryMessage);
}

/// Subscription surface of a connected transport.
///
/// A subscription is identified by its subject together with the handler
/// instance (pointer identity), mirroring how it was registered.
#[async_trait]
pub trait AdvisoryTransport: Send + Sync {
    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn AdvisoryHandler>,
    ) -> Result<(), TransportStatus>;

    async fn unsubscribe(
        &self,
        subject: &str,
        handler: Arc<dyn AdvisoryHandler>,
    ) -> Result<(), TransportStatus>;
}
