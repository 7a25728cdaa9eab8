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

//! Listener lifecycle layer.
//!
//! Owns the `Created -> Running -> Stopped` state machine and the subscription
//! set of one account. Start is rollback-safe: a refused subscription tears
//! down every subscription made by that attempt before the error returns.

mod advisory_listener;
mod subscriptions;

pub use advisory_listener::{AdvisoryListener, ListenerState};

use crate::config::ConfigError;
use crate::transport::TransportStatus;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Errors surfaced synchronously by listener construction and start.
pub enum ListenerError {
    Config(ConfigError),
    Subscribe {
        subject: String,
        status: TransportStatus,
    },
    AlreadyRunning,
    Stopped,
}

impl Debug for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Config(err) => write!(f, "Config({err:?})"),
            ListenerError::Subscribe { subject, status } => {
                write!(f, "Subscribe({subject:?}, {status:?})")
            }
            ListenerError::AlreadyRunning => write!(f, "AlreadyRunning"),
            ListenerError::Stopped => write!(f, "Stopped"),
        }
    }
}

impl Display for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Config(err) => Display::fmt(err, f),
            ListenerError::Subscribe { subject, status } => {
                write!(f, "unable to subscribe to {subject}: {status}")
            }
            ListenerError::AlreadyRunning => write!(f, "advisory listener is already running"),
            ListenerError::Stopped => {
                write!(f, "advisory listener was stopped and cannot be restarted")
            }
        }
    }
}

impl Error for ListenerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ListenerError::Config(err) => Some(err),
            ListenerError::Subscribe { status, .. } => Some(status),
            ListenerError::AlreadyRunning | ListenerError::Stopped => None,
        }
    }
}

impl From<ConfigError> for ListenerError {
    fn from(err: ConfigError) -> Self {
        ListenerError::Config(err)
    }
}
