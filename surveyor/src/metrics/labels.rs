//! Label tuples for the advisory counter families.
//!
//! Label names are kept in lexical order and `values()` returns values in the
//! same order.

use crate::routing::RoutedSubject;

/// `{account, consumer, stream}` tuple used by the consumer-scoped families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerLabels<'a> {
    pub account: &'a str,
    pub stream: &'a str,
    pub consumer: &'a str,
}

impl<'a> ConsumerLabels<'a> {
    pub const NAMES: [&'static str; 3] = ["account", "consumer", "stream"];

    pub fn new(account: &'a str, stream: &'a str, consumer: &'a str) -> Self {
        Self {
            account,
            stream,
            consumer,
        }
    }

    /// Builds the tuple from a routed subject; `None` when the subject did not
    /// carry both a stream and a consumer token.
    pub fn from_routed(account: &'a str, routed: &RoutedSubject<'a>) -> Option<Self> {
        Some(Self::new(account, routed.stream?, routed.consumer?))
    }

    pub fn values(&self) -> [&'a str; 3] {
        [self.account, self.consumer, self.stream]
    }
}

/// `{account, server, subject}` tuple used by the API audit family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ApiAuditLabels<'a> {
    pub account: &'a str,
    pub server: &'a str,
    pub subject: &'a str,
}

impl<'a> ApiAuditLabels<'a> {
    pub const NAMES: [&'static str; 3] = ["account", "server", "subject"];

    pub fn new(account: &'a str, server: &'a str, subject: &'a str) -> Self {
        Self {
            account,
            server,
            subject,
        }
    }

    pub fn values(&self) -> [&'a str; 3] {
        [self.account, self.server, self.subject]
    }
}
