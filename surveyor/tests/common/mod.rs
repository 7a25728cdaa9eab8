//! Shared helpers for the listener integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use nats_surveyor::{
    AdvisoryHandler, AdvisoryMessage, AdvisoryTransport, StatusCode, TransportStatus,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Returns `true` when `subject` is covered by the subscription `pattern`,
/// using `*` (one token) and trailing `>` (one or more tokens) wildcards.
pub fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut subject_tokens = subject.split('.');

    for pattern_token in pattern.split('.') {
        match (pattern_token, subject_tokens.next()) {
            (">", Some(token)) => return !token.is_empty(),
            ("*", Some(token)) if !token.is_empty() => {}
            (literal, Some(token)) if literal == token => {}
            _ => return false,
        }
    }

    subject_tokens.next().is_none()
}

/// In-process stand-in for a connected transport. Delivers published messages
/// to every handler whose subscription subject matches.
#[derive(Default)]
pub struct MemoryTransport {
    subscriptions: StdMutex<Vec<(String, Arc<dyn AdvisoryHandler>)>>,
    refused: StdMutex<HashSet<String>>,
}

impl MemoryTransport {
    pub fn refuse(&self, subject: &str) {
        self.refused
            .lock()
            .expect("lock refused")
            .insert(subject.to_string());
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().expect("lock subscriptions").len()
    }

    pub fn subscribed_subjects(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .expect("lock subscriptions")
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }

    pub fn handlers_for(&self, subject: &str) -> Vec<Arc<dyn AdvisoryHandler>> {
        self.subscriptions
            .lock()
            .expect("lock subscriptions")
            .iter()
            .filter(|(pattern, _)| subject_matches(pattern, subject))
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    pub async fn publish(&self, subject: &str, payload: &[u8]) {
        for handler in self.handlers_for(subject) {
            handler
                .on_advisory(AdvisoryMessage::new(subject, payload.to_vec()))
                .await;
        }
    }
}

#[async_trait]
impl AdvisoryTransport for MemoryTransport {
    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn AdvisoryHandler>,
    ) -> Result<(), TransportStatus> {
        if self.refused.lock().expect("lock refused").contains(subject) {
            return Err(TransportStatus::fail_with_code(
                StatusCode::PermissionDenied,
                format!("permissions violation for subscription to {subject}"),
            ));
        }

        self.subscriptions
            .lock()
            .expect("lock subscriptions")
            .push((subject.to_string(), handler));
        Ok(())
    }

    async fn unsubscribe(
        &self,
        subject: &str,
        handler: Arc<dyn AdvisoryHandler>,
    ) -> Result<(), TransportStatus> {
        let mut subscriptions = self.subscriptions.lock().expect("lock subscriptions");
        let before = subscriptions.len();
        subscriptions.retain(|(registered, registered_handler)| {
            !(registered == subject && Arc::ptr_eq(registered_handler, &handler))
        });

        if subscriptions.len() == before {
            return Err(TransportStatus::fail_with_code(
                StatusCode::NotFound,
                format!("no subscription for {subject}"),
            ));
        }
        Ok(())
    }
}

pub fn api_audit_payload(subject: &str, response: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "io.nats.jetstream.advisory.v1.api_audit",
        "id": "pBw6pUPPc1GCbVMXhvLJo3",
        "timestamp": "2020-05-05T12:00:00.000000000Z",
        "server": "jetstream",
        "client": {
            "host": "127.0.0.1",
            "port": 50620,
            "cid": 5,
            "acc": "global",
            "lang": "go",
            "version": "1.10.0"
        },
        "subject": subject,
        "request": "",
        "response": response
    })
    .to_string()
    .into_bytes()
}

pub fn delivery_exceeded_payload(stream: &str, consumer: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "io.nats.jetstream.advisory.v1.max_deliver",
        "id": "pBw6pUPPc1GCbVMXhvLJq9",
        "timestamp": "2020-05-05T12:00:01.100000000Z",
        "stream": stream,
        "consumer": consumer,
        "stream_seq": 1,
        "deliveries": 1
    })
    .to_string()
    .into_bytes()
}

pub fn ack_metric_payload(stream: &str, consumer: &str, ack_time_ns: i64) -> Vec<u8> {
    serde_json::json!({
        "type": "io.nats.jetstream.metric.v1.consumer_ack",
        "id": "pBw6pUPPc1GCbVMXhvLJs2",
        "timestamp": "2020-05-05T12:00:02.000000000Z",
        "stream": stream,
        "consumer": consumer,
        "consumer_seq": 1,
        "stream_seq": 2,
        "ack_time": ack_time_ns,
        "deliveries": 1
    })
    .to_string()
    .into_bytes()
}
