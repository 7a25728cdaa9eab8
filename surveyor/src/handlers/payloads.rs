//! Advisory payload bodies, one type per kind that needs decoding.
//!
//! Unknown fields are ignored and every field is optional so that newer server
//! versions keep decoding.

use serde::Deserialize;

/// `io.nats.jetstream.advisory.v1.api_audit`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiAuditAdvisory {
    #[serde(rename = "type")]
    pub schema: String,
    pub id: String,
    pub server: String,
    pub subject: String,
    pub request: String,
    pub response: String,
}

#[derive(Deserialize)]
struct ApiResponseEnvelope {
    error: Option<ApiResponseError>,
}

/// Error block embedded in a JetStream API response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiResponseError {
    pub code: u32,
    pub description: String,
}

impl ApiAuditAdvisory {
    /// Error carried by the audited response, if the response decodes and has one.
    pub fn response_error(&self) -> Option<ApiResponseError> {
        serde_json::from_str::<ApiResponseEnvelope>(&self.response)
            .ok()
            .and_then(|envelope| envelope.error)
    }
}

/// `io.nats.jetstream.metric.v1.consumer_ack`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsumerAckMetric {
    pub stream: String,
    pub consumer: String,
    pub consumer_seq: u64,
    pub stream_seq: u64,
    /// Nanoseconds between delivery and acknowledgement.
    pub ack_time: i64,
    pub deliveries: u64,
}

impl ConsumerAckMetric {
    pub fn ack_seconds(&self) -> Option<f64> {
        (self.ack_time >= 0).then(|| self.ack_time as f64 / 1_000_000_000.0)
    }
}
