//! Structured tracing vocabulary shared by the listener layers.
//!
//! Library code only emits events; subscriber installation belongs to the host
//! process or test harness.

pub mod events {
    pub const CONFIG_LOADED: &str = "config_loaded";

    pub const LISTENER_CREATED: &str = "listener_created";
    pub const LISTENER_STARTED: &str = "listener_started";
    pub const LISTENER_START_REJECTED: &str = "listener_start_rejected";
    pub const LISTENER_START_RESUMED: &str = "listener_start_resumed";
    pub const LISTENER_STOPPED: &str = "listener_stopped";
    pub const LISTENER_STOP_NOOP: &str = "listener_stop_noop";

    pub const SUBSCRIBE_OK: &str = "subscribe_ok";
    pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
    pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
    pub const UNSUBSCRIBE_FAILED: &str = "unsubscribe_failed";

    pub const ADVISORY_RECEIVE: &str = "advisory_receive";
    pub const ADVISORY_DROP_INACTIVE: &str = "advisory_drop_inactive";
    pub const ADVISORY_UNRECOGNIZED: &str = "advisory_unrecognized";
    pub const ADVISORY_DECODE_FAILED: &str = "advisory_decode_failed";
    pub const API_AUDIT_ERROR_RESPONSE: &str = "api_audit_error_response";
    pub const ACK_SAMPLE_UNDECODED: &str = "ack_sample_undecoded";

    pub const GROUP_CONFIG_SKIPPED: &str = "group_config_skipped";
    pub const GROUP_START_ROLLBACK: &str = "group_start_rollback";
}

pub mod fields {
    /// Renders a payload excerpt safe for log lines.
    pub fn format_payload_excerpt(payload: &[u8]) -> String {
        const MAX: usize = 128;
        let excerpt = &payload[..payload.len().min(MAX)];
        let mut rendered = String::from_utf8_lossy(excerpt).into_owned();
        if payload.len() > MAX {
            rendered.push_str("...");
        }
        rendered
    }
}
