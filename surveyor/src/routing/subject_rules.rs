//! Ordered subject rule table and the classifier that evaluates it.

/// Advisory categories the listener distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    DeliveryExceeded,
    ApiAudit,
    AckLatencySample,
    Other,
}

/// Result of classifying one routing subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutedSubject<'a> {
    pub kind: AdvisoryKind,
    pub stream: Option<&'a str>,
    pub consumer: Option<&'a str>,
}

const OTHER: RoutedSubject<'static> = RoutedSubject {
    kind: AdvisoryKind::Other,
    stream: None,
    consumer: None,
};

/// One classification rule.
///
/// `pattern` is matched token by token against the subject; `*` matches exactly
/// one non-empty token and the token counts must be equal. `stream_at` and
/// `consumer_at` are token positions captured on a match.
#[derive(Debug)]
pub struct SubjectRule {
    pub pattern: &'static [&'static str],
    pub kind: AdvisoryKind,
    pub stream_at: Option<usize>,
    pub consumer_at: Option<usize>,
}

const WILDCARD: &str = "*";

/// Rules in evaluation order. The first match wins, so specific spellings go
/// before anything with a wildcard in the same position.
pub const SUBJECT_RULES: &[SubjectRule] = &[
    SubjectRule {
        pattern: &["$JS", "EVENT", "ADVISORY", "CONSUMER", "MAX_DELIVERIES", "*", "*"],
        kind: AdvisoryKind::DeliveryExceeded,
        stream_at: Some(5),
        consumer_at: Some(6),
    },
    SubjectRule {
        pattern: &["$JS", "EVENT", "ADVISORY", "CONSUMER", "MAX_DELIVERY", "*", "*"],
        kind: AdvisoryKind::DeliveryExceeded,
        stream_at: Some(5),
        consumer_at: Some(6),
    },
    SubjectRule {
        pattern: &["$JS", "API", "AUDIT"],
        kind: AdvisoryKind::ApiAudit,
        stream_at: None,
        consumer_at: None,
    },
    SubjectRule {
        pattern: &["$JS", "EVENT", "ADVISORY", "API"],
        kind: AdvisoryKind::ApiAudit,
        stream_at: None,
        consumer_at: None,
    },
    SubjectRule {
        pattern: &["$JS", "EVENT", "METRIC", "CONSUMER", "ACK", "*", "*"],
        kind: AdvisoryKind::AckLatencySample,
        stream_at: Some(5),
        consumer_at: Some(6),
    },
    SubjectRule {
        pattern: &["$JS", "EVENT", "METRIC", "CONSUMER_ACK", "*", "*"],
        kind: AdvisoryKind::AckLatencySample,
        stream_at: Some(4),
        consumer_at: Some(5),
    },
];

fn matches(pattern: &[&str], tokens: &[&str]) -> bool {
    pattern.len() == tokens.len()
        && pattern
            .iter()
            .zip(tokens)
            .all(|(expected, token)| match *expected {
                WILDCARD => !token.is_empty(),
                literal => literal == *token,
            })
}

/// Classifies a routing subject against [`SUBJECT_RULES`].
pub fn classify(subject: &str) -> RoutedSubject<'_> {
    classify_with(SUBJECT_RULES, subject)
}

pub(crate) fn classify_with<'a>(rules: &[SubjectRule], subject: &'a str) -> RoutedSubject<'a> {
    let tokens: Vec<&'a str> = subject.split('.').collect();

    rules
        .iter()
        .find(|rule| matches(rule.pattern, &tokens))
        .map(|rule| RoutedSubject {
            kind: rule.kind,
            stream: rule.stream_at.and_then(|at| tokens.get(at).copied()),
            consumer: rule.consumer_at.and_then(|at| tokens.get(at).copied()),
        })
        .unwrap_or(OTHER)
}
