use crate::error::RequestError;
use std::fmt;

/// What to ask the QR service for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrRequest {
    /// `GET {base}/generate_qr/{id}`
    ByEventId(u64),
    /// `GET {base}/generate_qr?data={payload}`
    ByPayload(String),
}

impl QrRequest {
    pub fn event(id: u64) -> Result<Self, RequestError> {
        if id == 0 {
            return Err(RequestError::NonPositiveEventId);
        }
        Ok(QrRequest::ByEventId(id))
    }

    pub fn payload(data: impl Into<String>) -> Result<Self, RequestError> {
        let data = data.into();
        if data.is_empty() {
            return Err(RequestError::EmptyPayload);
        }
        Ok(QrRequest::ByPayload(data))
    }

    /// Builds a request from the page form, where an empty field means "not given".
    pub fn from_form(event_id: &str, payload: &str) -> Result<Self, RequestError> {
        let event_id = event_id.trim();
        match (event_id.is_empty(), payload.is_empty()) {
            (false, false) => Err(RequestError::Ambiguous),
            (true, true) => Err(RequestError::Missing),
            (false, true) => {
                let id = event_id
                    .parse::<u64>()
                    .map_err(|_| RequestError::InvalidEventId(event_id.to_string()))?;
                Self::event(id)
            }
            (true, false) => Self::payload(payload),
        }
    }

    /// Full request URL; `base` is expected without a trailing slash.
    pub fn url(&self, base: &str) -> String {
        match self {
            QrRequest::ByEventId(id) => format!("{base}/generate_qr/{id}"),
            QrRequest::ByPayload(data) => {
                format!("{base}/generate_qr?data={}", urlencoding::encode(data))
            }
        }
    }
}

impl fmt::Display for QrRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrRequest::ByEventId(id) => write!(f, "event {id}"),
            QrRequest::ByPayload(data) => write!(f, "payload {data:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://127.0.0.1:5500";

    #[test]
    fn event_url_is_exact() {
        for id in [1u64, 42, 9_000_000_001] {
            let request = QrRequest::event(id).unwrap();
            assert_eq!(request.url(BASE), format!("{BASE}/generate_qr/{id}"));
        }
        assert_eq!(
            QrRequest::event(1).unwrap().url(BASE),
            "http://127.0.0.1:5500/generate_qr/1"
        );
    }

    #[test]
    fn payload_with_reserved_characters_round_trips() {
        let payloads = [
            "hello world",
            "a&b=c#frag",
            "100% sure?",
            "path/to/thing+more",
            "ünïcødé ✓",
        ];
        for payload in payloads {
            let url = QrRequest::payload(payload).unwrap().url(BASE);
            let prefix = format!("{BASE}/generate_qr?data=");
            let encoded = url.strip_prefix(&prefix).expect("query parameter shape");
            assert!(!encoded.contains(['&', '#', ' ']), "unescaped: {encoded}");
            assert_eq!(urlencoding::decode(encoded).unwrap(), payload);
        }
    }

    #[test]
    fn rejects_invalid_descriptors() {
        assert_eq!(QrRequest::event(0), Err(RequestError::NonPositiveEventId));
        assert_eq!(QrRequest::payload(""), Err(RequestError::EmptyPayload));
    }

    #[test]
    fn form_parsing() {
        assert_eq!(QrRequest::from_form(" 7 ", ""), Ok(QrRequest::ByEventId(7)));
        assert_eq!(
            QrRequest::from_form("", " padded "),
            Ok(QrRequest::ByPayload(" padded ".to_string()))
        );
        assert_eq!(QrRequest::from_form("1", "x"), Err(RequestError::Ambiguous));
        assert_eq!(QrRequest::from_form("  ", ""), Err(RequestError::Missing));
        assert_eq!(
            QrRequest::from_form("-3", ""),
            Err(RequestError::InvalidEventId("-3".to_string()))
        );
        assert_eq!(QrRequest::from_form("0", ""), Err(RequestError::NonPositiveEventId));
    }

    #[test]
    fn display_labels() {
        assert_eq!(QrRequest::ByEventId(3).to_string(), "event 3");
        assert_eq!(QrRequest::ByPayload("hi".into()).to_string(), "payload \"hi\"");
    }
}
