//! Reply classification.
//!
//! GMP replies carry their outcome as `status`/`status_text` attributes on
//! the root element, e.g. `<get_tasks_response status="200"
//! status_text="OK">...</get_tasks_response>`. [`classify`] recovers that
//! pair so the outer HTTP response can mirror it. The function is total:
//! any input that is not a well-formed document with both attributes
//! degrades to the 500 sentinel instead of failing, so a garbled backend
//! reply can never crash a request or the startup handshake.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

/// Status used when a reply cannot be classified.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// A classified backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub status: u16,
    pub status_text: Option<String>,
    pub raw: String,
}

impl Classified {
    /// Whether the backend reported a 2xx outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl IntoResponse for Classified {
    /// Render the raw reply as `application/xml`, mirroring the classified
    /// status on the HTTP response. A status outside the valid HTTP range
    /// falls back to the error sentinel.
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/xml"),
            )],
            self.raw,
        )
            .into_response()
    }
}

/// Classify a raw backend reply.
///
/// Returns the parsed `status`/`status_text` when `raw` is a well-formed
/// document whose root carries an integer-coercible `status` and a
/// `status_text`; otherwise `(500, None, raw)`. Never fails for any input.
#[must_use]
pub fn classify(raw: &str) -> Classified {
    match parse_root(raw) {
        Some(Some((status, status_text))) => Classified {
            status,
            status_text: Some(status_text),
            raw: raw.to_string(),
        },
        Some(None) => {
            debug!("Reply root is missing 'status' or 'status_text'");

            Classified {
                status: DEFAULT_ERROR_STATUS,
                status_text: None,
                raw: raw.to_string(),
            }
        }
        None => {
            debug!("Reply is not well-formed XML");

            Classified {
                status: DEFAULT_ERROR_STATUS,
                status_text: None,
                raw: raw.to_string(),
            }
        }
    }
}

/// Whether `raw` is one complete, well-formed XML document.
///
/// The socket client uses this to decide when a streamed reply has been read
/// in full.
#[must_use]
pub fn is_complete_document(raw: &str) -> bool {
    parse_root(raw).is_some()
}

/// Outer `None`: not a well-formed single-root document.
/// Inner `None`: well-formed, but the root lacks usable status attributes.
fn parse_root(raw: &str) -> Option<Option<(u16, String)>> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut depth = 0usize;
    let mut root_attrs = None;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Err(_) => return None,
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    if seen_root {
                        // Second element after the root closed.
                        return None;
                    }
                    seen_root = true;
                    root_attrs = status_attrs(&e);
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    if seen_root {
                        return None;
                    }
                    seen_root = true;
                    root_attrs = status_attrs(&e);
                }
            }
            Ok(Event::End(_)) => {
                // Name mismatches are already an Err from the reader.
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && !t.is_empty() {
                    // Non-whitespace text outside the root element.
                    return None;
                }
            }
            Ok(_) => {}
        }
    }

    if !seen_root || depth != 0 {
        return None;
    }

    Some(root_attrs)
}

fn status_attrs(element: &BytesStart<'_>) -> Option<(u16, String)> {
    let mut status = None;
    let mut status_text = None;

    for attr in element.attributes() {
        let attr = attr.ok()?;

        match attr.key.as_ref() {
            b"status" => status = attr.unescape_value().ok()?.parse::<u16>().ok(),
            b"status_text" => status_text = Some(attr.unescape_value().ok()?.into_owned()),
            _ => {}
        }
    }

    Some((status?, status_text?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_reply() {
        let raw = r#"<response status="200" status_text="OK"/>"#;
        let classified = classify(raw);

        assert_eq!(classified.status, 200);
        assert_eq!(classified.status_text.as_deref(), Some("OK"));
        assert_eq!(classified.raw, raw);
        assert!(classified.is_success());
    }

    #[test]
    fn test_reply_with_children() {
        let raw = r#"<get_tasks_response status="200" status_text="OK"><task id="x"/></get_tasks_response>"#;
        let classified = classify(raw);

        assert_eq!(classified.status, 200);
        assert_eq!(classified.status_text.as_deref(), Some("OK"));
    }

    #[test]
    fn test_backend_error_status_is_preserved() {
        let raw = r#"<authenticate_response status="400" status_text="Auth failed"/>"#;
        let classified = classify(raw);

        assert_eq!(classified.status, 400);
        assert_eq!(classified.status_text.as_deref(), Some("Auth failed"));
        assert!(!classified.is_success());
    }

    #[test]
    fn test_empty_input_falls_back() {
        let classified = classify("");

        assert_eq!(classified.status, DEFAULT_ERROR_STATUS);
        assert_eq!(classified.status_text, None);
        assert_eq!(classified.raw, "");
    }

    #[test]
    fn test_non_xml_falls_back() {
        for raw in ["plain text", "{\"json\": true}", "<broken", "<a></b>", "\u{0}\u{1}"] {
            let classified = classify(raw);

            assert_eq!(classified.status, DEFAULT_ERROR_STATUS, "input: {raw:?}");
            assert_eq!(classified.status_text, None);
            assert_eq!(classified.raw, raw);
        }
    }

    #[test]
    fn test_missing_attributes_fall_back() {
        for raw in [
            "<response/>",
            r#"<response status="200"/>"#,
            r#"<response status_text="OK"/>"#,
        ] {
            let classified = classify(raw);

            assert_eq!(classified.status, DEFAULT_ERROR_STATUS, "input: {raw}");
            assert_eq!(classified.status_text, None);
        }
    }

    #[test]
    fn test_non_integer_status_falls_back() {
        let classified = classify(r#"<response status="teapot" status_text="hm"/>"#);

        assert_eq!(classified.status, DEFAULT_ERROR_STATUS);
        assert_eq!(classified.status_text, None);
    }

    #[test]
    fn test_trailing_garbage_falls_back() {
        let classified = classify(r#"<response status="200" status_text="OK"/><more/>"#);

        assert_eq!(classified.status, DEFAULT_ERROR_STATUS);
    }

    #[test]
    fn test_complete_document_detection() {
        assert!(is_complete_document("<response>pong</response>"));
        assert!(is_complete_document(r#"<response status="200" status_text="OK"/>"#));
        assert!(!is_complete_document("<response>"));
        assert!(!is_complete_document(""));
    }
}
