use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a [MessageHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// A header value must not smuggle in extra header lines.
pub fn is_single_line(value: &str) -> bool {
    !value.contains(['\r', '\n'])
}

/// RFC 2822 message (`To`, `Subject`, blank line, body), URL-safe base64 without padding.
pub fn build_raw_message(to: &str, subject: &str, body: &str) -> String {
    let message = format!("To: {to}\r\nSubject: {subject}\r\n\r\n{body}");
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}
