//! WhatsApp hand-off: deep link construction and the open primitive.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::OnceLock;

/// Characters `encodeURIComponent` leaves alone, so links match what
/// browsers and WhatsApp clients expect.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const DEFAULT_HOST: &str = "wa.me";
pub const DEFAULT_NUMBER: &str = "6281239602221";

/// `https://<host>/<number>?text=<message>` template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhatsAppLink {
    host: String,
    number: String,
}

impl Default for WhatsAppLink {
    fn default() -> Self { Self::new(DEFAULT_HOST, DEFAULT_NUMBER) }
}

impl WhatsAppLink {
    pub fn new(host: impl Into<String>, number: impl Into<String>) -> Self {
        Self { host: host.into(), number: number.into() }
    }

    pub fn number(&self) -> &str { &self.number }

    pub fn url_for(&self, message: &str) -> String {
        format!("https://{}/{}?text={}", self.host, self.number, utf8_percent_encode(message, URI_COMPONENT))
    }
}

/// Opens the hand-off target in a new browsing context.
pub trait Handoff: Send + Sync {
    fn open(&self, url: &str);
}

/// Captures the hand-off target so an HTTP response can redirect the client to it.
#[derive(Debug, Default)]
pub struct RedirectHandoff {
    target: OnceLock<String>,
}

impl RedirectHandoff {
    pub fn new() -> Self { Self::default() }
    pub fn target(&self) -> Option<&str> { self.target.get().map(String::as_str) }
}

impl Handoff for RedirectHandoff {
    fn open(&self, url: &str) {
        if self.target.set(url.to_string()).is_err() {
            tracing::warn!(url, "hand-off already opened; ignoring second target");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_like_uri_component() {
        let link = WhatsAppLink::default();
        let url = link.url_for("Halo, saya (1x) *Total*\n📋 a&b=c");
        assert_eq!(
            url,
            "https://wa.me/6281239602221?text=Halo%2C%20saya%20(1x)%20*Total*%0A%F0%9F%93%8B%20a%26b%3Dc"
        );
    }

    #[test]
    fn test_redirect_keeps_first_target() {
        let handoff = RedirectHandoff::new();
        assert_eq!(handoff.target(), None);
        handoff.open("https://wa.me/1?text=a");
        handoff.open("https://wa.me/1?text=b");
        assert_eq!(handoff.target(), Some("https://wa.me/1?text=a"));
    }
}
