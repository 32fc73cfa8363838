//! Message domain model for Sudomail Core
//!
//! These are transient value objects with no shared mutable state: callers
//! build a [`MessageDetails`], hand it to the codec, and get an independent
//! value back from decode.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Encryption policy status of a message
///
/// This is a policy flag, not a cryptographic operation. `Encrypted` tells
/// the codec to emit the encryption marker header and the canned placeholder
/// body; the real payload is sealed elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionStatus {
    /// Message content is end-to-end encrypted out of band
    Encrypted,
    /// Message content travels as-is
    #[default]
    Unencrypted,
}

/// A single mailbox: address plus optional display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddressDetail {
    /// Email address
    pub email_address: String,
    /// Display name
    pub display_name: Option<String>,
}

impl EmailAddressDetail {
    /// Create an address without a display name
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            display_name: None,
        }
    }

    /// Create an address with a display name
    pub fn with_name(email_address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            display_name: Some(display_name.into()),
        }
    }
}

impl std::fmt::Display for EmailAddressDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = &self.display_name {
            write!(f, "{} <{}>", name, self.email_address)
        } else {
            write!(f, "{}", self.email_address)
        }
    }
}

/// Attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAttachment {
    /// Content; base64 text when `content_transfer_encoding` is `base64`
    pub data: String,
    /// Filename
    pub filename: String,
    /// MIME type
    pub mime_type: String,
    /// Content transfer encoding declared for the wire part
    pub content_transfer_encoding: String,
    /// Content ID, without surrounding angle brackets
    pub content_id: Option<String>,
    /// Whether the attachment is rendered inline via a `cid:` reference
    pub inline_attachment: bool,
}

/// Structured representation of an email message, prior to wire encoding or
/// after wire decoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDetails {
    /// Sender addresses; only the first is representable on the wire
    pub from: Vec<EmailAddressDetail>,
    /// To recipients
    pub to: Vec<EmailAddressDetail>,
    /// Cc recipients
    pub cc: Vec<EmailAddressDetail>,
    /// Bcc recipients
    pub bcc: Vec<EmailAddressDetail>,
    /// Reply-To addresses; only the first is representable on the wire
    pub reply_to: Vec<EmailAddressDetail>,
    /// Subject
    pub subject: Option<String>,
    /// Body content; interpretation governed by `is_html`
    pub body: String,
    /// Whether `body` is HTML (`text/html`) or plain text (`text/plain`)
    pub is_html: bool,
    /// Regular attachments
    pub attachments: Vec<EmailAttachment>,
    /// Inline attachments
    pub inline_attachments: Vec<EmailAttachment>,
    /// Encryption policy status
    pub encryption_status: EncryptionStatus,
    /// Identifier of the message being forwarded, threaded into `References`
    pub forward_message_id: Option<String>,
    /// Identifier of the message being replied to, threaded into `In-Reply-To`
    pub reply_message_id: Option<String>,
    /// Message date, from the `Date` header on decode
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

impl MessageDetails {
    /// Get the sender address, if any
    pub fn sender(&self) -> Option<&EmailAddressDetail> {
        self.from.first()
    }

    /// Check if the message carries any attachments, inline or regular
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty() || !self.inline_attachments.is_empty()
    }

    /// Check if the message is flagged as end-to-end encrypted
    pub fn is_encrypted(&self) -> bool {
        self.encryption_status == EncryptionStatus::Encrypted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let plain = EmailAddressDetail::new("user@example.com");
        assert_eq!(plain.to_string(), "user@example.com");

        let named = EmailAddressDetail::with_name("user@example.com", "Example User");
        assert_eq!(named.to_string(), "Example User <user@example.com>");
    }

    #[test]
    fn test_message_defaults() {
        let details = MessageDetails::default();
        assert_eq!(details.encryption_status, EncryptionStatus::Unencrypted);
        assert!(!details.is_html);
        assert!(!details.has_attachments());
        assert!(details.sender().is_none());
    }

    #[test]
    fn test_serde_round_trip() {
        let details = MessageDetails {
            from: vec![EmailAddressDetail::with_name("a@x.com", "A")],
            to: vec![EmailAddressDetail::new("b@x.com")],
            subject: Some("Hi".to_string()),
            body: "Hello".to_string(),
            encryption_status: EncryptionStatus::Encrypted,
            forward_message_id: Some("id-1".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&details).unwrap();
        let back: MessageDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back, details);
    }
}
