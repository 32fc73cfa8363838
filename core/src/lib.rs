//! Sudomail Core Library
//!
//! Message-processing core of the Sudomail client SDK for a hosted,
//! end-to-end-encrypted email service:
//! - Domain model ([`MessageDetails`] and friends)
//! - RFC822/MIME codec (encode to wire text, decode back to details)
//! - Quoting formatter (reply/forward HTML fragments)
//!
//! Everything here is pure and stateless: no I/O, no network, no shared
//! mutable state between calls. Encoding decides *whether* the canned
//! encrypted-body substitution happens; the actual sealing of message
//! content is performed elsewhere in the SDK.

pub mod encoded_word;
pub mod error;
pub mod formatter;
pub mod message;
pub mod rfc822;

// Re-export commonly used types
pub use error::{SudomailError, SudomailResult};
pub use formatter::{
    encode_forward_message, encode_reply_message, format_as_forwarding_message,
    format_as_replying_message,
};
pub use message::{EmailAddressDetail, EmailAttachment, EncryptionStatus, MessageDetails};
pub use rfc822::{decode_rfc822, encode_to_rfc822, encode_to_rfc822_bytes};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Custom header marking a message whose real content is encrypted out of band
pub const ENCRYPTION_HEADER_NAME: &str = "X-Sudoplatform-Encryption";

/// The exact value of the encryption marker header; its presence with this
/// value is the sole decode-side signal for [`EncryptionStatus::Encrypted`]
pub const ENCRYPTION_HEADER_VALUE: &str = "sudoplatform";

/// Placeholder body emitted in place of encrypted content; must match other
/// SDK implementations of this service byte for byte
pub const CANNED_ENCRYPTED_BODY: &str = "Encrypted message attached";
