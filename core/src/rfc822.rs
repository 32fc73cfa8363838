//! RFC822/MIME message codec
//!
//! Converts a [`MessageDetails`] value into canonical RFC822 text for
//! transmission or storage, and parses raw RFC822 text back into structured
//! details. Both directions are pure and stateless; each call is independent
//! and may run concurrently with others.
//!
//! Encoding is built on the lettre message builder, decoding on mailparse.

use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lettre::message::header::{self, Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::{Address, Message};
use mailparse::{addrparse, parse_mail, DispositionType, MailAddr, MailHeaderMap, ParsedMail};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::encoded_word::decode_encoded_words;
use crate::error::{SudomailError, SudomailResult};
use crate::message::{EmailAddressDetail, EmailAttachment, EncryptionStatus, MessageDetails};
use crate::{CANNED_ENCRYPTED_BODY, ENCRYPTION_HEADER_NAME, ENCRYPTION_HEADER_VALUE};

/// `References` values may arrive as a comma-or-comma-space-delimited list
static REFERENCES_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

/// The `X-Sudoplatform-Encryption` marker header
#[derive(Debug, Clone, PartialEq, Eq)]
struct EncryptionMarker(String);

impl EncryptionMarker {
    fn sudoplatform() -> Self {
        Self(ENCRYPTION_HEADER_VALUE.to_string())
    }
}

impl Header for EncryptionMarker {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str(ENCRYPTION_HEADER_NAME)
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// `Reply-To` emitted as a literal pre-rendered value, not re-parsed by the
/// builder
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawReplyTo(String);

impl Header for RawReplyTo {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Reply-To")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Escape a display name for wire emission: every `\` becomes `\\` and every
/// `"` becomes `\"`.
pub fn escape_display_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render an address as a wire display string: `"escapedName" <address>` when
/// a display name is present, the bare address otherwise.
pub fn address_to_string(address: &EmailAddressDetail) -> String {
    match &address.display_name {
        Some(name) => format!(
            "\"{}\" <{}>",
            escape_display_name(name),
            address.email_address
        ),
        None => address.email_address.clone(),
    }
}

/// Map an address to a builder mailbox. The builder applies the same
/// backslash/double-quote rule itself when it serializes the display name.
fn address_to_mailbox(address: &EmailAddressDetail) -> SudomailResult<Mailbox> {
    let addr: Address = address.email_address.parse().map_err(|e| {
        SudomailError::invalid_email_contents(format!(
            "invalid email address {:?}: {e}",
            address.email_address
        ))
    })?;
    Ok(Mailbox::new(address.display_name.clone(), addr))
}

fn attachment_part(attachment: &EmailAttachment) -> SudomailResult<SinglePart> {
    let content_type = header::ContentType::parse(&attachment.mime_type).map_err(|e| {
        SudomailError::invalid_email_contents(format!(
            "invalid attachment content type {:?}: {e}",
            attachment.mime_type
        ))
    })?;
    let encoding: header::ContentTransferEncoding = attachment
        .content_transfer_encoding
        .parse()
        .map_err(|_| {
            SudomailError::invalid_email_contents(format!(
                "invalid content transfer encoding {:?}",
                attachment.content_transfer_encoding
            ))
        })?;

    // The builder re-encodes part content under the declared transfer
    // encoding, so base64 data goes in as raw bytes to keep the wire encoded
    // exactly once.
    let content = if attachment
        .content_transfer_encoding
        .eq_ignore_ascii_case("base64")
    {
        BASE64.decode(attachment.data.trim())?
    } else {
        attachment.data.clone().into_bytes()
    };

    let mut part = SinglePart::builder().header(content_type);
    part = if attachment.inline_attachment {
        part.header(header::ContentDisposition::inline_with_name(
            &attachment.filename,
        ))
    } else {
        part.header(header::ContentDisposition::attachment(&attachment.filename))
    };
    if let Some(content_id) = &attachment.content_id {
        let value = if content_id.starts_with('<') {
            content_id.clone()
        } else {
            format!("<{content_id}>")
        };
        part = part.header(header::ContentId::from(value));
    }
    part = part.header(encoding);

    Ok(part.body(content))
}

/// Encode structured message details into canonical RFC822 text.
pub fn encode_to_rfc822(details: &MessageDetails) -> SudomailResult<String> {
    tracing::debug!(
        recipients = details.to.len(),
        attachments = details.attachments.len() + details.inline_attachments.len(),
        "encoding message to RFC822"
    );

    // lettre strips the Bcc header during serialization unless told otherwise;
    // the wire format carries it.
    let mut builder = Message::builder().keep_bcc();

    // Only a single sender address is representable on the wire.
    if let Some(sender) = details.from.first() {
        builder = builder.from(address_to_mailbox(sender)?);
    }
    for address in &details.to {
        builder = builder.to(address_to_mailbox(address)?);
    }
    for address in &details.cc {
        builder = builder.cc(address_to_mailbox(address)?);
    }
    for address in &details.bcc {
        builder = builder.bcc(address_to_mailbox(address)?);
    }
    // The wire format supports only a single Reply-To mailbox.
    if let Some(reply_to) = details.reply_to.first() {
        builder = builder.header(RawReplyTo(address_to_string(reply_to)));
    }

    // Encryption policy overrides the supplied body and suppresses reference
    // threading headers entirely.
    let (body, is_html) = match details.encryption_status {
        EncryptionStatus::Encrypted => {
            builder = builder.header(EncryptionMarker::sudoplatform());
            (CANNED_ENCRYPTED_BODY.to_string(), false)
        }
        EncryptionStatus::Unencrypted => {
            if let Some(id) = &details.forward_message_id {
                builder = builder.references(format!("<{id}>"));
            } else if let Some(id) = &details.reply_message_id {
                builder = builder.in_reply_to(format!("<{id}>"));
            }
            (details.body.clone(), details.is_html)
        }
    };

    builder = builder.subject(details.subject.clone().unwrap_or_default());
    if let Some(date) = details.date {
        builder = builder.date(SystemTime::from(date));
    }

    let body_content_type = if is_html {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    };
    let body_part = SinglePart::builder()
        .header(header::ContentType::parse(body_content_type).map_err(|e| {
            SudomailError::invalid_email_contents(format!("invalid body content type: {e}"))
        })?)
        .body(body);

    let message = if details.has_attachments() {
        let mut multipart = MultiPart::mixed().singlepart(body_part);
        for attachment in details
            .attachments
            .iter()
            .chain(details.inline_attachments.iter())
        {
            multipart = multipart.singlepart(attachment_part(attachment)?);
        }
        builder.multipart(multipart)
    } else {
        builder.singlepart(body_part)
    }
    .map_err(|e| SudomailError::invalid_email_contents(e.to_string()))?;

    let raw = String::from_utf8(message.formatted())
        .map_err(|e| SudomailError::internal(format!("serialized message is not UTF-8: {e}")))?;

    // The builder MIME-encodes non-ASCII header values; the wire format this
    // SDK interoperates with carries them as raw UTF-8.
    decode_encoded_words(&raw)
}

/// Encode structured message details into canonical RFC822 UTF-8 bytes.
pub fn encode_to_rfc822_bytes(details: &MessageDetails) -> SudomailResult<Vec<u8>> {
    encode_to_rfc822(details).map(String::into_bytes)
}

/// Decode raw RFC822 text into structured message details.
///
/// Decode is all-or-nothing: any parse failure is logged and propagated with
/// no partial result.
pub fn decode_rfc822(raw: &str) -> SudomailResult<MessageDetails> {
    decode_inner(raw).map_err(|err| {
        tracing::error!(error = %err, "failed to decode RFC822 message");
        err
    })
}

fn decode_inner(raw: &str) -> SudomailResult<MessageDetails> {
    let parsed = parse_mail(raw.as_bytes())?;

    let from = parse_address_list(&parsed, "From")?;
    let reply_to = parse_address_list(&parsed, "Reply-To")?;
    let to = parse_address_list(&parsed, "To")?;
    let cc = parse_address_list(&parsed, "Cc")?;
    let bcc = parse_address_list(&parsed, "Bcc")?;

    let mut bodies = Bodies::default();
    let mut raw_parts = Vec::new();
    collect_parts(&parsed, &mut bodies, &mut raw_parts)?;

    let (body, is_html) = match &bodies.html {
        Some(html) => (html.clone(), true),
        None => (
            bodies.text.as_deref().unwrap_or_default().trim().to_string(),
            false,
        ),
    };

    let encryption_status = match parsed.headers.get_first_value(ENCRYPTION_HEADER_NAME) {
        Some(value) if value == ENCRYPTION_HEADER_VALUE => EncryptionStatus::Encrypted,
        _ => EncryptionStatus::Unencrypted,
    };

    let mut attachments: Vec<EmailAttachment> = Vec::new();
    let mut inline_attachments: Vec<EmailAttachment> = Vec::new();
    for part in raw_parts {
        let inline_attachment = match (&part.content_id, &bodies.html) {
            (Some(id), Some(html)) => html.contains(id.as_str()),
            _ => false,
        };
        let attachment = EmailAttachment {
            data: BASE64.encode(&part.data).trim().to_string(),
            filename: part.filename,
            mime_type: part.mime_type,
            content_transfer_encoding: "base64".to_string(),
            content_id: part.content_id,
            inline_attachment,
        };

        // Some MIME parsers surface inline attachments twice; the first part
        // carrying a given filename wins, checked across both lists.
        let duplicate = attachments
            .iter()
            .chain(inline_attachments.iter())
            .any(|existing| existing.filename == attachment.filename);
        if duplicate {
            continue;
        }
        if inline_attachment {
            inline_attachments.push(attachment);
        } else {
            attachments.push(attachment);
        }
    }

    // Only a single forward-reference id is tracked; the last token of a
    // References list wins.
    let forward_message_id = parsed
        .headers
        .get_first_value("References")
        .as_deref()
        .and_then(|refs| REFERENCES_SPLIT.split(refs).last().map(strip_angle_brackets));
    let reply_message_id = parsed
        .headers
        .get_first_value("In-Reply-To")
        .as_deref()
        .map(strip_angle_brackets);

    let date = parsed
        .headers
        .get_first_value("Date")
        .and_then(|value| mailparse::dateparse(&value).ok())
        .and_then(|ts| time::OffsetDateTime::from_unix_timestamp(ts).ok());

    Ok(MessageDetails {
        from,
        to,
        cc,
        bcc,
        reply_to,
        subject: parsed.headers.get_first_value("Subject"),
        body,
        is_html,
        attachments,
        inline_attachments,
        encryption_status,
        forward_message_id,
        reply_message_id,
        date,
    })
}

/// Textual bodies found while walking the part tree; first match of each
/// kind wins.
#[derive(Default)]
struct Bodies {
    html: Option<String>,
    text: Option<String>,
}

/// A pre-classification attachment part.
struct RawPart {
    data: Vec<u8>,
    filename: String,
    mime_type: String,
    content_id: Option<String>,
}

fn collect_parts(
    part: &ParsedMail<'_>,
    bodies: &mut Bodies,
    raw_parts: &mut Vec<RawPart>,
) -> SudomailResult<()> {
    let mimetype = part.ctype.mimetype.to_ascii_lowercase();
    if mimetype.starts_with("multipart/") {
        for subpart in &part.subparts {
            collect_parts(subpart, bodies, raw_parts)?;
        }
        return Ok(());
    }

    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .cloned()
        .or_else(|| part.ctype.params.get("name").cloned());
    let content_id = part
        .headers
        .get_first_value("Content-ID")
        .as_deref()
        .map(strip_angle_brackets);

    let is_body_candidate = mimetype == mime::TEXT_HTML.essence_str()
        || mimetype == mime::TEXT_PLAIN.essence_str();
    let is_attachment = disposition.disposition == DispositionType::Attachment
        || content_id.is_some()
        || filename.is_some()
        || !is_body_candidate;

    if is_attachment {
        raw_parts.push(RawPart {
            data: part.get_body_raw()?,
            filename: filename.unwrap_or_default(),
            mime_type: part.ctype.mimetype.clone(),
            content_id,
        });
    } else if mimetype == mime::TEXT_HTML.essence_str() {
        if bodies.html.is_none() {
            bodies.html = Some(part.get_body()?);
        }
    } else if bodies.text.is_none() {
        bodies.text = Some(part.get_body()?);
    }

    Ok(())
}

fn parse_address_list(
    parsed: &ParsedMail<'_>,
    header: &str,
) -> SudomailResult<Vec<EmailAddressDetail>> {
    let Some(value) = parsed.headers.get_first_value(header) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for addr in addrparse(&value)?.iter() {
        match addr {
            MailAddr::Single(info) => out.push(EmailAddressDetail {
                email_address: info.addr.clone(),
                display_name: info.display_name.clone(),
            }),
            MailAddr::Group(group) => {
                for info in &group.addrs {
                    out.push(EmailAddressDetail {
                        email_address: info.addr.clone(),
                        display_name: info.display_name.clone(),
                    });
                }
            }
        }
    }
    Ok(out)
}

fn strip_angle_brackets(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}
