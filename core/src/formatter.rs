//! Quoting formatter for replies and forwards
//!
//! Pure string transformations: given a previous message's details, build an
//! HTML quoted fragment and splice it into a new message's body and subject.
//! The result is later fed to the RFC822 codec; nothing here touches the wire
//! format itself.

use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::message::{EmailAddressDetail, MessageDetails};
use crate::rfc822::address_to_string;

/// Quoted HTML from other clients may embed arbitrary images; replies strip
/// them for cross-client consistency. The replacement text must match the
/// existing stripping convention byte for byte.
static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<img.*?>").unwrap());

const IMAGE_REMOVED: &str = "-IMAGE REMOVED-<br/>";

/// e.g. `Tuesday, 2 June 2020 at 9:47 AM`
const QUOTE_DATE_FORMAT: &[FormatItem<'_>] = format_description!(
    "[weekday repr:long], [day padding:none] [month repr:long] [year] at [hour repr:12 padding:none]:[minute] [period]"
);

/// Populate `message` as a reply to `reply_message`.
///
/// Fills in an empty subject with `Re: `, appends the quoted fragment to the
/// body, and forces HTML (the quote always carries markup).
pub fn format_as_replying_message(
    mut message: MessageDetails,
    reply_message: &MessageDetails,
) -> MessageDetails {
    if message.subject.as_deref().map_or(true, str::is_empty) {
        message.subject = Some(format!(
            "Re: {}",
            reply_message.subject.as_deref().unwrap_or_default()
        ));
    }
    message.body = format!("{}\n\n{}", message.body, encode_reply_message(reply_message));
    message.is_html = true;
    message
}

/// Populate `message` as a forward of `forward_message`.
pub fn format_as_forwarding_message(
    mut message: MessageDetails,
    forward_message: &MessageDetails,
) -> MessageDetails {
    if message.subject.as_deref().map_or(true, str::is_empty) {
        message.subject = Some(format!(
            "Fwd: {}",
            forward_message.subject.as_deref().unwrap_or_default()
        ));
    }
    message.body = format!(
        "{}\n\n{}",
        message.body,
        encode_forward_message(forward_message)
    );
    message.is_html = true;
    message
}

/// Build the quoted-reply HTML fragment for `details`.
///
/// Quoted body content has every `<img ...>` tag replaced; this is the only
/// place in the codec/formatter pair that mutates quoted content.
pub fn encode_reply_message(details: &MessageDetails) -> String {
    let mut lines: Vec<String> = Vec::new();
    for _ in 0..4 {
        lines.push("<div class=\"replyMessage\"><br/></div>".to_string());
    }
    lines.push("<hr>".to_string());

    if !details.from.is_empty() {
        lines.push(format!(
            "<div class=\"replyMessage\">From: {}</div>",
            join_addresses(&details.from)
        ));
    }
    if let Some(date) = details.date {
        lines.push(format!(
            "<div class=\"replyMessage\">Date: {}</div>",
            format_quote_date(date)
        ));
    }
    lines.push(format!(
        "<div class=\"replyMessage\">Subject: {}</div>",
        details.subject.as_deref().unwrap_or_default()
    ));
    lines.push(format!(
        "<div class=\"replyMessage\">{}</div>",
        strip_images(&details.body)
    ));

    lines.join("\n")
}

/// Build the quoted-forward HTML fragment for `details`.
///
/// Unlike replies, the forwarded body is carried unmodified.
pub fn encode_forward_message(details: &MessageDetails) -> String {
    let mut lines: Vec<String> = Vec::new();
    for _ in 0..4 {
        lines.push("<div class=\"forwardMessage\"><br/></div>".to_string());
    }
    lines.push(
        "<div class=\"forwardMessage\">---------- Forwarded message ----------</div>".to_string(),
    );

    if !details.from.is_empty() {
        lines.push(format!(
            "<div class=\"forwardMessage\">From: {}</div>",
            join_addresses(&details.from)
        ));
    }
    if let Some(date) = details.date {
        lines.push(format!(
            "<div class=\"forwardMessage\">Date: {}</div>",
            format_quote_date(date)
        ));
    }
    lines.push(format!(
        "<div class=\"forwardMessage\">Subject: {}</div>",
        details.subject.as_deref().unwrap_or_default()
    ));

    if !details.to.is_empty() || !details.cc.is_empty() {
        let mut recipients = String::new();
        if !details.to.is_empty() {
            recipients.push_str(&format!("To: {}<br/>", join_addresses(&details.to)));
        }
        if !details.cc.is_empty() {
            recipients.push_str(&format!("Cc: {}<br/>", join_addresses(&details.cc)));
        }
        lines.push(format!("<div class=\"forwardMessage\">{recipients}</div>"));
    }

    lines.push(format!("<div class=\"forwardMessage\">{}</div>", details.body));

    lines.join("\n")
}

/// Format a date for a quote header, e.g. `Friday, 10 May 2024 at 1:36 PM`.
pub fn format_quote_date(date: OffsetDateTime) -> String {
    // An OffsetDateTime carries every component the description needs.
    date.format(QUOTE_DATE_FORMAT)
        .expect("quote date format is total over OffsetDateTime")
}

fn join_addresses(addresses: &[EmailAddressDetail]) -> String {
    addresses
        .iter()
        .map(address_to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn strip_images(body: &str) -> String {
    IMG_TAG.replace_all(body, IMAGE_REMOVED).into_owned()
}
