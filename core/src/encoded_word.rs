//! RFC2047 encoded-word post-processing
//!
//! The MIME builder serializes header values containing non-ASCII text as
//! RFC2047 encoded words (`=?charset?encoding?value?=`). The wire format this
//! SDK interoperates with carries those header values as raw UTF-8 instead,
//! so after serialization every encoded word is decoded back in place. The
//! builder only ever emits Base64 (`B`) words; any other scheme is an
//! unrecoverable defect in the encoding assumptions.
//!
//! Kept as a standalone text-to-text pass so it can be tested and evolved
//! independently of the serialization step.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{SudomailError, SudomailResult};

static ENCODED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\?([^?\s]*)\?([A-Za-z])\?([^?\s]*)\?=").unwrap());

/// Replace every RFC2047 encoded word in `raw` with its decoded plaintext.
///
/// An encoded word with an empty payload is left exactly as written. An
/// encoding scheme other than `B` is fatal.
pub fn decode_encoded_words(raw: &str) -> SudomailResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in ENCODED_WORD.captures_iter(raw) {
        let whole = caps.get(0).expect("capture 0 always present");
        let encoding = &caps[2];
        let payload = &caps[3];

        out.push_str(&raw[last..whole.start()]);
        if payload.is_empty() {
            out.push_str(whole.as_str());
        } else if encoding.eq_ignore_ascii_case("b") {
            let bytes = BASE64.decode(payload)?;
            let text = String::from_utf8(bytes).map_err(|e| {
                SudomailError::internal(format!("encoded word is not valid UTF-8: {e}"))
            })?;
            out.push_str(&text);
        } else {
            return Err(SudomailError::unsupported_header_encoding(format!(
                "expected Base64 (B) encoded word, got {encoding:?}"
            )));
        }
        last = whole.end();
    }

    out.push_str(&raw[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_base64_word() {
        let raw = "Subject: =?utf-8?B?SMOpbGxv?=\r\n";
        assert_eq!(decode_encoded_words(raw).unwrap(), "Subject: Héllo\r\n");
    }

    #[test]
    fn test_decodes_lowercase_encoding_letter() {
        let raw = "=?utf-8?b?SGVsbG8=?=";
        assert_eq!(decode_encoded_words(raw).unwrap(), "Hello");
    }

    #[test]
    fn test_empty_payload_is_left_undecoded() {
        let raw = "Subject: =?utf-8?B??=\r\n";
        assert_eq!(decode_encoded_words(raw).unwrap(), raw);
    }

    #[test]
    fn test_multiple_words_in_one_pass() {
        let raw = "From: =?utf-8?B?QWxpY2U=?= <a@x.com>\r\nSubject: =?utf-8?B?SGk=?=\r\n";
        assert_eq!(
            decode_encoded_words(raw).unwrap(),
            "From: Alice <a@x.com>\r\nSubject: Hi\r\n"
        );
    }

    #[test]
    fn test_non_base64_encoding_is_fatal() {
        let raw = "Subject: =?utf-8?Q?Hello?=\r\n";
        let err = decode_encoded_words(raw).unwrap_err();
        assert!(matches!(err, SudomailError::UnsupportedHeaderEncoding(_)));
    }

    #[test]
    fn test_text_without_encoded_words_is_untouched() {
        let raw = "Subject: plain ascii\r\n\r\nbody";
        assert_eq!(decode_encoded_words(raw).unwrap(), raw);
    }
}
