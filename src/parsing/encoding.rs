//! Encoding detection and permissive decoding.
//!
//! KakaoTalk exports arrive as UTF-8 (mobile), UTF-8 with BOM (PC), or the
//! legacy Korean code page when re-saved by older Windows tools. Detection
//! inspects only a leading sample of the buffer.

use std::borrow::Cow;

use encoding_rs::{EUC_KR, Encoding, UTF_8};

/// Text decoded from raw export bytes.
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Decoded content, BOM removed.
    pub text: String,
    /// Encoding that produced `text`.
    pub encoding: &'static Encoding,
    /// `true` when undecodable bytes were replaced with U+FFFD.
    pub lossy: bool,
}

/// Returns the best-guess encoding for `bytes`, looking at most at
/// `sample_len` leading bytes.
///
/// Order of evidence: byte-order mark, valid UTF-8, clean EUC-KR (CP949).
/// Inconclusive input defaults to UTF-8.
///
/// # Example
///
/// ```rust
/// use kakaopack::parsing::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding("안녕".as_bytes(), 1024).name(), "UTF-8");
/// assert_eq!(detect_encoding(&[0xBE, 0xC8, 0xB3, 0xE7], 1024).name(), "EUC-KR");
/// ```
pub fn detect_encoding(bytes: &[u8], sample_len: usize) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let sample = &bytes[..bytes.len().min(sample_len)];
    let truncated = sample.len() < bytes.len();

    match std::str::from_utf8(sample) {
        Ok(_) => return UTF_8,
        // The sample cut a multi-byte sequence in half; everything before it was valid.
        Err(e) if truncated && e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let legacy_sample = if truncated {
        trim_to_ascii_boundary(sample)
    } else {
        sample
    };
    if EUC_KR
        .decode_without_bom_handling_and_without_replacement(legacy_sample)
        .is_some()
    {
        return EUC_KR;
    }

    UTF_8
}

/// Decodes `bytes` with `encoding`, never failing.
///
/// If the guessed decoder hits malformed input the whole buffer is decoded
/// again as UTF-8 with replacement characters, and the result is marked lossy.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, used, had_errors) = encoding.decode(bytes);
    if !had_errors {
        return DecodedText {
            text: text.into_owned(),
            encoding: used,
            lossy: false,
        };
    }

    tracing::warn!(
        encoding = used.name(),
        "decoding reported errors, falling back to lossy UTF-8"
    );
    let (text, _) = UTF_8.decode_with_bom_removal(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8,
        lossy: true,
    }
}

/// Decodes `bytes` with exactly `encoding`, returning `None` on any malformed
/// sequence. A BOM matching `encoding` is stripped.
pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
}

/// Cuts the slice after its last ASCII byte so a truncated double-byte
/// character does not make a legacy decoder report an error.
fn trim_to_ascii_boundary(sample: &[u8]) -> &[u8] {
    match sample.iter().rposition(u8::is_ascii) {
        Some(pos) => &sample[..=pos],
        None => sample,
    }
}
