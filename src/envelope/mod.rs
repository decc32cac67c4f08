/*!
# Payload Envelope

Wraps a transformed PHP file into a self-decoding stub:

```text
<?php {preamble}$_k="{key}";$_d=base64_decode('{payload}');$_r='';
for($_i=0;$_i<strlen($_d);$_i++)$_r.=chr(ord($_d[$_i])^ord($_k[$_i%strlen($_k)]));eval($_r);
```

(one line in the output). `payload` is base64 of the XOR of the eval body
with the key text. The eval body is the file with its opening `<?php` tag
removed; a file that starts with inline HTML gets a leading `?>` instead so
the interpreter switches back to HTML mode.

[`decode_envelope`] reverses the transform on the Rust side.
*/

pub mod cipher;
pub mod preamble;

pub use cipher::{xor_cipher, EncryptionKey};
pub use preamble::build_preamble;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::configuration::DebugDisablingConfig;
use crate::core::{ObfuscatorError, ObfuscatorResult};

const OPEN_TAG: &str = "<?php";

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\$_k="([^"]*)";"#).unwrap());

static PAYLOAD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$_d=base64_decode\('([A-Za-z0-9+/=]*)'\);").unwrap());

/// Text handed to `eval` for a printed source file.
pub fn eval_body(source: &str) -> String {
    let has_open_tag = source
        .get(..OPEN_TAG.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(OPEN_TAG));
    if has_open_tag {
        let rest = &source[OPEN_TAG.len()..];
        match rest.chars().next() {
            None => return String::new(),
            Some(c) if c.is_whitespace() => return rest[c.len_utf8()..].to_string(),
            Some(_) => {}
        }
    }
    format!("?>{}", source)
}

/// Builds envelopes with the run key and a fixed preamble
#[derive(Debug, Clone)]
pub struct EnvelopeEncoder {
    key: EncryptionKey,
    preamble: String,
}

impl EnvelopeEncoder {
    pub fn new(key: EncryptionKey, debug: &DebugDisablingConfig) -> Self {
        Self {
            key,
            preamble: build_preamble(debug),
        }
    }

    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Envelope for a printed source file
    pub fn encode(&self, source: &str) -> String {
        let body = eval_body(source);
        let payload = STANDARD.encode(xor_cipher(body.as_bytes(), self.key.as_bytes()));
        format!(
            "<?php {}$_k=\"{}\";$_d=base64_decode('{}');$_r='';for($_i=0;$_i<strlen($_d);$_i++)$_r.=chr(ord($_d[$_i])^ord($_k[$_i%strlen($_k)]));eval($_r);",
            self.preamble, self.key, payload
        )
    }
}

/// Key and eval body recovered from an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEnvelope {
    pub key: EncryptionKey,
    pub body: String,
}

impl DecodedEnvelope {
    /// Body turned back into a standalone PHP file
    pub fn to_source_file(&self) -> String {
        match self.body.strip_prefix("?>") {
            Some(html) => html.to_string(),
            None => format!("{}\n{}", OPEN_TAG, self.body),
        }
    }
}

/// Extracts key and payload from an envelope and reverses the XOR.
pub fn decode_envelope(text: &str) -> ObfuscatorResult<DecodedEnvelope> {
    let key = KEY_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ObfuscatorError::Envelope("key assignment not found".to_string()))?;
    let key = EncryptionKey::from_hex(key.as_str())?;

    let payload = PAYLOAD_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ObfuscatorError::Envelope("payload not found".to_string()))?;

    let encrypted = STANDARD
        .decode(payload.as_str())
        .map_err(|e| ObfuscatorError::Envelope(format!("invalid base64 payload: {}", e)))?;

    let body = String::from_utf8(xor_cipher(&encrypted, key.as_bytes()))
        .map_err(|_| ObfuscatorError::Envelope("decoded body is not UTF-8".to_string()))?;

    Ok(DecodedEnvelope { key, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoder(key: &str) -> EnvelopeEncoder {
        EnvelopeEncoder::new(
            EncryptionKey::from_hex(key).unwrap(),
            &DebugDisablingConfig::disabled(),
        )
    }

    #[test]
    fn test_eval_body() {
        assert_eq!(eval_body("<?php\necho 1;"), "echo 1;");
        assert_eq!(eval_body("<?PHP echo 1;"), "echo 1;");
        assert_eq!(eval_body("<?php"), "");
        assert_eq!(eval_body("<html><?php echo 1; ?>"), "?><html><?php echo 1; ?>");
    }

    #[test]
    fn test_exact_envelope_format() {
        let envelope = encoder("00").encode("<?php A");
        // "A" ^ "0" == "q", base64("q") == "cQ=="
        assert_eq!(
            envelope,
            "<?php $_k=\"00\";$_d=base64_decode('cQ==');$_r='';for($_i=0;$_i<strlen($_d);$_i++)$_r.=chr(ord($_d[$_i])^ord($_k[$_i%strlen($_k)]));eval($_r);"
        );
    }

    #[test]
    fn test_preamble_precedes_key() {
        let encoder = EnvelopeEncoder::new(
            EncryptionKey::generate(4),
            &DebugDisablingConfig::default(),
        );
        let envelope = encoder.encode("<?php echo 1;");
        assert!(envelope.starts_with("<?php error_reporting(0);"));
        let key_at = envelope.find("$_k=").unwrap();
        assert!(envelope.find("http_response_code(404)").unwrap() < key_at);
        assert!(envelope.ends_with("eval($_r);"));
    }

    #[test]
    fn test_decode_reverses_encode() {
        let encoder = EnvelopeEncoder::new(
            EncryptionKey::generate(16),
            &DebugDisablingConfig::default(),
        );
        let source = "<?php\nclass A { function ƒ() { return \"ünïcode\"; } }\n";
        let decoded = decode_envelope(&encoder.encode(source)).unwrap();
        assert_eq!(&decoded.key, encoder.key());
        assert_eq!(decoded.body, eval_body(source));
        assert_eq!(decoded.to_source_file(), source);
    }

    #[test]
    fn test_decode_inline_html_file() {
        let source = "<div><?php echo 1; ?></div>";
        let decoded = decode_envelope(&encoder("a1b2").encode(source)).unwrap();
        assert_eq!(decoded.to_source_file(), source);
    }

    #[test]
    fn test_decode_rejects_plain_php() {
        let error = decode_envelope("<?php echo 1;").unwrap_err();
        assert!(matches!(error, ObfuscatorError::Envelope(_)));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let error = decode_envelope("<?php $_k=\"ab\";$_d=base64_decode('@@');").unwrap_err();
        assert!(matches!(error, ObfuscatorError::Envelope(_)));
    }
}
