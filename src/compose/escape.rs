//! Escape guard for literal `#{...}` sequences
//!
//! `#{text}` emits `text` verbatim in the final output, bypassing `${...}`
//! evaluation. Masking replaces each escape span with a content-addressed
//! placeholder (the base64 encoding of the inner text) before evaluation;
//! unmasking restores the literal text afterwards, without re-adding the
//! delimiters. The span ends at the first `}` after `#{`, not a balanced
//! scan.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// One masked escape span: the literal text and its placeholder key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeRecord {
    pub text: String,
    pub key: String,
}

/// Replace every `#{...}` span with its placeholder, returning the masked
/// body and the records needed to undo it.
pub fn mask(body: &str) -> (String, Vec<EscapeRecord>) {
    let mut out = body.to_string();
    let mut records: Vec<EscapeRecord> = Vec::new();
    let mut from = 0;

    while let Some(begin) = out[from..].find("#{").map(|i| i + from) {
        let Some(end) = out[begin + 2..].find('}').map(|i| i + begin + 2) else {
            break;
        };
        let text = out[begin + 2..end].to_string();
        let key = STANDARD.encode(&text);
        out.replace_range(begin..=end, &key);
        from = begin + key.len();
        // An empty escape `#{}` has nothing to restore
        if !text.is_empty() && !records.iter().any(|r| r.key == key) {
            records.push(EscapeRecord { text, key });
        }
    }

    (out, records)
}

/// Restore every placeholder occurrence to its literal text
pub fn unmask(body: &str, records: &[EscapeRecord]) -> String {
    let mut out = body.to_string();
    for record in records {
        out = out.replace(&record.key, &record.text);
    }
    out
}
