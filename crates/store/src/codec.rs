//! Record codec: one document per JSON line.

use crate::document::Document;
use neuron_core::{AppError, AppResult};

/// Serialize a document to a single line (no terminator).
///
/// JSON string escaping keeps newlines in content out of the record, so
/// the output never spans lines. Non-finite embedding values are rejected
/// because JSON would write them as `null` and the record would not decode.
pub fn encode(document: &Document) -> AppResult<String> {
    if let Some(pos) = document.embedding.iter().position(|v| !v.is_finite()) {
        return Err(AppError::Serialization(format!(
            "Document '{}' has a non-finite embedding value at index {}",
            document.id, pos
        )));
    }

    Ok(serde_json::to_string(document)?)
}

/// Parse one line back into a document.
///
/// Returns `None` for blank, truncated, or otherwise malformed lines;
/// callers skip those.
pub fn decode(line: &str) -> Option<Document> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Document>(line) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::trace!("Skipping undecodable record: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        let mut doc = Document::new("doc-1", "first line\nsecond line")
            .with_source("file", "manual.pdf")
            .with_embedding(vec![0.1, -2.5, 3.0e-7, 1.0 / 3.0]);
        doc.add_metadata("uploaded_at", "2024-05-01T10:00:00Z");
        doc.add_metadata("nested", json!({"pages": [1, 2, 3], "draft": false}));
        doc
    }

    #[test]
    fn test_encode_is_single_line() {
        let line = encode(&sample()).unwrap();
        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let original = sample();
        let decoded = decode(&encode(&original).unwrap()).unwrap();

        assert_eq!(decoded.id, original.id);
        assert_eq!(decoded.content, original.content);
        assert_eq!(decoded.embedding, original.embedding);
        assert_eq!(decoded.source_type, original.source_type);
        assert_eq!(decoded.source_name, original.source_name);
        assert_eq!(decoded.metadata, original.metadata);
    }

    #[test]
    fn test_score_not_persisted() {
        let mut doc = sample();
        doc.score = Some(0.9);
        let line = encode(&doc).unwrap();
        assert!(!line.contains("score"));
        assert_eq!(decode(&line).unwrap().score, None);
    }

    #[test]
    fn test_record_uses_camel_case_fields() {
        let line = encode(&sample()).unwrap();
        assert!(line.contains("\"sourceType\":\"file\""));
        assert!(line.contains("\"sourceName\":\"manual.pdf\""));
    }

    #[test]
    fn test_decode_invalid_lines() {
        assert!(decode("").is_none());
        assert!(decode("   ").is_none());
        assert!(decode("null").is_none());
        assert!(decode("{\"id\":\"1\",\"content\":\"trunc").is_none());
        assert!(decode("[1,2,3]").is_none());
    }

    #[test]
    fn test_decode_without_optional_fields() {
        let doc = decode(r#"{"id":"1","content":"bare"}"#).unwrap();
        assert!(!doc.has_embedding());
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.source_type, "");
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let doc = Document::new("x", "nan").with_embedding(vec![0.0, f32::NAN]);
        assert!(matches!(encode(&doc), Err(AppError::Serialization(_))));
    }
}
