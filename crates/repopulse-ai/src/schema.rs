use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One translated record, as the model is asked to return it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationEntry {
    /// Zero-based position in the request
    pub index: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Decode the records of the first JSON array in a model reply.
///
/// Code fences and chatter around the array are ignored. Records are read one
/// at a time, so a reply cut off mid-array still yields every record that was
/// complete before the break. Records of the wrong shape are skipped.
pub fn parse_entries(reply: &str) -> Result<Vec<TranslationEntry>> {
    let start = reply
        .find('[')
        .ok_or_else(|| Error::ParseError("no JSON array in model reply".to_string()))?;

    let mut entries = Vec::new();
    let mut rest = &reply[start + 1..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() || rest.starts_with(']') {
            break;
        }

        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(value)) => {
                match serde_json::from_value::<TranslationEntry>(value) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => tracing::debug!("Skipping malformed translation record: {}", e),
                }
                rest = &rest[stream.byte_offset()..];
            }
            Some(Err(e)) => {
                tracing::debug!("Translation reply ends early after {} records: {}", entries.len(), e);
                break;
            }
            None => break,
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Here you go:\n```json\n[{\"index\":0,\"name\":\"名称\"}]\n```";
        let entries = parse_entries(reply).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.as_deref(), Some("名称"));
        assert!(entries[0].description.is_none());
    }

    #[test]
    fn test_cut_off_reply_keeps_complete_records() {
        let reply = r#"[{"index":0,"name":"甲","description":"一"},{"index":1,"name":"乙","description":"二"},{"index":2,"name":"丙","descr"#;
        let entries = parse_entries(reply).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].index, 1);
        assert_eq!(entries[1].name.as_deref(), Some("乙"));
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let reply = r#"[{"index":0,"name":"甲"}, "oops", {"index":2,"name":"丙"}]"#;
        let entries = parse_entries(reply).unwrap();
        assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_no_array_is_parse_error() {
        assert!(matches!(parse_entries("sorry"), Err(Error::ParseError(_))));
    }
}
