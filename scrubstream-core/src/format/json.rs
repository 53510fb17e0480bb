//! Streams of concatenated JSON documents.
//!
//! Documents may be separated by any whitespace; each scrubbed document is
//! written on its own line.

use std::io::{Read, Write};

use serde_json::Value;
use tracing::debug;

use crate::nlp::ModelSet;
use crate::scrubbing::{Disposition, Policy, Scrubber};
use crate::{Result, ScrubError};

fn documents<R: Read>(reader: R) -> impl Iterator<Item = Result<Value>> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<Value>()
        .map(|doc| doc.map_err(|e| ScrubError::serialization("reading JSON document", e)))
}

fn write_line<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| ScrubError::serialization("writing JSON document", e))?;
    writer
        .write_all(b"\n")
        .map_err(|e| ScrubError::io("writing JSON document", e))
}

/// Visits every string leaf with the name it appears under.
///
/// Array elements are named by index, object members by key; top-level
/// strings have no name.
fn visit_strings(value: &Value, names: &[String], visit: &mut dyn FnMut(&str, &[String])) {
    match value {
        Value::String(s) => visit(s, names),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                visit_strings(item, &[i.to_string()], visit);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                visit_strings(item, std::slice::from_ref(key), visit);
            }
        }
        _ => {}
    }
}

/// Scrubs every document of `reader` into `writer`.
///
/// Returns the number of documents written. Stops at the first malformed
/// document.
pub fn scrub_stream<R: Read, W: Write>(reader: R, mut writer: W, scrubber: &Scrubber) -> Result<u64> {
    let mut count = 0u64;
    for doc in documents(reader) {
        let scrubbed = scrubber.scrub_data(doc?, &[]);
        write_line(&mut writer, &scrubbed)?;
        count = count.saturating_add(1);
    }
    writer
        .flush()
        .map_err(|e| ScrubError::io("flushing output", e))?;
    debug!("Scrubbed {} JSON documents", count);
    Ok(count)
}

/// Trains models from string leaves whose field-name rule is `generate(model)`.
///
/// Returns the number of values used for training.
pub fn learn_stream<R: Read>(reader: R, policy: &Policy, models: &mut ModelSet) -> Result<u64> {
    let mut trained = 0u64;
    for doc in documents(reader) {
        visit_strings(&doc?, &[], &mut |value, names| {
            if let Some((Disposition::Generate(name), _)) = policy.match_field_name(names) {
                if let Some(model) = models.get_mut(name) {
                    model.train(value);
                    trained = trained.saturating_add(1);
                }
            }
        });
    }
    Ok(trained)
}

/// Writes, one per line, the string leaves stored under any of `names`.
pub fn extract_stream<R: Read, W: Write>(reader: R, mut writer: W, names: &[String]) -> Result<u64> {
    let mut count = 0u64;
    for doc in documents(reader) {
        let mut found = Vec::new();
        visit_strings(&doc?, &[], &mut |value, field| {
            if field.iter().any(|f| names.contains(f)) {
                found.push(value.to_string());
            }
        });
        for value in found {
            writeln!(writer, "{}", value).map_err(|e| ScrubError::io("writing extracted value", e))?;
            count = count.saturating_add(1);
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::nlp::{DictModel, Model};
    use crate::scrubbing::{FieldNameRule, Masker, ScrubberOptions};

    fn scrubber() -> Scrubber {
        Scrubber::new(
            Arc::new(Policy::default()),
            Arc::new(ModelSet::new()),
            ScrubberOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_scrub_stream() {
        let input = r#"{"email":"joe@foo.com","n":1} {"user":{"email":"ann@bar.org"}}
[1,"two"]"#;
        let mut out = Vec::new();
        let count = scrub_stream(input.as_bytes(), &mut out, &scrubber()).unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["email"], Masker::new("").mask("joe@foo.com"));
        assert_eq!(first["n"], 1);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_ne!(second["user"]["email"], "ann@bar.org");
        assert_eq!(lines[2], r#"[1,"two"]"#);
    }

    #[test]
    fn test_scrub_stream_rejects_malformed_input() {
        let mut out = Vec::new();
        assert!(scrub_stream(r#"{"a":1} {"#.as_bytes(), &mut out, &scrubber()).is_err());
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n");
    }

    #[test]
    fn test_learn_stream() {
        let policy = Policy::empty().with_field_name(
            FieldNameRule::new("^city$", Disposition::Generate("city".to_string())).unwrap(),
        );
        let mut models = ModelSet::new();
        models.insert("city".to_string(), Model::Dict(DictModel::new()));

        let input = r#"{"city":"Springfield","street":"Evergreen"} {"rows":[{"city":"Ogdenville"}]}"#;
        let trained = learn_stream(input.as_bytes(), &policy, &mut models).unwrap();
        assert_eq!(trained, 2);
        assert_eq!(models["city"].recognize("ogdenville"), 1.0);
        assert_eq!(models["city"].recognize("evergreen"), 0.0);
    }

    #[test]
    fn test_extract_stream() {
        let input = r#"{"email":"a@b.c","name":"A"} {"list":[{"email":"d@e.f"}]}"#;
        let mut out = Vec::new();
        let count = extract_stream(input.as_bytes(), &mut out, &["email".to_string()]).unwrap();
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "a@b.c\nd@e.f\n");
    }
}
