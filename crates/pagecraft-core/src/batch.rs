//! Batch records and `{{key}}` placeholder substitution.

use crate::error::{EngineError, EngineResult};
use crate::export::ExportSpec;
use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// One row of batch data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Names the record's output artifact.
    pub id: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl BatchRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder: add a placeholder value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// How unmatched placeholders are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaceholderPolicy {
    /// Leave `{{key}}` in the output verbatim.
    #[default]
    Passthrough,
    /// Fail the record if any placeholder has no value.
    Strict,
}

/// A template page, the records to stamp into it and the output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub template: SceneGraph,
    pub records: Vec<BatchRecord>,
    #[serde(default)]
    pub spec: ExportSpec,
}

impl BatchJob {
    pub fn new(template: SceneGraph, records: Vec<BatchRecord>, spec: ExportSpec) -> Self {
        Self {
            template,
            records,
            spec,
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Self::from_json_with(json, &ExportSpec::default())
    }

    /// Parse a job whose `spec` may be partial; fields it leaves out come
    /// from `defaults`.
    pub fn from_json_with(json: &str, defaults: &ExportSpec) -> EngineResult<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let mut spec = serde_json::to_value(defaults)?;
        if let (Some(base), Some(given)) = (
            spec.as_object_mut(),
            value.get("spec").and_then(serde_json::Value::as_object),
        ) {
            for (key, field) in given {
                base.insert(key.clone(), field.clone());
            }
        }
        if let Some(job) = value.as_object_mut() {
            job.insert("spec".to_string(), spec);
        }

        let job: Self = serde_json::from_value(value)?;
        job.template.validate()?;
        job.spec.validate()?;
        Ok(job)
    }
}

/// Iterator over the keys of `{{key}}` tokens in a string.
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let (key, after) = next_token(self.rest)?;
            self.rest = after;
            if let Some(key) = key {
                return Some(key);
            }
        }
    }
}

/// Find the next token: `(Some(key), rest)` for a well-formed placeholder,
/// `(None, rest)` for an opening brace pair that is not one.
fn next_token(text: &str) -> Option<(Option<&str>, &str)> {
    let start = text.find(OPEN)?;
    let inner = &text[start + OPEN.len()..];
    match inner.find(CLOSE) {
        Some(end) if is_key(&inner[..end]) => Some((Some(&inner[..end]), &inner[end + CLOSE.len()..])),
        _ => Some((None, &text[start + 1..])),
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['{', '}'])
}

/// Keys of every `{{key}}` token in `text`, in order, with repeats.
pub fn placeholders_in(text: &str) -> Placeholders<'_> {
    Placeholders { rest: text }
}

/// Replace every `{{key}}` that has a value; unknown keys stay literal.
pub fn substitute_placeholders(text: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        let inner = &rest[start + OPEN.len()..];
        match inner.find(CLOSE) {
            Some(end) if is_key(&inner[..end]) => {
                let key = &inner[..end];
                out.push_str(&rest[..start]);
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str(OPEN);
                        out.push_str(key);
                        out.push_str(CLOSE);
                    }
                }
                rest = &inner[end + CLOSE.len()..];
            }
            _ => {
                out.push_str(&rest[..=start]);
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Clone `template` and substitute `record` into every text object.
///
/// The template itself is never modified. Object ids are kept so the clone
/// lines up with its template.
pub fn apply_record(
    template: &SceneGraph,
    record: &BatchRecord,
    policy: PlaceholderPolicy,
) -> EngineResult<SceneGraph> {
    if policy == PlaceholderPolicy::Strict {
        let missing = template
            .placeholders()
            .into_iter()
            .find(|key| !record.values.contains_key(key));
        if let Some(key) = missing {
            return Err(EngineError::MissingPlaceholder {
                record: record.id.clone(),
                key,
            });
        }
    }

    let mut page = template.clone();
    page.for_each_text_mut(|text| {
        text.content = substitute_placeholders(&text.content, &record.values);
    });
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FontMetrics, SceneObject, TextContent};
    use kurbo::Point;

    fn template() -> SceneGraph {
        let mut page = SceneGraph::new(400, 300).unwrap();
        page.add(SceneObject::text(
            Point::new(10.0, 10.0),
            TextContent::new("Hello {{name}} from {{city}}", FontMetrics::default()),
        ));
        page
    }

    #[test]
    fn test_partial_job_spec_takes_defaults() {
        let job = BatchJob::new(
            template(),
            vec![BatchRecord::new("a")],
            ExportSpec::new(crate::export::ExportFormat::Pdf).with_bleed(3.0),
        );
        let mut value = serde_json::to_value(&job).unwrap();
        let spec = value["spec"].as_object_mut().unwrap();
        spec.remove("dpi");
        spec.remove("crop_mark_mm");

        let defaults = ExportSpec {
            dpi: 150.0,
            crop_mark_mm: 2.0,
            ..ExportSpec::default()
        };
        let loaded = BatchJob::from_json_with(&value.to_string(), &defaults).unwrap();
        assert_eq!(loaded.spec.format, crate::export::ExportFormat::Pdf);
        assert_eq!(loaded.spec.bleed_mm, 3.0);
        assert_eq!(loaded.spec.dpi, 150.0);
        assert_eq!(loaded.spec.crop_mark_mm, 2.0);
    }

    fn texts(page: &SceneGraph) -> Vec<String> {
        let mut out = Vec::new();
        page.for_each_text(|t| out.push(t.content.clone()));
        out
    }

    #[test]
    fn test_placeholders_in() {
        let keys: Vec<&str> = placeholders_in("{{a}} {b} {{ {{c}} {{}} {{d}}").collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_substitution_complete() {
        let record = BatchRecord::new("r1").with("name", "Ana").with("city", "Lima");
        let page = apply_record(&template(), &record, PlaceholderPolicy::Passthrough).unwrap();
        let content = &texts(&page)[0];
        assert_eq!(content, "Hello Ana from Lima");
        assert!(!content.contains("{{name}}"));
    }

    #[test]
    fn test_missing_key_left_literal() {
        let record = BatchRecord::new("r1").with("name", "Ana");
        let page = apply_record(&template(), &record, PlaceholderPolicy::Passthrough).unwrap();
        assert_eq!(texts(&page)[0], "Hello Ana from {{city}}");
    }

    #[test]
    fn test_strict_rejects_missing_key() {
        let record = BatchRecord::new("r7").with("name", "Ana");
        let err = apply_record(&template(), &record, PlaceholderPolicy::Strict).unwrap_err();
        match err {
            EngineError::MissingPlaceholder { record, key } => {
                assert_eq!(record, "r7");
                assert_eq!(key, "city");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_template_untouched() {
        let template = template();
        let before = template.clone();
        let record = BatchRecord::new("r1").with("name", "Ana");
        let page = apply_record(&template, &record, PlaceholderPolicy::Passthrough).unwrap();
        assert_eq!(template, before);
        assert_eq!(page.objects()[0].id(), template.objects()[0].id());
    }

    #[test]
    fn test_substitute_keeps_stray_braces() {
        let values = BTreeMap::from([("x".to_string(), "1".to_string())]);
        assert_eq!(substitute_placeholders("{{{x}}}", &values), "{1}");
        assert_eq!(substitute_placeholders("a {{ b", &values), "a {{ b");
        assert_eq!(substitute_placeholders("{{x}}{{x}}", &values), "11");
    }

    #[test]
    fn test_values_substituted_once() {
        let values = BTreeMap::from([("a".to_string(), "{{b}}".to_string()), ("b".to_string(), "x".to_string())]);
        assert_eq!(substitute_placeholders("{{a}}", &values), "{{b}}");
    }
}
