//! Spring config-file front-end (C1): `application.yml`/`.yaml`/`.properties`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ParseError;

pub struct ConfigFileFrontend;

impl ConfigFileFrontend {
    pub fn parse(&self, path: &Path, source: &str) -> Result<BTreeMap<String, String>, ParseError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => parse_yaml(path, source),
            Some("properties") => Ok(parse_properties(source)),
            other => Err(ParseError::new(path, format!("unsupported config extension: {other:?}"))),
        }
    }
}

fn parse_yaml(path: &Path, source: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(source).map_err(|e| ParseError::new(path, format!("yaml parse error: {e}")))?;
    let mut out = BTreeMap::new();
    flatten_yaml("", &value, &mut out);
    Ok(out)
}

fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = k.as_str().unwrap_or_default();
                let full_key = if prefix.is_empty() { key.to_string() } else { format!("{prefix}.{key}") };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                flatten_yaml(&format!("{prefix}[{i}]"), v, out);
            }
        }
        serde_yaml::Value::Null => {}
        other => {
            let scalar = match other {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
            out.insert(prefix.to_string(), scalar);
        }
    }
}

fn parse_properties(source: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once(['=', ':']) {
            out.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    out
}
