use serde::Deserialize;
use serde_yaml::Value;

/// Parses every document of a YAML stream.
///
/// A stream holding nothing but blank lines and comments has no documents.
pub fn load_all(s: &str) -> anyhow::Result<Vec<Value>> {
    if is_blank(s) {
        return Ok(Vec::new());
    }

    serde_yaml::Deserializer::from_str(s)
        .map(|document| Value::deserialize(document).map_err(Into::into))
        .collect()
}

fn is_blank(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

/// Serializes `documents` as one YAML stream, separated by `---`.
pub fn dump_all(documents: &[Value]) -> anyhow::Result<String> {
    let mut out = String::new();
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(out)
}
