use serde::de::DeserializeOwned;

/// Non-fatal findings from loading a `kls.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys the config schema does not know, as dotted paths (`scripts.enabeld`).
    pub unknown_keys: Vec<String>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty()
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_ignored_path(&path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

/// `serde_ignored` renders `.a.b.0`; TOML users read `a.b[0]`.
fn normalize_ignored_path(path: &serde_ignored::Path<'_>) -> String {
    let raw = path.to_string();
    raw.trim_start_matches('.')
        .split('.')
        .enumerate()
        .fold(String::new(), |mut out, (idx, segment)| {
            if idx > 0 && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                out.push('[');
                out.push_str(segment);
                out.push(']');
                return out;
            }
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
            out
        })
}
