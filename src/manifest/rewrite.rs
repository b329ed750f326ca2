use serde_json::Value;

use crate::foundation::core::STILL_IMAGE_EXTS;

/// Top-level metadata keys whose file references point at attribute images.
pub const RECOGNIZED_ATTRIBUTE_KEYS: &[&str] = &["means", "scales", "quats", "sh0", "shN"];

/// Return a copy of `meta` where every still-image reference below a recognised attribute key
/// is renamed to `<stem>.<video_ext>`. Everything else is copied unchanged.
pub fn rewrite_meta(meta: &Value, video_ext: &str) -> Value {
    let Value::Object(map) = meta else {
        return meta.clone();
    };
    let mut out = serde_json::Map::with_capacity(map.len());
    for (key, value) in map {
        let value = if RECOGNIZED_ATTRIBUTE_KEYS.contains(&key.as_str()) {
            rewrite_value(value, video_ext)
        } else {
            value.clone()
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

fn rewrite_value(value: &Value, video_ext: &str) -> Value {
    match value {
        Value::String(s) => {
            Value::String(rewrite_reference(s, video_ext).unwrap_or_else(|| s.clone()))
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| rewrite_value(v, video_ext)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), rewrite_value(v, video_ext)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// `dir/means_l.webp` → `dir/means_l.mp4`; `None` when `reference` is not a still image.
pub fn rewrite_reference(reference: &str, video_ext: &str) -> Option<String> {
    let (stem, ext) = reference.rsplit_once('.')?;
    let is_image = STILL_IMAGE_EXTS.iter().any(|e| e.eq_ignore_ascii_case(ext));
    if !is_image || stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(format!("{stem}.{video_ext}"))
}

/// Every string below a recognised attribute key that ends in `.<video_ext>`.
pub fn video_references(meta: &Value, video_ext: &str) -> Vec<String> {
    fn collect(value: &Value, suffix: &str, out: &mut Vec<String>) {
        match value {
            Value::String(s) if s.ends_with(suffix) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, suffix, out)),
            Value::Object(map) => map.values().for_each(|v| collect(v, suffix, out)),
            _ => {}
        }
    }

    let suffix = format!(".{video_ext}");
    let mut out = Vec::new();
    if let Value::Object(map) = meta {
        for key in RECOGNIZED_ATTRIBUTE_KEYS {
            if let Some(v) = map.get(*key) {
                collect(v, &suffix, &mut out);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/rewrite.rs"]
mod tests;
