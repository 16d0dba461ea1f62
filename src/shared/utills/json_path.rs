//! Dotted-path lookup into the JSON projection of the aggregate
//!
//! Paths look like `companyInfo.headOfficeAddress.city`. A segment ending in
//! `[]` fans out over every element of an array, e.g.
//! `businessLocations[].name`.

use serde_json::Value;

/// Value at a plain dotted path, without array fan-out
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| current.get(segment))
}

/// Every value reachable through `path`, fanning out on `[]` segments.
///
/// Missing keys contribute `Value::Null` so callers can count them as empty.
pub fn values_at<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current: Vec<&Value> = vec![root];
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (key, fan_out) = match segment.strip_suffix("[]") {
            Some(key) => (key, true),
            None => (segment, false),
        };
        let mut next = Vec::new();
        for value in current {
            let child = value.get(key).unwrap_or(&Value::Null);
            if fan_out {
                if let Some(items) = child.as_array() {
                    next.extend(items.iter());
                }
            } else {
                next.push(child);
            }
        }
        current = next;
    }
    current
}

/// Last path segment with any `[]` suffix removed
pub fn leaf_name(path: &str) -> &str {
    let leaf = path.rsplit('.').next().unwrap_or(path);
    leaf.strip_suffix("[]").unwrap_or(leaf)
}

/// Null, blank string or empty collection
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "companyInfo": { "headOfficeAddress": { "city": "Brno" } },
            "businessLocations": [
                { "name": "A", "mccCode": "5812" },
                { "name": "", "mccCode": null }
            ]
        })
    }

    #[test]
    fn plain_path() {
        let doc = doc();
        assert_eq!(
            value_at(&doc, "companyInfo.headOfficeAddress.city"),
            Some(&json!("Brno"))
        );
        assert_eq!(value_at(&doc, "companyInfo.missing"), None);
    }

    #[test]
    fn fan_out_path() {
        let doc = doc();
        let names = values_at(&doc, "businessLocations[].name");
        assert_eq!(names, vec![&json!("A"), &json!("")]);
        let blanks = values_at(&doc, "businessLocations[].mccCode")
            .into_iter()
            .filter(|v| is_blank(v))
            .count();
        assert_eq!(blanks, 1);
    }

    #[test]
    fn missing_key_yields_null() {
        let doc = doc();
        assert_eq!(values_at(&doc, "contactInfo.email"), vec![&Value::Null]);
        assert_eq!(leaf_name("businessLocations[]"), "businessLocations");
        assert_eq!(leaf_name("contactInfo.email"), "email");
    }
}
