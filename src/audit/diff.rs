//! Diff generation for audit logging
//!
//! Produces a one-line, human-readable summary of what changed between two
//! JSON snapshots of an entity, e.g.
//! `name: "Q1" -> "Q1 Close", columns[1].expression: "a - b" -> "a + b"`.

use serde_json::Value;

/// Fields that change on every write and carry no information in a diff
const IGNORED_FIELDS: &[&str] = &["updatedAt", "updated_at"];

/// Generate a human-readable diff between two JSON values
///
/// Objects and equal-length arrays are walked recursively; arrays whose
/// length changed are summarised by item count. Returns `None` when nothing
/// but ignored fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes("", before, after, &mut changes);

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(path: &str, before: &Value, after: &Value, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                if IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let field = join_path(path, key);
                match after_obj.get(key) {
                    Some(after_val) => collect_changes(&field, before_val, after_val, changes),
                    None => changes.push(format!("{}: {} -> (removed)", field, format_value(before_val))),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
                    changes.push(format!(
                        "{}: (added) -> {}",
                        join_path(path, key),
                        format_value(after_val)
                    ));
                }
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr))
            if before_arr.len() == after_arr.len() =>
        {
            for (i, (b, a)) in before_arr.iter().zip(after_arr).enumerate() {
                collect_changes(&format!("{}[{}]", path, i), b, a, changes);
            }
        }
        _ if before != after => {
            let label = if path.is_empty() { "value" } else { path };
            changes.push(format!(
                "{}: {} -> {}",
                label,
                format_value(before),
                format_value(after)
            ));
        }
        _ => {}
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
