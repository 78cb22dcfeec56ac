//! §9 supplement: `{{a.b.c}}` placeholder substitution used by NFO
//! generation and activity-log message formatting. Deliberately small:
//! dotted-path lookup into a `serde_json::Value`, no conditionals or loops.

use serde_json::Value;

/// Replaces every `{{dotted.path}}` placeholder in `template` with the
/// stringified value found by walking `context`. An unresolved path is
/// left as-is (surfacing the typo rather than silently emptying it).
pub fn substitute(template: &str, context: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let path = after_open[..end].trim();
        match lookup(context, path) {
            Some(value) => output.push_str(&stringify(value)),
            None => {
                output.push_str("{{");
                output.push_str(path);
                output.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }
    output.push_str(rest);
    output
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |current, segment| current.get(segment))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_nested_paths() {
        let context = json!({"media": {"title": "Example", "year": 2024}});
        let result = substitute("{{media.title}} ({{media.year}})", &context);
        assert_eq!(result, "Example (2024)");
    }

    #[test]
    fn leaves_unresolved_placeholders_intact() {
        let context = json!({"media": {"title": "Example"}});
        let result = substitute("{{media.missing}}", &context);
        assert_eq!(result, "{{media.missing}}");
    }

    #[test]
    fn handles_templates_with_no_placeholders() {
        assert_eq!(substitute("plain text", &json!({})), "plain text");
    }
}
