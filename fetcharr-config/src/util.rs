//! Small env-var helpers, in the teacher's own `parse_bool_var`/`parse_csv_var` idiom.

use std::str::FromStr;

pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn env_var_parsed<T: FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|raw| raw.parse().ok())
}

/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn env_var_bool(name: &str) -> Option<bool> {
    env_var(name).and_then(|raw| parse_bool(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_env_vars_are_treated_as_absent() {
        std::env::set_var("FETCHARR_TEST_BLANK", "   ");
        assert_eq!(env_var("FETCHARR_TEST_BLANK"), None);
        std::env::remove_var("FETCHARR_TEST_BLANK");
    }

    #[test]
    fn bool_parsing_accepts_common_forms() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
