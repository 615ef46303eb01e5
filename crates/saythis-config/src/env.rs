use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in a credential value
///
/// Supports an optional default via `{{ env.VAR | default("fallback") }}`.
/// Credentials are persisted unexpanded, so a config file can reference a
/// secret kept in the environment instead of storing it.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        // Group 1: the key (e.g. `env.VAR_NAME`)
        // Group 2: optional default value inside default("...")
        RE.get_or_init(|| {
            Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("must be valid regex")
        })
    }

    let mut output = String::with_capacity(input.len());
    let mut last_end = 0;

    for captures in re().captures_iter(input) {
        let (Some(overall), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let key = key.as_str();
        let default_value = captures.get(2).map(|m| m.as_str());

        output.push_str(&input[last_end..overall.start()]);

        let mut parts = key.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("env"), Some(var_name), None) => match std::env::var(var_name) {
                Ok(value) => output.push_str(&value),
                Err(_) => match default_value {
                    Some(default) => output.push_str(default),
                    None => return Err(format!("environment variable not found: `{var_name}`")),
                },
            },
            _ => return Err(format!("only variables scoped with 'env.' are supported: `{key}`")),
        }

        last_end = overall.end();
    }

    output.push_str(&input[last_end..]);

    Ok(output)
}
