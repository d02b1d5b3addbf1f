//! Shared helpers for command handlers.

use std::io::IsTerminal;

use serde_json::Value;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a command-line value as JSON; anything that isn't valid JSON is
/// taken as a string (`direct` → `"direct"`).
pub fn parse_json_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_arguments() {
        assert_eq!(parse_json_arg("80"), json!(80));
        assert_eq!(parse_json_arg("true"), json!(true));
        assert_eq!(parse_json_arg(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_json_arg("direct"), json!("direct"));
        assert_eq!(parse_json_arg("1920x1080P50"), json!("1920x1080P50"));
    }
}
