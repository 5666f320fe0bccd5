//! Secret reference resolver.
//!
//! Values in `config.toml` can reference secrets stored outside the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store`, returns first line
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - anything else is returned as-is

use std::process::Command;

/// Resolves a value that may contain a secret reference prefix.
///
/// # Errors
///
/// Returns a message naming the reference if it cannot be resolved.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if `value` is a reference rather than a literal.
pub fn is_reference(value: &str) -> bool {
    value.starts_with("pass::") || value.starts_with("env::")
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hunter2").unwrap(), "hunter2");
        assert_eq!(resolve("").unwrap(), "");
        assert!(!is_reference("hunter2"));
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_COURTWATCH_TEST_SMTP", "smtp-secret");
        }
        assert!(is_reference("env::_COURTWATCH_TEST_SMTP"));
        assert_eq!(resolve("env::_COURTWATCH_TEST_SMTP").unwrap(), "smtp-secret");
        unsafe {
            std::env::remove_var("_COURTWATCH_TEST_SMTP");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_COURTWATCH_NONEXISTENT_VAR_31337").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        assert!(resolve("pass::courtwatch/does/not/exist/31337").is_err());
    }
}
