/// Configuration loading from the process environment
use crate::config::types::{ExecError, ExecutionConfig, MemoryLimit, Result, Runtime};
use std::path::PathBuf;

pub const ENV_TIMEOUT: &str = "EXECUTION_TIMEOUT";
pub const ENV_MAX_MEMORY: &str = "MAX_MEMORY";
pub const ENV_INTERPRETER: &str = "EXECUTION_INTERPRETER";
pub const ENV_WORKSPACE_ROOT: &str = "EXECUTION_WORKSPACE_ROOT";

impl ExecutionConfig {
    /// Load configuration from the current process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_TIMEOUT) {
            let seconds = parse_timeout(&raw)?;
            config = config.with_timeout_seconds(seconds)?;
        }

        if let Some(raw) = get(ENV_MAX_MEMORY) {
            config.memory_limit = MemoryLimit::parse(&raw);
        }
        if !config.memory_limit.is_valid() {
            log::warn!(
                "{}={} is not a recognised size; keeping it as an advisory token",
                ENV_MAX_MEMORY,
                config.memory_limit
            );
        }

        if let Some(program) = get(ENV_INTERPRETER) {
            config.runtime = Runtime::python(program.trim());
        }

        if let Some(root) = get(ENV_WORKSPACE_ROOT) {
            config.workspace_root = PathBuf::from(root);
        }

        log::debug!(
            "Loaded execution config: timeout={}s memory={} (advisory) interpreter={}",
            config.timeout_seconds,
            config.memory_limit,
            config.runtime.program
        );

        Ok(config)
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| {
        ExecError::Config(format!(
            "{} must be a positive integer number of seconds, got {:?}: {}",
            ENV_TIMEOUT, raw, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = ExecutionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.memory_limit.token, "128m");
        assert_eq!(config.runtime.program, "python3");
        assert_eq!(config.workspace_root, std::env::temp_dir());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ExecutionConfig::from_lookup(lookup(&[
            (ENV_TIMEOUT, " 5 "),
            (ENV_MAX_MEMORY, "256m"),
            (ENV_INTERPRETER, "/opt/python/bin/python3"),
            (ENV_WORKSPACE_ROOT, "/var/tmp/execbox"),
        ]))
        .unwrap();
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.memory_limit.bytes, Some(256 * 1024 * 1024));
        assert_eq!(config.runtime.program, "/opt/python/bin/python3");
        assert_eq!(config.workspace_root, PathBuf::from("/var/tmp/execbox"));
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        for raw in ["abc", "-3", "1.5", "0"] {
            let err = ExecutionConfig::from_lookup(lookup(&[(ENV_TIMEOUT, raw)])).unwrap_err();
            assert!(matches!(err, ExecError::Config(_)), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config =
            ExecutionConfig::from_lookup(lookup(&[(ENV_TIMEOUT, "  "), (ENV_INTERPRETER, "")]))
                .unwrap();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.runtime.program, "python3");
    }

    #[test]
    fn test_unparseable_memory_is_advisory() {
        let config = ExecutionConfig::from_lookup(lookup(&[(ENV_MAX_MEMORY, "plenty")])).unwrap();
        assert_eq!(config.memory_limit.token, "plenty");
        assert!(config.memory_limit.bytes.is_none());
    }
}
