//! Progs Configuration Management
//!
//! Loads engine settings from a plain `key = value` text file.

use progs_core::{ProgsError, Result};
use progs_scripting::ExecutionLimits;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/progs.txt";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Instance name used in logs (from "name" option)
    pub name: String,
    /// Statement budget per top-level execution, 0 for unlimited (from "maxsteps" option)
    pub max_steps: u64,
    /// Maximum nested program calls (from "maxcalldepth" option)
    pub max_call_depth: usize,
    /// Host wall-clock budget per execution (from "timeoutms" option)
    pub execution_timeout_ms: u64,
    /// Tracing filter directive (from "loglevel" option)
    pub log_level: String,
    /// Log programs that fail to compile (from "logcompileerrors" option)
    pub log_compile_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "progs".into(),
            max_steps: 100_000,
            max_call_depth: 64,
            execution_timeout_ms: 2000,
            log_level: "info".into(),
            log_compile_errors: true,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(eq_pos) = line.find('=') else {
                return Err(ProgsError::Config(format!(
                    "line {}: expected key = value, found {:?}",
                    number + 1,
                    line
                )));
            };
            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();

            config.parse_option(&key.to_lowercase(), value);
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        let defaults = Self::default();
        match key {
            "name" => self.name = value.into(),
            "maxsteps" => {
                self.max_steps = value.parse().unwrap_or(defaults.max_steps);
            }
            "maxcalldepth" => {
                self.max_call_depth = value.parse().unwrap_or(defaults.max_call_depth);
            }
            "timeoutms" => {
                self.execution_timeout_ms = value.parse().unwrap_or(defaults.execution_timeout_ms);
            }
            "loglevel" => {
                if !value.is_empty() {
                    self.log_level = value.into();
                }
            }
            "logcompileerrors" => {
                self.log_compile_errors = value.parse().unwrap_or(defaults.log_compile_errors);
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Budgets handed to every top-level execution
    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_steps: (self.max_steps > 0).then_some(self.max_steps),
            max_call_depth: self.max_call_depth,
        }
    }

    #[inline]
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Engine configuration [{}]:", self.name);
        if self.max_steps == 0 {
            tracing::info!("    Max steps: unlimited");
        } else {
            tracing::info!("    Max steps: {}", self.max_steps);
        }
        tracing::info!("    Max call depth: {}", self.max_call_depth);
        tracing::info!("    Execution timeout: {} ms", self.execution_timeout_ms);
        tracing::info!("    Log level: {}", self.log_level);
        tracing::info!("    Log compile errors: {}", self.log_compile_errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.name, "progs");
        assert_eq!(config.max_steps, 100_000);
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.execution_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# engine limits
name = Test Engine
MaxSteps = 500
maxcalldepth = 8
loglevel = progs_scripting=debug
logcompileerrors = false
"#;
        let config = EngineConfig::parse(config_text).unwrap();
        assert_eq!(config.name, "Test Engine");
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.log_level, "progs_scripting=debug");
        assert!(!config.log_compile_errors);
        assert_eq!(config.execution_timeout_ms, 2000);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = EngineConfig::parse("maxsteps = lots\ntimeoutms = -5\nunknown = 1\n").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_line_without_equals_is_rejected() {
        let result = EngineConfig::parse("name = ok\nmaxsteps 10\n");
        assert!(matches!(
            result,
            Err(ProgsError::Config(message)) if message.starts_with("line 2")
        ));
    }

    #[test]
    fn test_limits() {
        let mut config = EngineConfig::default();
        assert_eq!(config.limits().max_steps, Some(100_000));
        assert_eq!(config.limits().max_call_depth, 64);

        config.max_steps = 0;
        assert_eq!(config.limits().max_steps, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeoutms = 250").unwrap();

        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.execution_timeout(), Duration::from_millis(250));

        let missing = EngineConfig::load_from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ProgsError::Io(_))));
    }
}
