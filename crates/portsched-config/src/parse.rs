//! TOML parsing, serialization, and validation for pool definitions.
//!
//! Pool definitions are stored as `.pool.toml` files; a full issue-model
//! description (scheduler parameters plus pool) uses the same loader via
//! the `CoreConfig` functions.

use std::collections::BTreeSet;
use std::path::Path;

use crate::desc::{CoreConfig, FuPoolConfig};
use crate::error::{ConfigError, Result};

/// A validation issue found in a pool definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: "error",
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: "warning",
            message,
        }
    }

    /// Whether this issue rejects the definition.
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Load a pool from a `.pool.toml` file.
pub fn load_pool_toml(path: &Path) -> Result<FuPoolConfig> {
    let content = read_existing(path)?;
    parse_pool_toml(&content)
}

/// Parse a pool from a TOML string.
pub fn parse_pool_toml(toml_str: &str) -> Result<FuPoolConfig> {
    let pool: FuPoolConfig = toml::from_str(toml_str)?;
    Ok(pool)
}

/// Serialize a pool to pretty TOML.
pub fn pool_to_toml(pool: &FuPoolConfig) -> Result<String> {
    let toml_str = toml::to_string_pretty(pool)?;
    Ok(toml_str)
}

/// Load a full issue-model description from a TOML file.
pub fn load_core_toml(path: &Path) -> Result<CoreConfig> {
    let content = read_existing(path)?;
    parse_core_toml(&content)
}

/// Parse a full issue-model description from a TOML string.
pub fn parse_core_toml(toml_str: &str) -> Result<CoreConfig> {
    let core: CoreConfig = toml::from_str(toml_str)?;
    Ok(core)
}

/// Serialize a full issue-model description to pretty TOML.
pub fn core_to_toml(core: &CoreConfig) -> Result<String> {
    let toml_str = toml::to_string_pretty(core)?;
    Ok(toml_str)
}

fn read_existing(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Validate a pool definition for structural correctness.
///
/// Returns `Ok(())` if there are no issues, or `Err(issues)` otherwise.
/// Warnings alone also produce `Err`; callers that only care about
/// rejection should filter with [`ValidationIssue::is_error`].
pub fn validate_pool(pool: &FuPoolConfig) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if pool.units.is_empty() {
        issues.push(ValidationIssue::error(format!(
            "pool '{}' declares no units",
            pool.name
        )));
    } else if pool.total_replicas() == 0 {
        issues.push(ValidationIssue::error(format!(
            "pool '{}' has no replicas (every unit has count 0)",
            pool.name
        )));
    }

    for (idx, unit) in pool.units.iter().enumerate() {
        if unit.name.trim().is_empty() {
            issues.push(ValidationIssue::error(format!("unit {idx} has an empty name")));
        }
        if unit.count == 0 {
            issues.push(ValidationIssue::warning(format!(
                "unit {idx} ('{}') has count 0 and will never be granted",
                unit.name
            )));
        }
        if unit.op_list.is_empty() {
            issues.push(ValidationIssue::warning(format!(
                "unit {idx} ('{}') declares no operation classes",
                unit.name
            )));
        }

        let mut seen = BTreeSet::new();
        for op in &unit.op_list {
            if op.latency == 0 {
                issues.push(ValidationIssue::error(format!(
                    "unit {idx} ('{}') declares zero latency for {}",
                    unit.name, op.op_class
                )));
            }
            if !seen.insert(op.op_class) {
                issues.push(ValidationIssue::error(format!(
                    "unit {idx} ('{}') declares {} more than once",
                    unit.name, op.op_class
                )));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Run [`validate_pool`] and turn any error-severity issues into a
/// single [`ConfigError::Validation`].
pub fn require_valid(pool: &FuPoolConfig) -> Result<()> {
    let Err(issues) = validate_pool(pool) else {
        return Ok(());
    };
    let errors: Vec<String> = issues
        .into_iter()
        .filter(ValidationIssue::is_error)
        .map(|i| i.message)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            detail: errors.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{FuDesc, OpDesc};
    use crate::op_class::OpClass;
    use crate::presets;

    #[test]
    fn round_trip_default_x86() {
        let original = presets::default_x86();
        let toml_str = pool_to_toml(&original).unwrap();
        let parsed = parse_pool_toml(&toml_str).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn round_trip_xeon_core() {
        let original = presets::xeon_o3();
        let toml_str = core_to_toml(&original).unwrap();
        let parsed = parse_core_toml(&toml_str).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml_str = r#"
name = "two-port"

[[units]]
name = "alu"
count = 1

[[units.op-list]]
op-class = "IntAlu"

[[units]]
name = "div"
count = 1

[[units.op-list]]
op-class = "IntDiv"
latency = 4
pipelined = false
"#;
        let pool = parse_pool_toml(toml_str).unwrap();
        assert_eq!(pool.name, "two-port");
        assert_eq!(pool.units.len(), 2);
        assert_eq!(pool.units[0].op_list[0], OpDesc::new(OpClass::IntAlu));
        let div = pool.units[1].find_op(OpClass::IntDiv).unwrap();
        assert_eq!(div.latency, 4);
        assert!(!div.pipelined);
        assert!(validate_pool(&pool).is_ok());
    }

    #[test]
    fn parse_core_defaults_scheduler() {
        let toml_str = r#"
name = "tiny"

[fu-pool]
name = "tiny-pool"

[[fu-pool.units]]
name = "alu"
count = 2
op-list = [{ op-class = "IntAlu" }]
"#;
        let core = parse_core_toml(toml_str).unwrap();
        assert_eq!(core.scheduler.issue_width, 8);
        assert_eq!(core.fu_pool.units[0].count, 2);
    }

    #[test]
    fn parse_unknown_class_returns_error() {
        let toml_str = r#"
name = "bad"

[[units]]
name = "alu"
count = 1
op-list = [{ op-class = "IntAdder" }]
"#;
        assert!(parse_pool_toml(toml_str).is_err());
    }

    #[test]
    fn parse_invalid_returns_error() {
        assert!(parse_pool_toml("this is not valid toml [[[").is_err());
    }

    #[test]
    fn validate_presets() {
        assert!(require_valid(&presets::default_x86()).is_ok());
        assert!(validate_pool(&presets::xeon_exec_units()).is_ok());
        assert!(validate_pool(&presets::xeon_o3().fu_pool).is_ok());
    }

    #[test]
    fn default_x86_only_warns_about_empty_ports() {
        // ReadPort and WritePort are declared with count 0.
        let issues = validate_pool(&presets::default_x86()).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn validate_zero_latency() {
        let mut pool = presets::xeon_exec_units();
        pool.units[0].op_list[0].latency = 0;
        let issues = validate_pool(&pool).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("zero latency")));
        assert!(require_valid(&pool).is_err());
    }

    #[test]
    fn validate_duplicate_class() {
        let mut pool = presets::xeon_exec_units();
        pool.units[2].op_list.push(OpDesc::new(OpClass::MemRead));
        let issues = validate_pool(&pool).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("more than once")));
    }

    #[test]
    fn validate_empty_pool() {
        let pool = FuPoolConfig {
            name: "empty".into(),
            units: vec![],
        };
        let issues = validate_pool(&pool).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("no units")));
    }

    #[test]
    fn validate_no_replicas() {
        let pool = FuPoolConfig {
            name: "idle".into(),
            units: vec![FuDesc::new("alu", 0).op(OpDesc::new(OpClass::IntAlu))],
        };
        let err = require_valid(&pool).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn load_not_found() {
        let result = load_pool_toml(Path::new("/nonexistent/path.pool.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xeon.pool.toml");
        let toml_str = pool_to_toml(&presets::xeon_exec_units()).unwrap();
        std::fs::write(&path, &toml_str).unwrap();

        let pool = load_pool_toml(&path).unwrap();
        assert_eq!(pool, presets::xeon_exec_units());
    }

    #[test]
    fn load_core_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xeon.core.toml");
        std::fs::write(&path, core_to_toml(&presets::xeon_o3()).unwrap()).unwrap();

        let core = load_core_toml(&path).unwrap();
        assert_eq!(core.fu_pool.units[2].count, 12);
    }
}
