//! Healthcheck normalization

use super::config::{describe_value, DurationValue, HealthcheckConfig, HealthcheckTest, RetriesValue};
use super::duration::parse_duration;
use crate::config::MissingHealthcheck;
use crate::container::HealthConfig;
use crate::error::{Result, StackError};

/// Default probe interval and timeout
pub const DEFAULT_HEALTHCHECK_INTERVAL: &str = "30s";
pub const DEFAULT_HEALTHCHECK_TIMEOUT: &str = "30s";
pub const DEFAULT_HEALTHCHECK_START_PERIOD: &str = "0s";
pub const DEFAULT_HEALTHCHECK_RETRIES: u32 = 3;

/// Probe used when a block omits `test`; it never succeeds
pub fn failing_test() -> Vec<String> {
    vec!["CMD-SHELL".to_string(), "exit 1".to_string()]
}

/// Normalize a service's healthcheck block.
///
/// An absent block and a block without `test` are different cases: the
/// former follows `missing`, the latter always gets the failing probe.
pub fn normalize_healthcheck(
    block: Option<&HealthcheckConfig>,
    missing: MissingHealthcheck,
) -> Result<Option<HealthConfig>> {
    match block {
        None => match missing {
            MissingHealthcheck::Skip => Ok(None),
            MissingHealthcheck::FailingDefault => {
                normalize_block(&HealthcheckConfig::default()).map(Some)
            }
        },
        Some(block) => normalize_block(block).map(Some),
    }
}

fn normalize_block(block: &HealthcheckConfig) -> Result<HealthConfig> {
    let test = if block.disable.unwrap_or(false) {
        vec!["NONE".to_string()]
    } else {
        match &block.test {
            Some(HealthcheckTest::Array(arr)) if !arr.is_empty() => arr.clone(),
            Some(HealthcheckTest::Command(cmd)) if !cmd.trim().is_empty() => {
                vec!["CMD-SHELL".to_string(), cmd.clone()]
            }
            Some(HealthcheckTest::Other(value)) => {
                return Err(StackError::InvalidHealthcheck(format!(
                    "test must be a string or a list of strings, got {}",
                    describe_value(value)
                )))
            }
            _ => failing_test(),
        }
    };

    Ok(HealthConfig {
        test,
        interval: duration_or(&block.interval, DEFAULT_HEALTHCHECK_INTERVAL)?,
        timeout: duration_or(&block.timeout, DEFAULT_HEALTHCHECK_TIMEOUT)?,
        retries: retries(block.retries.as_ref())?,
        start_period: duration_or(&block.start_period, DEFAULT_HEALTHCHECK_START_PERIOD)?,
    })
}

/// Retry count; a quoted number is accepted
fn retries(value: Option<&RetriesValue>) -> Result<u32> {
    match value {
        None => Ok(DEFAULT_HEALTHCHECK_RETRIES),
        Some(RetriesValue::Count(n)) => Ok(*n),
        Some(RetriesValue::Other(value)) => match value {
            serde_yaml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            StackError::InvalidHealthcheck(format!(
                "retries must be a non-negative integer, got {}",
                describe_value(value)
            ))
        }),
    }
}

fn duration_or(value: &Option<DurationValue>, default: &str) -> Result<i64> {
    match value {
        Some(value) => parse_duration(value),
        None => parse_duration(&DurationValue::from(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_block_skips_by_default() {
        assert_eq!(normalize_healthcheck(None, MissingHealthcheck::Skip).unwrap(), None);
    }

    #[test]
    fn test_absent_block_with_failing_default() {
        let hc = normalize_healthcheck(None, MissingHealthcheck::FailingDefault)
            .unwrap()
            .unwrap();
        assert_eq!(hc.test, failing_test());
        assert_eq!(hc.interval, 30_000_000_000);
    }

    #[test]
    fn test_block_defaults() {
        let block = HealthcheckConfig::default();
        let hc = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(
            hc,
            HealthConfig {
                test: failing_test(),
                interval: 30_000_000_000,
                timeout: 30_000_000_000,
                retries: 3,
                start_period: 0,
            }
        );
    }

    #[test]
    fn test_block_values() {
        let block: HealthcheckConfig = serde_yaml::from_str(
            r#"
test: ["CMD", "curl", "-f", "http://localhost"]
interval: 10s
timeout: 500ms
retries: 5
start_period: 2
"#,
        )
        .unwrap();
        let hc = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(hc.test, vec!["CMD", "curl", "-f", "http://localhost"]);
        assert_eq!(hc.interval, 10_000_000_000);
        assert_eq!(hc.timeout, 500_000_000);
        assert_eq!(hc.retries, 5);
        assert_eq!(hc.start_period, 2_000_000_000);
    }

    #[test]
    fn test_string_test_is_shell_form() {
        let block = HealthcheckConfig {
            test: Some(HealthcheckTest::Command("pg_isready -U postgres".to_string())),
            ..Default::default()
        };
        let hc = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(hc.test, vec!["CMD-SHELL", "pg_isready -U postgres"]);
    }

    #[test]
    fn test_disable() {
        let block = HealthcheckConfig {
            disable: Some(true),
            test: Some(HealthcheckTest::Command("true".to_string())),
            ..Default::default()
        };
        let hc = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(hc.test, vec!["NONE"]);
    }

    #[test]
    fn test_invalid_duration_propagates() {
        let block = HealthcheckConfig {
            interval: Some(DurationValue::from("soon")),
            ..Default::default()
        };
        let err = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip).unwrap_err();
        assert!(matches!(err, StackError::InvalidDuration(_)));
    }

    #[test]
    fn test_retries_values() {
        let quoted: HealthcheckConfig = serde_yaml::from_str("retries: \"4\"").unwrap();
        let hc = normalize_healthcheck(Some(&quoted), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(hc.retries, 4);

        for bad in ["retries: many", "retries: -1", "retries: 2.5", "retries: [3]"] {
            let block: HealthcheckConfig = serde_yaml::from_str(bad).unwrap();
            assert!(
                matches!(
                    normalize_healthcheck(Some(&block), MissingHealthcheck::Skip),
                    Err(StackError::InvalidHealthcheck(_))
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_non_command_test_rejected() {
        let block: HealthcheckConfig = serde_yaml::from_str("test: 123").unwrap();
        let err = normalize_healthcheck(Some(&block), MissingHealthcheck::Skip).unwrap_err();
        assert!(matches!(err, StackError::InvalidHealthcheck(ref m) if m.contains("123")));

        let disabled: HealthcheckConfig =
            serde_yaml::from_str("test: {cmd: true}\ndisable: true").unwrap();
        let hc = normalize_healthcheck(Some(&disabled), MissingHealthcheck::Skip)
            .unwrap()
            .unwrap();
        assert_eq!(hc.test, vec!["NONE"]);
    }
}
