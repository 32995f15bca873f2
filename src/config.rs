//! Configuration.
//!
//! Every section has defaults, so an empty JSON object is a valid config file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlarmError, AlarmResult, ValidationError};
use crate::monitor::MonitorConfig;
use crate::position::{CurrentPositionOptions, WatchOptions};

/// Runtime configuration, one section per component.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmConfig {
    pub monitor: MonitorConfig,
    pub watch: WatchOptions,
    pub current_position: CurrentPositionOptions,
}

impl AlarmConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> AlarmResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| AlarmError::config(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> AlarmResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AlarmError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Check values serde cannot: capacities, distance filter, timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidConfig {
            reason: reason.to_string(),
        };

        if self.monitor.input_queue_capacity == 0 {
            return Err(invalid("monitor.input_queue_capacity must be at least 1"));
        }
        if self.monitor.stream_capacity == 0 {
            return Err(invalid("monitor.stream_capacity must be at least 1"));
        }
        if !self.watch.distance_filter_m.is_finite() || self.watch.distance_filter_m < 0.0 {
            return Err(invalid("watch.distance_filter_m must be a non-negative number"));
        }
        if self.current_position.timeout_ms == 0 {
            return Err(invalid("current_position.timeout_ms must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RetriggerPolicy;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = AlarmConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, AlarmConfig::default());
        assert_eq!(cfg.watch.distance_filter_m, 50.0);
        assert_eq!(cfg.current_position.timeout_ms, 15_000);
        assert_eq!(cfg.monitor.retrigger, RetriggerPolicy::OncePerSession);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = AlarmConfig::from_json_str(
            r#"{"monitor": {"retrigger": "every_sample"}, "watch": {"distance_filter_m": 10}}"#,
        )
        .unwrap();
        assert_eq!(cfg.monitor.retrigger, RetriggerPolicy::EverySample);
        assert_eq!(cfg.monitor.input_queue_capacity, 1024);
        assert_eq!(cfg.watch.distance_filter_m, 10.0);
        assert!(cfg.watch.high_accuracy);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(AlarmConfig::from_json_str(r#"{"threshold_km": 1.0}"#).is_err());

        let err = AlarmConfig::from_json_str(r#"{"watch": {"distance_filter_m": -1}}"#).unwrap_err();
        assert!(err.is_validation());

        let err = AlarmConfig::from_json_str(r#"{"monitor": {"stream_capacity": 0}}"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_misspelled_keys_in_nested_sections() {
        for json in [
            r#"{"monitor": {"retriger": "every_sample"}}"#,
            r#"{"watch": {"distance_filter": 10}}"#,
            r#"{"current_position": {"timeout": 5000}}"#,
        ] {
            let err = AlarmConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, AlarmError::Config { .. }), "{json}: {err:?}");
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AlarmConfig::load("/nonexistent/geoalarm.json").unwrap_err();
        assert!(matches!(err, AlarmError::Config { .. }));
    }
}
