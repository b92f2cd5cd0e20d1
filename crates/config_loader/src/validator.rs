//! Configuration validation
//!
//! Rules:
//! - per-field ranges (declared on the blueprint with `validator`)
//! - critical_m < caution_m
//! - both echo waits fit inside one sensing period
//! - sink parameters present for the selected sink type
//! - simulated profile segments last > 0 ms and have non-negative distances

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use contracts::{ContractError, GuardBlueprint, SinkType};

/// Validate a GuardBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_zone_order(blueprint)?;
    validate_echo_budget(blueprint)?;
    validate_upload(blueprint)?;
    validate_profile(blueprint)?;
    Ok(())
}

/// Field-level ranges declared with `#[validate(...)]`
fn validate_fields(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, String::new())
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

fn first_violation(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in entries {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let mut params: Vec<_> = err
                        .params
                        .iter()
                        .filter(|(k, _)| k.as_ref() != "value")
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect();
                    params.sort();
                    let value = err
                        .params
                        .get("value")
                        .map(|v| format!(", got {v}"))
                        .unwrap_or_default();
                    return Some((
                        path,
                        format!("{} ({}){}", err.code, params.join(", "), value),
                    ));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Zones must nest: critical strictly inside caution
fn validate_zone_order(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    let zones = &blueprint.zones;
    if zones.critical_m >= zones.caution_m {
        return Err(ContractError::config_validation(
            "zones.critical_m / zones.caution_m",
            format!(
                "critical_m ({}) must be < caution_m ({})",
                zones.critical_m, zones.caution_m
            ),
        ));
    }
    Ok(())
}

/// Rising + falling waits must leave room in the period
fn validate_echo_budget(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    let sensing = &blueprint.sensing;
    if sensing.echo_timeout_ms * 2 >= sensing.period_ms {
        return Err(ContractError::config_validation(
            "sensing.echo_timeout_ms",
            format!(
                "two echo waits ({} ms each) must fit inside period_ms ({})",
                sensing.echo_timeout_ms, sensing.period_ms
            ),
        ));
    }
    Ok(())
}

/// Required sink parameters
fn validate_upload(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    let upload = &blueprint.upload;
    match upload.sink_type {
        SinkType::Http => {
            let url = upload.params.get("url").ok_or_else(|| {
                ContractError::config_validation("upload.params.url", "http sink requires 'url'")
            })?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ContractError::config_validation(
                    "upload.params.url",
                    format!("url must start with http:// or https://, got '{url}'"),
                ));
            }
        }
        SinkType::Stream => {
            if !upload.params.contains_key("addr") {
                return Err(ContractError::config_validation(
                    "upload.params.addr",
                    "stream sink requires 'addr'",
                ));
            }
        }
        SinkType::Log => {}
    }
    Ok(())
}

/// Simulated profile sanity
fn validate_profile(blueprint: &GuardBlueprint) -> Result<(), ContractError> {
    for (idx, segment) in blueprint.simulation.profile.iter().enumerate() {
        if segment.hold_ms == 0 {
            return Err(ContractError::config_validation(
                format!("simulation.profile[{idx}].hold_ms"),
                "hold_ms must be > 0",
            ));
        }
        if let Some(d) = segment.distance_m {
            if !d.is_finite() || d < 0.0 {
                return Err(ContractError::config_validation(
                    format!("simulation.profile[{idx}].distance_m"),
                    format!("distance_m must be a non-negative number, got {d}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ProfileSegment;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&GuardBlueprint::default()).is_ok());
    }

    #[test]
    fn test_inverted_thresholds() {
        let mut bp = GuardBlueprint::default();
        bp.zones.critical_m = 0.6;
        bp.zones.caution_m = 0.6;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("must be < caution_m"));
    }

    #[test]
    fn test_field_range_reports_path() {
        let mut bp = GuardBlueprint::default();
        bp.sensing.period_ms = 5;
        let err = validate(&bp).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, .. } => {
                assert_eq!(field, "sensing.period_ms");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbounded_durations_rejected() {
        fn field_of(bp: &GuardBlueprint) -> String {
            match validate(bp).unwrap_err() {
                ContractError::ConfigValidation { field, .. } => field,
                other => panic!("unexpected error: {other:?}"),
            }
        }

        let mut bp = GuardBlueprint::default();
        bp.buzzer.caution_repeats = u32::MAX;
        assert_eq!(field_of(&bp), "buzzer.caution_repeats");

        let mut bp = GuardBlueprint::default();
        bp.sensing.settle_us = 5_000_000;
        assert_eq!(field_of(&bp), "sensing.settle_us");

        let mut bp = GuardBlueprint::default();
        bp.capture.warmup_ms = 3_600_000;
        assert_eq!(field_of(&bp), "capture.warmup_ms");

        let mut bp = GuardBlueprint::default();
        bp.upload.shutdown_grace_ms = u64::MAX;
        assert_eq!(field_of(&bp), "upload.shutdown_grace_ms");
    }

    #[test]
    fn test_echo_budget() {
        let mut bp = GuardBlueprint::default();
        bp.sensing.period_ms = 50;
        bp.sensing.echo_timeout_ms = 30;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_http_requires_url() {
        let mut bp = GuardBlueprint::default();
        bp.upload.sink_type = SinkType::Http;
        assert!(validate(&bp).is_err());

        bp.upload
            .params
            .insert("url".into(), "ftp://collector/upload".into());
        assert!(validate(&bp).is_err());

        bp.upload
            .params
            .insert("url".into(), "http://collector:5000/upload".into());
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_stream_requires_addr() {
        let mut bp = GuardBlueprint::default();
        bp.upload.sink_type = SinkType::Stream;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_profile_rules() {
        let mut bp = GuardBlueprint::default();
        bp.simulation.profile = vec![ProfileSegment {
            distance_m: Some(-1.0),
            hold_ms: 100,
        }];
        assert!(validate(&bp).is_err());

        bp.simulation.profile = vec![ProfileSegment {
            distance_m: None,
            hold_ms: 0,
        }];
        assert!(validate(&bp).is_err());
    }
}
