use super::{
    SettingError, SettingErrorKind, SettingKind, SettingSpec, SettingsDict, SettingsErrors,
    SettingsModel, SettingsSpecification,
};
use serde_json::Value;

/// Validate `dict` against `spec`, then deserialize and run cross-field checks.
///
/// Per-key defects are all collected before anything is reported. Cross-field
/// checks only run once every key passed, since they assume well-typed values.
pub(super) fn from_dict<S: SettingsModel>(
    spec: &SettingsSpecification,
    dict: &SettingsDict,
) -> Result<S, SettingsErrors> {
    check_dict(spec, dict).into_result()?;

    let model: S = serde_json::from_value(Value::Object(dict.clone())).map_err(|e| {
        SettingsErrors::from(vec![SettingError::whole(SettingErrorKind::Constraint(
            e.to_string(),
        ))])
    })?;
    model.check()?;
    Ok(model)
}

/// Every defect of `dict` with respect to `spec`, in specification order
/// followed by unknown keys.
pub(super) fn check_dict(spec: &SettingsSpecification, dict: &SettingsDict) -> SettingsErrors {
    let mut errors = SettingsErrors::new();

    for field in spec.iter() {
        match dict.get(&field.name) {
            None => errors.push(SettingError::new(&field.name, SettingErrorKind::Missing)),
            Some(value) => {
                if let Some(kind) = check_value(field, value) {
                    errors.push(SettingError::new(&field.name, kind));
                }
            }
        }
    }

    for key in dict.keys().filter(|key| !spec.contains(key)) {
        errors.push(SettingError::new(key, SettingErrorKind::Unknown));
    }

    errors
}

fn check_value(field: &SettingSpec, value: &Value) -> Option<SettingErrorKind> {
    if value.is_null() {
        return (!field.nullable).then(|| wrong_type(field, value));
    }

    match field.kind {
        SettingKind::Boolean => (!value.is_boolean()).then(|| wrong_type(field, value)),
        SettingKind::String => match value.as_str() {
            Some(s) => check_range(field, s.chars().count() as f64, "length"),
            None => Some(wrong_type(field, value)),
        },
        SettingKind::Enum => match value.as_str() {
            Some(s) => {
                let allowed = field.values.as_deref().unwrap_or_default();
                (!allowed.iter().any(|v| v == s)).then(|| {
                    SettingErrorKind::Constraint(format!(
                        "'{s}' is not one of: {}",
                        allowed.join(", ")
                    ))
                })
            }
            None => Some(wrong_type(field, value)),
        },
        SettingKind::Integer => {
            if value.is_i64() || value.is_u64() {
                value
                    .as_f64()
                    .and_then(|n| check_range(field, n, "value"))
            } else {
                Some(wrong_type(field, value))
            }
        }
        SettingKind::Number => match value.as_f64() {
            Some(n) => check_range(field, n, "value"),
            None => Some(wrong_type(field, value)),
        },
    }
}

fn check_range(field: &SettingSpec, n: f64, what: &str) -> Option<SettingErrorKind> {
    if let Some(min) = field.min.filter(|min| n < *min) {
        return Some(SettingErrorKind::Constraint(format!(
            "{what} {n} is below the minimum {min}"
        )));
    }
    if let Some(max) = field.max.filter(|max| n > *max) {
        return Some(SettingErrorKind::Constraint(format!(
            "{what} {n} is above the maximum {max}"
        )));
    }
    None
}

fn wrong_type(field: &SettingSpec, value: &Value) -> SettingErrorKind {
    SettingErrorKind::WrongType {
        expected: field.type_name(),
        found: json_type(value),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
