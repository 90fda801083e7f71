// src/common/dates.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::common::{error::AppError, patch::Patch};

// Formatos aceitos além do RFC 3339 (sem fuso = UTC)
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Único ponto de parsing de datas vindas dos payloads.
/// `field` é o nome do campo em camelCase, usado na mensagem de erro.
pub fn parse_datetime(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(AppError::InvalidDate(field.to_string()))
}

pub fn parse_optional_datetime(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    raw.map(|value| parse_datetime(field, value)).transpose()
}

/// Versão tri-state: ausente continua ausente, null continua null.
pub fn parse_datetime_patch(field: &str, raw: Patch<String>) -> Result<Patch<DateTime<Utc>>, AppError> {
    raw.try_map(|value| parse_datetime(field, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_rfc3339_with_offset() {
        let parsed = parse_datetime("dataConsulta", "2025-03-10T14:30:00-03:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 10, 17, 30, 0).unwrap());
    }

    #[test]
    fn naive_values_are_utc() {
        let parsed = parse_datetime("dataConsulta", "2025-03-10T09:15").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap());
    }

    #[test]
    fn plain_date_is_midnight() {
        let parsed = parse_datetime("dataConsulta", "2025-03-10").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_is_a_typed_error() {
        let err = parse_datetime("proximaConsulta", "amanhã de manhã").unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(field) if field == "proximaConsulta"));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert!(parse_datetime("proximaConsulta", "2025-02-30").is_err());
    }

    #[test]
    fn patch_keeps_its_state() {
        assert_eq!(parse_datetime_patch("x", Patch::Missing).unwrap(), Patch::Missing);
        assert_eq!(parse_datetime_patch("x", Patch::Null).unwrap(), Patch::Null);
        assert!(parse_datetime_patch("x", Patch::Value("nope".into())).is_err());
        assert!(matches!(
            parse_datetime_patch("x", Patch::Value("2025-01-01".into())).unwrap(),
            Patch::Value(_)
        ));
    }
}
