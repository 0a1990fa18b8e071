//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;
use validator::ValidationError;

lazy_static! {
    // Direcciones: letras, dígitos, espacios y puntuación común, 5-200 caracteres
    static ref ADDRESS_RE: Regex = Regex::new(r"^[\w\d\s,.\-#/()']{5,200}$").unwrap();
}

/// Validar y convertir string a UUID
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| {
        let mut error = ValidationError::new("uuid");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar y convertir string a hora
pub fn validate_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| {
            let mut error = ValidationError::new("time");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"HH:MM[:SS]".to_string());
            error
        })
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar formato de dirección postal
pub fn validate_address(value: &str) -> Result<(), ValidationError> {
    if !ADDRESS_RE.is_match(value.trim()) {
        let mut error = ValidationError::new("address");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un conteo de pasajeros sea razonable
pub fn validate_passenger_count(value: i32) -> Result<(), ValidationError> {
    if value < 1 || value > 60 {
        let mut error = ValidationError::new("passenger_count");
        error.add_param("value".into(), &value);
        error.add_param("range".into(), &"1 to 60".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + serde::Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uuid() {
        let valid_uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(validate_uuid(valid_uuid).is_ok());

        let invalid_uuid = "invalid-uuid";
        assert!(validate_uuid(invalid_uuid).is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2024-01-15").is_ok());
        assert!(validate_date("2024/01/15").is_err());
    }

    #[test]
    fn test_validate_time() {
        assert!(validate_time("08:30:00").is_ok());
        assert!(validate_time("08:30").is_ok());
        assert!(validate_time("25:00").is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(45.0, -75.0).is_ok());
        assert!(validate_coordinates(91.0, -75.0).is_err());
        assert!(validate_coordinates(45.0, -181.0).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("123 Main Street, Springfield").is_ok());
        assert!(validate_address("x").is_err());
    }

    #[test]
    fn test_validate_passenger_count() {
        assert!(validate_passenger_count(4).is_ok());
        assert!(validate_passenger_count(0).is_err());
        assert!(validate_passenger_count(61).is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(5).is_ok());
        assert!(validate_positive(0).is_err());
        assert!(validate_positive(-5).is_err());
    }
}
