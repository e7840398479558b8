// Validadores propios para montos decimales (validator no trae rangos para Decimal).

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

use crate::models::currency::Cotizacion;

/// Mayor valor que entra en una columna NUMERIC(18, 2): 9999999999999999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

/// Tope de una cotización en guaraníes.
pub const MAX_RATE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn too_large() -> ValidationError {
    ValidationError::new("rango")
        .with_message(Cow::from("El monto excede el máximo permitido (16 dígitos enteros)."))
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positivo")
            .with_message(Cow::from("El monto debe ser mayor a cero.")));
    }
    if *value > MAX_AMOUNT {
        return Err(too_large());
    }
    Ok(())
}

pub fn non_zero_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("distinto_de_cero")
            .with_message(Cow::from("El monto no puede ser cero.")));
    }
    if value.abs() > MAX_AMOUNT {
        return Err(too_large());
    }
    Ok(())
}

pub fn valid_rates(cotizaciones: &[Cotizacion]) -> Result<(), ValidationError> {
    if cotizaciones
        .iter()
        .any(|c| c.valor < Decimal::ZERO || c.valor > MAX_RATE)
    {
        return Err(ValidationError::new("cotizacion")
            .with_message(Cow::from("Cada cotización debe estar entre 0 y 1000000000.")));
    }
    Ok(())
}

pub fn required(message: &'static str) -> ValidationError {
    ValidationError::new("requerido").with_message(Cow::from(message))
}

pub fn invalid(message: &'static str) -> ValidationError {
    ValidationError::new("formato").with_message(Cow::from(message))
}

/// Junta el resultado de `Validate::validate` con errores agregados a mano.
pub fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::currency::Moneda;
    use rust_decimal_macros::dec;

    #[test]
    fn max_amount_matches_numeric_18_2() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999999999.99));
        assert!(positive_amount(&dec!(9999999999999999.99)).is_ok());
        assert!(positive_amount(&dec!(10000000000000000)).is_err());
    }

    #[test]
    fn signed_amounts_are_bounded_by_magnitude() {
        assert!(non_zero_amount(&dec!(-50000)).is_ok());
        assert!(non_zero_amount(&dec!(-10000000000000000)).is_err());
        assert!(non_zero_amount(&dec!(0)).is_err());
    }

    #[test]
    fn rates_must_be_non_negative_and_bounded() {
        let rate = |valor| vec![Cotizacion { moneda: Moneda::USD, valor }];
        assert!(valid_rates(&rate(dec!(0))).is_ok());
        assert!(valid_rates(&rate(dec!(7300))).is_ok());
        assert!(valid_rates(&rate(dec!(-1))).is_err());
        assert!(valid_rates(&rate(dec!(1000000001))).is_err());
    }
}
