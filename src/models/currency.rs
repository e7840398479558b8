// src/models/currency.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Moneda local (guaraníes) y las dos extranjeras que maneja la farmacia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "moneda")]
pub enum Moneda {
    #[serde(alias = "PYG")]
    GS,
    USD,
    BRL,
}

impl Moneda {
    pub fn is_local(self) -> bool {
        self == Moneda::GS
    }
}

impl std::fmt::Display for Moneda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Moneda::GS => "GS",
            Moneda::USD => "USD",
            Moneda::BRL => "BRL",
        };
        f.write_str(code)
    }
}

/// Cotización de una moneda extranjera expresada en guaraníes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cotizacion {
    pub moneda: Moneda,
    // Se serializa como texto para que el JSON guardado en el resumen sea exacto.
    #[serde(serialize_with = "rust_decimal::serde::str::serialize")]
    #[schema(value_type = String, example = "7300")]
    pub valor: Decimal,
}

/// Busca la cotización de `moneda`. Si la lista la repite, gana la primera.
pub fn rate_for(cotizaciones: &[Cotizacion], moneda: Moneda) -> Option<Decimal> {
    if moneda.is_local() {
        return Some(Decimal::ONE);
    }
    cotizaciones
        .iter()
        .find(|c| c.moneda == moneda)
        .map(|c| c.valor)
}

/// Equivalente en guaraníes, o `None` si no hay cotización para la moneda
/// o el producto no entra en un `Decimal`.
pub fn to_gs(monto: Decimal, moneda: Moneda, cotizaciones: &[Cotizacion]) -> Option<Decimal> {
    rate_for(cotizaciones, moneda).and_then(|rate| monto.checked_mul(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pyg_is_accepted_as_alias_for_gs() {
        let moneda: Moneda = serde_json::from_str("\"PYG\"").unwrap();
        assert_eq!(moneda, Moneda::GS);
        assert_eq!(serde_json::to_string(&moneda).unwrap(), "\"GS\"");
    }

    #[test]
    fn local_currency_converts_one_to_one() {
        assert_eq!(to_gs(dec!(-50000), Moneda::GS, &[]), Some(dec!(-50000)));
    }

    #[test]
    fn foreign_currency_without_rate_has_no_equivalent() {
        let cotizaciones = [Cotizacion { moneda: Moneda::USD, valor: dec!(7300) }];
        assert_eq!(to_gs(dec!(10), Moneda::BRL, &cotizaciones), None);
        assert_eq!(to_gs(dec!(10), Moneda::USD, &cotizaciones), Some(dec!(73000)));
    }
}
