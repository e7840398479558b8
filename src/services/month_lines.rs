// src/services/month_lines.rs
//
// Cálculo puro del mes de RRHH. Lo usan tanto la lectura de un mes abierto
// como el cierre, así las dos rutas no pueden divergir.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        currency::{rate_for, to_gs, Cotizacion, Moneda},
        hr::{LineaMes, MonthSources, OrigenLinea, SaldosMoneda, TipoMovimientoRrhh, TotalesMes},
    },
};

/// Aporte obligatorio al IPS: 9 % del sueldo mínimo.
pub const IPS_RATE: Decimal = Decimal::from_parts(9, 0, 0, false, 2);

/// Primer y último día del mes. `None` si mes/año no forman una fecha válida.
pub fn month_bounds(mes: i16, anio: i16) -> Option<(NaiveDate, NaiveDate)> {
    let mes = u32::try_from(mes).ok()?;
    let anio = i32::from(anio);
    let first = NaiveDate::from_ymd_opt(anio, mes, 1)?;
    let next = if mes == 12 {
        NaiveDate::from_ymd_opt(anio + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(anio, mes + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Línea de descuento IPS (negativa) sobre el sueldo mínimo vigente.
pub fn ips_deduction(sueldo_minimo: Decimal) -> Decimal {
    -(sueldo_minimo * IPS_RATE)
}

/// Total convertido a guaraníes conservando el signo de cada saldo.
///
/// Un saldo extranjero distinto de cero sin cotización es un error; una
/// cotización cero explícita se respeta.
pub fn compute_totals(saldos: &SaldosMoneda, cotizaciones: &[Cotizacion]) -> Result<TotalesMes, AppError> {
    let usd_gs = foreign_in_gs(saldos.usd, Moneda::USD, cotizaciones)?;
    let brl_gs = foreign_in_gs(saldos.brl, Moneda::BRL, cotizaciones)?;

    let total_final_gs = saldos
        .gs
        .checked_add(usd_gs)
        .and_then(|t| t.checked_add(brl_gs))
        .ok_or_else(out_of_range)?;

    Ok(TotalesMes {
        total_gs: saldos.gs,
        total_usd: saldos.usd,
        total_brl: saldos.brl,
        total_final_gs,
    })
}

fn foreign_in_gs(saldo: Decimal, moneda: Moneda, cotizaciones: &[Cotizacion]) -> Result<Decimal, AppError> {
    match rate_for(cotizaciones, moneda) {
        Some(rate) => saldo.checked_mul(rate).ok_or_else(out_of_range),
        None if saldo.is_zero() => Ok(Decimal::ZERO),
        None => Err(AppError::MissingExchangeRate(moneda)),
    }
}

fn out_of_range() -> AppError {
    AppError::BadRequest("El total convertido a guaraníes excede el rango numérico.".into())
}

/// Arma las líneas del mes a partir de las fuentes vivas, ordenadas por fecha.
///
/// El IPS calculado solo se agrega si no hay ya un movimiento manual de tipo IPS.
pub fn derive_month_lines(
    mes: i16,
    anio: i16,
    sources: &MonthSources,
    cotizaciones: &[Cotizacion],
) -> Vec<LineaMes> {
    let Some((first_day, last_day)) = month_bounds(mes, anio) else {
        return Vec::new();
    };

    let mut lines = Vec::with_capacity(sources.movimientos.len() + sources.vales.len() + 2);

    for mov in &sources.movimientos {
        lines.push(LineaMes {
            origen: OrigenLinea::Movimiento,
            origen_id: Some(mov.id),
            tipo: mov.tipo.as_str().to_string(),
            fecha: mov.fecha,
            moneda: mov.moneda,
            monto: mov.monto,
            monto_gs: to_gs(mov.monto, mov.moneda, cotizaciones),
            observacion: mov.observacion.clone(),
        });
    }

    for vale in &sources.vales {
        lines.push(LineaMes {
            origen: OrigenLinea::Vale,
            origen_id: Some(vale.id),
            tipo: "Vale".to_string(),
            fecha: vale.fecha_vencimiento,
            moneda: vale.moneda,
            monto: vale.monto,
            monto_gs: to_gs(vale.monto, vale.moneda, cotizaciones),
            observacion: vale.motivo.clone(),
        });
    }

    if let Some(sueldo) = &sources.sueldo {
        lines.push(LineaMes {
            origen: OrigenLinea::Sueldo,
            origen_id: Some(sueldo.id),
            tipo: "Sueldo".to_string(),
            fecha: first_day,
            moneda: sueldo.moneda,
            monto: sueldo.monto,
            monto_gs: to_gs(sueldo.monto, sueldo.moneda, cotizaciones),
            observacion: None,
        });
    }

    let has_manual_ips = sources
        .movimientos
        .iter()
        .any(|m| m.tipo == TipoMovimientoRrhh::IPS);

    if let (Some(minimo), false) = (sources.sueldo_minimo_ips, has_manual_ips) {
        let monto = ips_deduction(minimo);
        lines.push(LineaMes {
            origen: OrigenLinea::Ips,
            origen_id: None,
            tipo: "IPS".to_string(),
            fecha: last_day,
            moneda: Moneda::GS,
            monto,
            monto_gs: Some(monto),
            observacion: Some(format!("9% del sueldo mínimo ({})", minimo.normalize())),
        });
    }

    // sort_by_key es estable: a igual fecha se mantiene el orden de las fuentes.
    lines.sort_by_key(|l| l.fecha);
    lines
}

/// true si `fecha` cae dentro del mes indicado.
pub fn in_month(fecha: NaiveDate, mes: i16, anio: i16) -> bool {
    i32::from(anio) == fecha.year() && i64::from(mes) == i64::from(fecha.month())
}
