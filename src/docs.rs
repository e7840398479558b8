// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::change_password,
        handlers::auth::get_me,

        // --- RBAC ---
        handlers::rbac::list_permissions,

        // --- Operaciones bancarias ---
        handlers::bank_operations::create_operation,
        handlers::bank_operations::update_operation,
        handlers::bank_operations::delete_operation,
        handlers::bank_operations::list_operations,
        handlers::bank_operations::get_operation,
        handlers::bank_operations::set_verification,

        // --- Farmacia ---
        handlers::pharmacy::list_movements,

        // --- Pagos de servicios ---
        handlers::service_payments::create_payment,
        handlers::service_payments::list_payments,
        handlers::service_payments::get_payment,
        handlers::service_payments::update_payment,
        handlers::service_payments::delete_payment,

        // --- RRHH ---
        handlers::hr::create_movement,
        handlers::hr::delete_movement,
        handlers::hr::finalize_month,
        handlers::hr::reopen_month,
        handlers::hr::get_month_movements,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Usuario,
            models::auth::LoginPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::auth::Claims,

            // --- RBAC ---
            models::rbac::Permiso,

            // --- Monedas ---
            models::currency::Moneda,
            models::currency::Cotizacion,

            // --- Operaciones bancarias ---
            models::bank_operations::TipoOperacion,
            models::bank_operations::OperacionBancaria,
            models::bank_operations::OperacionBancariaPayload,
            models::bank_operations::VerificacionPayload,

            // --- Farmacia ---
            models::pharmacy::OrigenMovimiento,
            models::pharmacy::MovimientoFarmacia,

            // --- Pagos de servicios ---
            models::service_payments::PagoServicio,
            models::service_payments::CreatePagoServicioPayload,

            // --- RRHH ---
            models::hr::TipoMovimientoRrhh,
            models::hr::OrigenLinea,
            models::hr::MovimientoRrhh,
            models::hr::LineaMes,
            models::hr::CreateMovimientoRrhhPayload,
            models::hr::SaldosMoneda,
            models::hr::FinalizarMesPayload,
            models::hr::PeriodoPayload,
            models::hr::TotalesMes,
            models::hr::FinalizarMesResponse,
            models::hr::MovimientosMesResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Inicio de sesión y contraseñas"),
        (name = "RBAC", description = "Catálogo de permisos"),
        (name = "Operaciones bancarias", description = "POS y transferencias con su movimiento de farmacia"),
        (name = "Farmacia", description = "Libro de movimientos de farmacia"),
        (name = "Pagos de servicios", description = "Pagos de servicios con egreso asociado"),
        (name = "RRHH", description = "Movimientos, cierre y reapertura de meses")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
