// src/models/rbac.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permiso {
    pub id: i32,
    #[schema(example = "rrhh:reabrir")]
    pub slug: String,
    pub descripcion: Option<String>,
    #[schema(example = "rrhh")]
    pub modulo: String,
}
