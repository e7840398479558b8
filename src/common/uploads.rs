// src/common/uploads.rs

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::common::error::AppError;

const RECEIPTS_DIR: &str = "comprobantes";

// Extensiones que aceptamos tal cual; el resto se guarda como .bin
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "pdf"];

/// Archivo recibido en el formulario multipart, todavía en memoria.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Comprobantes subidos, guardados en disco y referenciados por ruta relativa.
#[derive(Clone, Debug)]
pub struct ReceiptStorage {
    root: PathBuf,
}

impl ReceiptStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Escribe el archivo con un nombre nuevo y devuelve `comprobantes/<uuid>.<ext>`.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError> {
        let dir = self.root.join(RECEIPTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_of(original_name));
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("{RECEIPTS_DIR}/{file_name}"))
    }

    /// Borra un comprobante. Los fallos solo se registran: la base ya quedó consistente.
    pub async fn remove_best_effort(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!("Ruta de comprobante ignorada: {}", relative);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Comprobante eliminado: {}", relative),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("No se pudo eliminar el comprobante {}: {}", relative, e),
        }
    }

    // Solo rutas dentro de `comprobantes/`, sin componentes `..`.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let name = relative.strip_prefix(RECEIPTS_DIR)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.root.join(RECEIPTS_DIR).join(name))
    }
}

fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "bin".to_string())
}
