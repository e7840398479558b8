// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, Usuario},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, expiration_hours: i64) -> Self {
        Self { user_repo, jwt_secret, expiration_hours }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let usuario = self.check_credentials(username, password).await?;
        let token = self.create_token(&usuario)?;

        tracing::info!("🔑 Inicio de sesión de '{}'", usuario.username);
        Ok(AuthResponse { token, usuario })
    }

    pub async fn change_password(
        &self,
        username: &str,
        password_actual: &str,
        password_nueva: &str,
    ) -> Result<(), AppError> {
        let usuario = self.check_credentials(username, password_actual).await?;

        let password_clone = password_nueva.to_owned();
        let new_hash = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
            .await
            .map_err(|e| anyhow::anyhow!("Fallo en la tarea de hashing: {}", e))?
            ?;

        self.user_repo
            .update_password(self.user_repo.pool(), usuario.id, &new_hash)
            .await?;

        tracing::info!("Contraseña actualizada para '{}'", usuario.username);
        Ok(())
    }

    /// Decodifica y valida el token (firma y vencimiento). No consulta la base.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, usuario: &Usuario) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.expiration_hours);

        let claims = Claims {
            id: usuario.id,
            username: usuario.username.clone(),
            rol_id: usuario.rol_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // Usuario inexistente, inactivo o contraseña incorrecta dan el mismo error.
    async fn check_credentials(&self, username: &str, password: &str) -> Result<Usuario, AppError> {
        let usuario = self.user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.activo)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = usuario.password_hash.clone();

        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Fallo en la tarea de verificación de contraseña: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        Ok(usuario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/farmacia_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), secret.to_string(), 12)
    }

    fn usuario() -> Usuario {
        Usuario {
            id: 7,
            username: "cajera".into(),
            nombre: Some("Cajera Uno".into()),
            password_hash: String::new(),
            rol_id: 3,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_identity() {
        let auth = service("secreto-de-prueba");
        let token = auth.create_token(&usuario()).unwrap();

        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "cajera");
        assert_eq!(claims.rol_id, 3);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = service("otro-secreto").create_token(&usuario()).unwrap();
        let err = service("secreto-de-prueba").validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn claims_use_rol_id_in_camel_case() {
        let auth = service("secreto-de-prueba");
        let token = auth.create_token(&usuario()).unwrap();

        let claims = auth.validate_token(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["rolId"], 3);
    }
}
