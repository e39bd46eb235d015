// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, SeedStatus, SeedUserPayload, User, UserRole},
};

/// Gera o hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: Duration,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_hours: i64, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
            pool,
        }
    }

    pub async fn seed_status(&self) -> Result<SeedStatus, AppError> {
        Ok(SeedStatus { needs_seed: self.user_repo.count().await? == 0 })
    }

    /// Cria o primeiro usuário. Só funciona com a tabela de usuários vazia.
    pub async fn seed(&self, payload: SeedUserPayload) -> Result<AuthResponse, AppError> {
        // 1. Hash fora da transação (não toca no banco)
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        // 2. Trava a tabela para que dois seeds simultâneos não passem juntos
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Err(AppError::AlreadySeeded);
        }

        // 3. Cria e confirma
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                payload.name.trim(),
                &payload.email.trim().to_lowercase(),
                &password_hash,
                payload.role.unwrap_or(UserRole::Admin),
                &[],
            )
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Usuário inicial criado: {}", user.email);
        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Valida o token e recarrega o usuário (cargos podem ter mudado desde a emissão).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str, ttl_hours: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), secret.into(), ttl_hours, pool)
    }

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@fazenda.com".into(),
            password_hash: String::new(),
            role,
            role_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_subject_role_and_expiry() {
        let auth = service("segredo", 8);
        let user = user(UserRole::Accountant);

        let token = auth.create_token(&user).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Accountant);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = service("um", 8).create_token(&user(UserRole::Admin)).unwrap();
        let err = service("outro", 8).decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // Bem além da margem padrão de 60s do jsonwebtoken
        let auth = service("segredo", -2);
        let token = auth.create_token(&user(UserRole::Viewer)).unwrap();
        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hashed = hash_password("hunter22").await.unwrap();
        assert!(verify_password("hunter22", &hashed).await.unwrap());
        assert!(!verify_password("outra", &hashed).await.unwrap());
    }
}
