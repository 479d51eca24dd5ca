//! Login and password management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use tillpoint_auth::{
    hash_password, normalize_email, verify_password, JwtClaims, JwtIssuer, Role, User,
};
use tillpoint_core::{DomainError, StoreId, UserId};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{StoreRepository, UserRepository};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    /// Required when users change their own password.
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    stores: Arc<dyn StoreRepository>,
    issuer: Arc<dyn JwtIssuer>,
    password_cost: u32,
}

/// bcrypt is CPU-bound; keep it off the async workers.
pub(crate) async fn hash_blocking(plain: String, cost: u32) -> ServiceResult<String> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&plain, cost))
        .await
        .map_err(|e| ServiceError::Storage(format!("password hashing task failed: {e}")))??;
    Ok(hashed)
}

async fn verify_blocking(plain: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| ServiceError::Storage(format!("password check task failed: {e}")))
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stores: Arc<dyn StoreRepository>,
        issuer: Arc<dyn JwtIssuer>,
        password_cost: u32,
    ) -> Self {
        Self {
            users,
            stores,
            issuer,
            password_cost,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let email = normalize_email(&request.email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("login rejected: unknown email");
                return Err(DomainError::Unauthorized.into());
            }
        };
        if !verify_blocking(request.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login rejected: bad password");
            return Err(DomainError::Unauthorized.into());
        }
        if !user.is_active() {
            warn!(user_id = %user.id, "login rejected: account suspended");
            return Err(ServiceError::Forbidden("account is suspended".to_string()));
        }

        let store_id = self.login_store(&user, request.store_id).await?;
        let now = Utc::now();
        let expires_at = now + self.issuer.ttl();
        let claims = JwtClaims {
            sub: user.id,
            store_id,
            stores: user.stores.clone(),
            role: user.role.clone(),
            issued_at: now,
            expires_at,
        };
        let token = self
            .issuer
            .issue(&claims)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        info!(user_id = %user.id, store_id = %store_id, "user logged in");
        Ok(LoginResponse {
            token,
            expires_at,
            user,
        })
    }

    /// Requested store, else the user's first store, else (admins) the first store.
    async fn login_store(&self, user: &User, requested: Option<StoreId>) -> ServiceResult<StoreId> {
        let candidate = match requested.or_else(|| user.default_store()) {
            Some(store_id) => store_id,
            None if user.role == Role::admin() => self
                .stores
                .list()
                .await?
                .first()
                .map(|s| s.id)
                .ok_or_else(|| DomainError::invalid_state("no store has been created yet"))?,
            None => return Err(ServiceError::Forbidden("user has no store access".to_string())),
        };
        if !user.can_access(candidate) {
            return Err(ServiceError::Forbidden(format!("no access to store {candidate}")));
        }
        if self.stores.get(candidate).await?.is_none() {
            return Err(DomainError::not_found(format!("store {candidate}")).into());
        }
        Ok(candidate)
    }

    /// Users change their own password (current password required); admins
    /// may reset anyone's.
    #[instrument(skip(self, ctx, change), fields(actor = %ctx.user_id, target = %user_id))]
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        change: PasswordChange,
    ) -> ServiceResult<()> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?;

        if ctx.user_id == user_id {
            let current = change
                .current_password
                .ok_or_else(|| DomainError::validation("current_password is required"))?;
            if !verify_blocking(current, user.password_hash.clone()).await? {
                warn!("password change rejected: wrong current password");
                return Err(DomainError::Unauthorized.into());
            }
        } else if !ctx.is_admin() {
            return Err(ServiceError::Forbidden(
                "only admins may reset another user's password".to_string(),
            ));
        }

        user.password_hash = hash_blocking(change.new_password, self.password_cost).await?;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;
        info!("password changed");
        Ok(())
    }
}
