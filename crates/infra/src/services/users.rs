use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use tillpoint_auth::{NewUser, User, UserPatch};
use tillpoint_core::{DomainError, StoreId, UserId};

use super::auth::hash_blocking;
use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{StoreRepository, UserRepository};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    stores: Arc<dyn StoreRepository>,
    password_cost: u32,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stores: Arc<dyn StoreRepository>,
        password_cost: u32,
    ) -> Self {
        Self {
            users,
            stores,
            password_cost,
        }
    }

    async fn ensure_stores_exist(&self, stores: &[StoreId]) -> ServiceResult<()> {
        for store_id in stores {
            if self.stores.get(*store_id).await?.is_none() {
                return Err(DomainError::not_found(format!("store {store_id}")).into());
            }
        }
        Ok(())
    }

    #[instrument(skip(self, ctx, new_user), fields(actor = %ctx.user_id, role = %new_user.role))]
    pub async fn create(&self, ctx: &RequestContext, new_user: NewUser) -> ServiceResult<User> {
        new_user.validate()?;
        self.ensure_stores_exist(&new_user.stores).await?;
        let hash = hash_blocking(new_user.password.clone(), self.password_cost).await?;
        let user = new_user.into_user(hash, Utc::now())?;
        self.users.insert(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Admins see every user; others see users of the active store.
    pub async fn list(&self, ctx: &RequestContext) -> ServiceResult<Vec<User>> {
        let users = self.users.list().await?;
        if ctx.is_admin() {
            return Ok(users);
        }
        Ok(users
            .into_iter()
            .filter(|u| u.stores.contains(&ctx.store_id))
            .collect())
    }

    pub async fn get(&self, ctx: &RequestContext, id: UserId) -> ServiceResult<User> {
        let user = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;
        if ctx.is_admin() || ctx.user_id == id || user.stores.contains(&ctx.store_id) {
            Ok(user)
        } else {
            Err(DomainError::not_found(format!("user {id}")).into())
        }
    }

    #[instrument(skip(self, ctx, patch), fields(actor = %ctx.user_id, user_id = %id))]
    pub async fn update(&self, ctx: &RequestContext, id: UserId, patch: UserPatch) -> ServiceResult<User> {
        if ctx.user_id == id && (patch.role.is_some() || patch.status.is_some()) {
            return Err(ServiceError::Forbidden(
                "users cannot change their own role or status".to_string(),
            ));
        }
        if let Some(stores) = &patch.stores {
            self.ensure_stores_exist(stores).await?;
        }
        let mut user = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;
        user.apply_patch(patch, Utc::now())?;
        self.users.update(&user).await?;
        info!("user updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tillpoint_auth::Role;
    use tillpoint_core::ErrorKind;

    use crate::repository::Repositories;

    fn service(repos: &Repositories) -> UserService {
        UserService::new(repos.users.clone(), repos.stores.clone(), 4)
    }

    fn new_user(stores: Vec<StoreId>) -> NewUser {
        NewUser {
            email: "budi@example.com".into(),
            display_name: "Budi".into(),
            password: "correct horse".into(),
            role: Role::cashier(),
            stores,
        }
    }

    #[tokio::test]
    async fn unknown_store_assignment_is_not_found() {
        let repos = Repositories::in_memory();
        let admin = RequestContext::new(StoreId::new(), UserId::new(), Role::admin());
        let err = service(&repos)
            .create(&admin, new_user(vec![StoreId::new()]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let admin = RequestContext::new(StoreId::new(), UserId::new(), Role::admin());
        svc.create(&admin, new_user(vec![])).await.unwrap();
        let err = svc.create(&admin, new_user(vec![])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn users_may_rename_themselves_but_not_promote() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let admin = RequestContext::new(StoreId::new(), UserId::new(), Role::admin());
        let user = svc.create(&admin, new_user(vec![])).await.unwrap();
        let me = RequestContext::new(admin.store_id, user.id, Role::cashier());

        let renamed = svc
            .update(
                &me,
                user.id,
                UserPatch {
                    display_name: Some("Budi S.".into()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.display_name, "Budi S.");

        let err = svc
            .update(
                &me,
                user.id,
                UserPatch {
                    role: Some(Role::admin()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn non_admins_only_see_users_of_their_store() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let admin = RequestContext::new(StoreId::new(), UserId::new(), Role::admin());
        let user = svc.create(&admin, new_user(vec![])).await.unwrap();

        let manager = RequestContext::new(StoreId::new(), UserId::new(), Role::manager());
        assert!(svc.list(&manager).await.unwrap().is_empty());
        let err = svc.get(&manager, user.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(svc.list(&admin).await.unwrap().len(), 1);
    }
}
