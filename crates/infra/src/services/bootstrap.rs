//! First-run seeding of an admin account and its store.

use chrono::Utc;
use tracing::{info, instrument};

use tillpoint_auth::{NewUser, Role, User};
use tillpoint_stores::{NewStore, Store};

use super::auth::hash_blocking;
use crate::config::BootstrapAdmin;
use crate::error::ServiceResult;
use crate::repository::Repositories;

/// Create the configured admin and a first store, but only on an empty user
/// table. Returns `None` when users already exist.
#[instrument(skip(repos, admin, password_cost), fields(email = %admin.email))]
pub async fn bootstrap_admin(
    repos: &Repositories,
    admin: &BootstrapAdmin,
    password_cost: u32,
) -> ServiceResult<Option<(Store, User)>> {
    if repos.users.count().await? > 0 {
        return Ok(None);
    }

    let now = Utc::now();
    let store = NewStore {
        name: admin.store_name.clone(),
        address: None,
        phone: None,
    }
    .into_store(now)?;

    let new_user = NewUser {
        email: admin.email.clone(),
        display_name: "Administrator".to_string(),
        password: admin.password.clone(),
        role: Role::admin(),
        stores: vec![store.id],
    };
    new_user.validate()?;
    let hash = hash_blocking(admin.password.clone(), password_cost).await?;
    let user = new_user.into_user(hash, now)?;

    repos.stores.insert(&store).await?;
    repos.users.insert(&user).await?;
    info!(store_id = %store.id, user_id = %user.id, "bootstrap admin created");
    Ok(Some((store, user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            email: "Owner@Example.com".into(),
            password: "correct horse".into(),
            store_name: "Main Store".into(),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let repos = Repositories::in_memory();
        let (store, user) = bootstrap_admin(&repos, &admin(), 4).await.unwrap().unwrap();
        assert_eq!(user.role, Role::admin());
        assert_eq!(user.stores, vec![store.id]);
        assert_eq!(user.email, "owner@example.com");

        assert!(bootstrap_admin(&repos, &admin(), 4).await.unwrap().is_none());
        assert_eq!(repos.stores.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_writing() {
        let repos = Repositories::in_memory();
        let mut weak = admin();
        weak.password = "short".into();
        assert!(bootstrap_admin(&repos, &weak, 4).await.is_err());
        assert!(repos.stores.list().await.unwrap().is_empty());
    }
}
