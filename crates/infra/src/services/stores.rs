use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use tillpoint_core::{DomainError, StoreId};
use tillpoint_stores::{NewStore, Store, StorePatch};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{StoreRepository, UserRepository};

#[derive(Clone)]
pub struct StoreService {
    stores: Arc<dyn StoreRepository>,
    users: Arc<dyn UserRepository>,
}

impl StoreService {
    pub fn new(stores: Arc<dyn StoreRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { stores, users }
    }

    #[instrument(skip(self, ctx, new_store), fields(actor = %ctx.user_id))]
    pub async fn create(&self, ctx: &RequestContext, new_store: NewStore) -> ServiceResult<Store> {
        let store = new_store.into_store(Utc::now())?;
        self.stores.insert(&store).await?;
        info!(store_id = %store.id, "store created");
        Ok(store)
    }

    /// Stores the caller may act in: every store for admins, the assigned
    /// ones for everyone else.
    pub async fn list_accessible(&self, ctx: &RequestContext) -> ServiceResult<Vec<Store>> {
        let stores = self.stores.list().await?;
        if ctx.is_admin() {
            return Ok(stores);
        }
        let user = self
            .users
            .get(ctx.user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        Ok(stores
            .into_iter()
            .filter(|s| user.stores.contains(&s.id))
            .collect())
    }

    pub async fn get(&self, ctx: &RequestContext, id: StoreId) -> ServiceResult<Store> {
        let visible = self.list_accessible(ctx).await?;
        visible
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| DomainError::not_found(format!("store {id}")).into())
    }

    #[instrument(skip(self, ctx, patch), fields(actor = %ctx.user_id, store_id = %id))]
    pub async fn update(&self, ctx: &RequestContext, id: StoreId, patch: StorePatch) -> ServiceResult<Store> {
        let mut store = self.get(ctx, id).await?;
        store.apply_patch(patch, Utc::now())?;
        self.stores.update(&store).await?;
        info!("store updated");
        Ok(store)
    }

    /// Deleting a store removes all of its data.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, store_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: StoreId) -> ServiceResult<()> {
        if ctx.store_id == id {
            warn!("refusing to delete the active store");
            return Err(ServiceError::Domain(DomainError::conflict(
                "cannot delete the store you are acting in",
            )));
        }
        if !self.stores.delete(id).await? {
            return Err(DomainError::not_found(format!("store {id}")).into());
        }
        info!("store deleted");
        Ok(())
    }
}
