use tillpoint_auth::{Principal, Role};
use tillpoint_core::{StoreId, UserId};

/// Who is acting, and in which store. Passed explicitly to every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub store_id: StoreId,
    pub user_id: UserId,
    pub role: Role,
}

impl RequestContext {
    pub fn new(store_id: StoreId, user_id: UserId, role: Role) -> Self {
        Self {
            store_id,
            user_id,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::admin()
    }

    /// Managers and admins may act on other operators' records.
    pub fn can_supervise(&self) -> bool {
        self.is_admin() || self.role == Role::manager()
    }
}

impl From<&Principal> for RequestContext {
    fn from(principal: &Principal) -> Self {
        Self::new(principal.active_store_id, principal.user_id, principal.role().clone())
    }
}
