use tillpoint_auth::Principal;

pub use tillpoint_infra::RequestContext;

/// Authenticated principal for a request, resolved against the active store.
///
/// Inserted by the auth middleware next to the [`RequestContext`] handed to
/// services; handlers use it for permission checks only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext::from(&self.principal)
    }
}
