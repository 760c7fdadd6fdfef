use rentfold_core::{AppError, AppResult, Role, UserIdentity};

/// Application service for role and ownership checks.
///
/// Role failures surface as `Forbidden`. Ownership failures surface as
/// `NotFound`, so a caller probing ids cannot distinguish a resource that
/// does not exist from one scoped to another owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationService;

impl AuthorizationService {
    /// Creates the authorization service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Ensures the identity holds one of the allowed roles.
    pub fn require_role(&self, identity: &UserIdentity, allowed: &[Role]) -> AppResult<()> {
        if allowed.contains(&identity.role()) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "role '{}' is not permitted for this operation",
            identity.role().as_str()
        )))
    }

    /// Ensures an owner-scoped resource is visible to the identity.
    ///
    /// Admin and staff see every resource. Other roles see unscoped
    /// resources and resources whose owner subject matches their own.
    pub fn ensure_resource_visible(
        &self,
        identity: &UserIdentity,
        resource_kind: &str,
        resource_id: &str,
        owner_subject: Option<&str>,
    ) -> AppResult<()> {
        if matches!(identity.role(), Role::Admin | Role::Staff) {
            return Ok(());
        }

        match owner_subject {
            None => Ok(()),
            Some(owner) if owner == identity.subject() => Ok(()),
            Some(_) => Err(AppError::NotFound(format!(
                "{resource_kind} '{resource_id}' not found"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use rentfold_core::{AppError, Role, UserIdentity};

    use super::AuthorizationService;

    fn identity(subject: &str, role: Role) -> UserIdentity {
        UserIdentity::new(
            subject.to_owned(),
            "Test User".to_owned(),
            Some(format!("{subject}@example.com")),
            role,
        )
    }

    #[test]
    fn require_role_allows_listed_role() {
        let service = AuthorizationService::new();
        let staff = identity("staff-1", Role::Staff);

        assert!(service
            .require_role(&staff, &[Role::Admin, Role::Staff])
            .is_ok());
    }

    #[test]
    fn require_role_rejects_unlisted_role() {
        let service = AuthorizationService::new();
        let tenant = identity("tenant-1", Role::Tenant);

        let result = service.require_role(&tenant, &[Role::Admin, Role::Staff]);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn ownership_mismatch_surfaces_as_not_found() {
        let service = AuthorizationService::new();
        let owner = identity("owner-1", Role::Owner);

        let result =
            service.ensure_resource_visible(&owner, "workflow", "wf-9", Some("owner-2"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn owner_sees_own_and_unscoped_resources() {
        let service = AuthorizationService::new();
        let owner = identity("owner-1", Role::Owner);

        assert!(service
            .ensure_resource_visible(&owner, "workflow", "wf-1", Some("owner-1"))
            .is_ok());
        assert!(service
            .ensure_resource_visible(&owner, "workflow", "wf-2", None)
            .is_ok());
    }

    #[test]
    fn staff_sees_resources_owned_by_others() {
        let service = AuthorizationService::new();
        let staff = identity("staff-1", Role::Staff);

        assert!(service
            .ensure_resource_visible(&staff, "workflow", "wf-9", Some("owner-2"))
            .is_ok());
    }
}
