//! # Authorization Predicates
//!
//! Named boolean checks over an explicit [`AuthzContext`] and a read-only
//! [`AuthzDirectory`]. There is no ambient request state: the principal and
//! the institution a request is scoped to travel in the context.
//!
//! Every predicate fails closed. A missing principal, a missing scoping id,
//! a missing row, or a directory failure all evaluate to `false`.
//!
//! [`PolicyRegistry`] maps policy names to predicates so callers can gate
//! operations by name. Names are sorted (BTreeMap), so listings are stable.

use std::collections::BTreeMap;

use lexaccess_core::{
    AuthzDirectory, InstitutionId, Principal, PrincipalDirectory, PrincipalId, StoreError,
    ADMIN_ROLE,
};

/// Permission code that lets a principal approve institution users.
pub const APPROVE_USERS_PERMISSION: &str = "users.approve";

/// Registry name of [`global_admin`].
pub const GLOBAL_ADMIN: &str = "GlobalAdmin";
/// Registry name of [`approved_user`].
pub const APPROVED_USER: &str = "ApprovedUser";
/// Registry name of [`institution_admin`].
pub const INSTITUTION_ADMIN: &str = "InstitutionAdmin";
/// Registry name of [`can_approve_institution_users`].
pub const CAN_APPROVE_INSTITUTION_USERS: &str = "CanApproveInstitutionUsers";

// ---------------------------------------------------------------------------
// AuthzContext
// ---------------------------------------------------------------------------

/// Who is asking, and which institution the request is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzContext {
    /// The authenticated principal, if any.
    pub principal: Option<Principal>,
    /// The institution named by the request route, if any.
    pub institution_id: Option<InstitutionId>,
}

impl AuthzContext {
    /// A context with no principal and no scope.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context for `principal`, unscoped.
    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            institution_id: None,
        }
    }

    /// Scope the context to an institution.
    pub fn scoped_to(mut self, institution_id: InstitutionId) -> Self {
        self.institution_id = Some(institution_id);
        self
    }

    /// Build a context from raw identity and route claims.
    ///
    /// An unparsable or unknown principal claim leaves the principal empty;
    /// an unparsable institution claim leaves the scope empty. A directory
    /// failure is logged and treated as unknown.
    pub fn from_claims<D>(
        directory: &D,
        principal_claim: Option<&str>,
        institution_claim: Option<&str>,
    ) -> Self
    where
        D: ?Sized + PrincipalDirectory,
    {
        let principal = principal_claim
            .and_then(|claim| PrincipalId::parse_claim(claim).ok())
            .and_then(|id| fail_closed(directory.principal(id), "principal claim").flatten());
        let institution_id =
            institution_claim.and_then(|claim| InstitutionId::parse_claim(claim).ok());
        Self {
            principal,
            institution_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// The principal carries the explicit global-administrator flag.
pub fn global_admin(ctx: &AuthzContext) -> bool {
    ctx.principal.as_ref().is_some_and(|p| p.is_global_admin)
}

/// The principal's account is approved.
pub fn approved_user(ctx: &AuthzContext) -> bool {
    ctx.principal.as_ref().is_some_and(|p| p.approved)
}

/// Global admin, or the `Admin` role together with an active assignment of
/// `code`. The role label alone grants nothing.
pub fn has_permission(ctx: &AuthzContext, directory: &dyn AuthzDirectory, code: &str) -> bool {
    let Some(principal) = ctx.principal.as_ref() else {
        return false;
    };
    if principal.is_global_admin {
        return true;
    }
    let code = code.trim();
    if code.is_empty() || principal.role != ADMIN_ROLE {
        return false;
    }
    let granted = directory.has_active_permission(principal.id, code);
    fail_closed(granted, "has_permission").unwrap_or(false)
}

/// Global admin, or an approved and active `admin` membership in the scoped
/// institution.
pub fn institution_admin(ctx: &AuthzContext, directory: &dyn AuthzDirectory) -> bool {
    let Some(principal) = ctx.principal.as_ref() else {
        return false;
    };
    if principal.is_global_admin {
        return true;
    }
    let Some(institution_id) = ctx.institution_id.filter(|id| id.is_assigned()) else {
        return false;
    };
    let membership = directory.membership(principal.id, institution_id);
    fail_closed(membership, "institution_admin")
        .flatten()
        .is_some_and(|m| m.grants_institution_admin())
}

/// Global admin, the `users.approve` permission, or institution admin of the
/// scoped institution.
pub fn can_approve_institution_users(ctx: &AuthzContext, directory: &dyn AuthzDirectory) -> bool {
    global_admin(ctx)
        || has_permission(ctx, directory, APPROVE_USERS_PERMISSION)
        || institution_admin(ctx, directory)
}

fn fail_closed<T>(result: Result<T, StoreError>, predicate: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(predicate, error = %err, "directory read failed, denying");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// PolicyRegistry
// ---------------------------------------------------------------------------

/// A named predicate.
pub type Predicate = Box<dyn Fn(&AuthzContext, &dyn AuthzDirectory) -> bool + Send + Sync>;

/// Policy name to predicate.
#[derive(Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, Predicate>,
}

impl PolicyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the four standard policies.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(GLOBAL_ADMIN, |ctx, _| global_admin(ctx));
        registry.register(APPROVED_USER, |ctx, _| approved_user(ctx));
        registry.register(INSTITUTION_ADMIN, institution_admin);
        registry.register(CAN_APPROVE_INSTITUTION_USERS, can_approve_institution_users);
        registry
    }

    /// Register a predicate. Replaces any policy with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&AuthzContext, &dyn AuthzDirectory) -> bool + Send + Sync + 'static,
    {
        self.policies.insert(name.into(), Box::new(predicate));
    }

    /// Register a policy satisfied by [`has_permission`] for `code`.
    pub fn register_permission(&mut self, name: impl Into<String>, code: impl Into<String>) {
        let code = code.into();
        self.register(name, move |ctx, directory| {
            has_permission(ctx, directory, &code)
        });
    }

    /// Evaluate the named policy. Unknown names evaluate to `false`.
    pub fn evaluate(&self, name: &str, ctx: &AuthzContext, dir: &dyn AuthzDirectory) -> bool {
        match self.policies.get(name) {
            Some(predicate) => predicate(ctx, dir),
            None => {
                tracing::debug!(policy = name, "unknown policy, denying");
                false
            }
        }
    }

    /// Whether a policy is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policy is registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("policies", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexaccess_core::{
        MemberType, Membership, MembershipStatus, MembershipStore, PermissionAssignment,
        PermissionStore, Snapshot,
    };

    fn principal(id: i64) -> Principal {
        Principal {
            id: PrincipalId::new(id),
            approved: true,
            is_global_admin: false,
            role: "User".into(),
            institution_id: None,
        }
    }

    fn directory() -> Snapshot {
        let mut admin = principal(2);
        admin.role = ADMIN_ROLE.into();
        Snapshot {
            principals: vec![principal(1), admin],
            memberships: vec![Membership {
                principal_id: PrincipalId::new(1),
                institution_id: InstitutionId::new(10),
                member_type: MemberType::Admin,
                status: MembershipStatus::Approved,
                is_active: true,
                approved_at: None,
            }],
            permissions: vec![
                PermissionAssignment {
                    principal_id: PrincipalId::new(2),
                    code: APPROVE_USERS_PERMISSION.into(),
                    is_active: true,
                },
                PermissionAssignment {
                    principal_id: PrincipalId::new(2),
                    code: "reports.export".into(),
                    is_active: false,
                },
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn global_admin_satisfies_everything() {
        let dir = directory();
        let mut root = principal(99);
        root.is_global_admin = true;
        let ctx = AuthzContext::for_principal(root);
        assert!(global_admin(&ctx));
        assert!(has_permission(&ctx, &dir, "anything"));
        assert!(institution_admin(&ctx, &dir));
        assert!(can_approve_institution_users(&ctx, &dir));
    }

    #[test]
    fn anonymous_context_is_denied() {
        let dir = directory();
        let ctx = AuthzContext::anonymous();
        assert!(!global_admin(&ctx));
        assert!(!approved_user(&ctx));
        assert!(!has_permission(&ctx, &dir, APPROVE_USERS_PERMISSION));
        assert!(!can_approve_institution_users(&ctx, &dir));
    }

    #[test]
    fn permission_needs_admin_role_and_active_assignment() {
        let dir = directory();
        let mut admin = principal(2);
        admin.role = ADMIN_ROLE.into();
        let ctx = AuthzContext::for_principal(admin.clone());
        assert!(has_permission(&ctx, &dir, APPROVE_USERS_PERMISSION));
        assert!(!has_permission(&ctx, &dir, "reports.export"));

        admin.role = "User".into();
        let ctx = AuthzContext::for_principal(admin);
        assert!(!has_permission(&ctx, &dir, APPROVE_USERS_PERMISSION));
    }

    #[test]
    fn admin_role_label_alone_grants_nothing() {
        let dir = directory();
        let mut p = principal(3);
        p.role = ADMIN_ROLE.into();
        let ctx = AuthzContext::for_principal(p).scoped_to(InstitutionId::new(10));
        assert!(!global_admin(&ctx));
        assert!(!has_permission(&ctx, &dir, APPROVE_USERS_PERMISSION));
        assert!(!institution_admin(&ctx, &dir));
    }

    #[test]
    fn institution_admin_is_scoped() {
        let dir = directory();
        let ctx = AuthzContext::for_principal(principal(1));
        assert!(!institution_admin(&ctx, &dir));
        assert!(institution_admin(&ctx.clone().scoped_to(InstitutionId::new(10)), &dir));
        assert!(!institution_admin(&ctx.clone().scoped_to(InstitutionId::new(11)), &dir));
        assert!(!institution_admin(&ctx.scoped_to(InstitutionId::new(0)), &dir));
    }

    #[test]
    fn from_claims_fails_closed_on_bad_claims() {
        let dir = directory();
        let ctx = AuthzContext::from_claims(&dir, Some("1"), Some("10"));
        assert_eq!(ctx.principal.as_ref().map(|p| p.id.get()), Some(1));
        assert_eq!(ctx.institution_id, Some(InstitutionId::new(10)));

        let ctx = AuthzContext::from_claims(&dir, Some("not-a-number"), Some("x"));
        assert_eq!(ctx, AuthzContext::anonymous());

        let ctx = AuthzContext::from_claims(&dir, Some("404"), None);
        assert!(ctx.principal.is_none());
    }

    struct DownDirectory;

    fn down() -> StoreError {
        StoreError::Unavailable {
            store: "directory",
            reason: "timeout".into(),
        }
    }

    impl PrincipalDirectory for DownDirectory {
        fn principal(&self, _id: PrincipalId) -> Result<Option<Principal>, StoreError> {
            Err(down())
        }
    }

    impl MembershipStore for DownDirectory {
        fn membership(
            &self,
            _p: PrincipalId,
            _i: InstitutionId,
        ) -> Result<Option<Membership>, StoreError> {
            Err(down())
        }
        fn memberships_of_type(
            &self,
            _i: InstitutionId,
            _t: MemberType,
        ) -> Result<Vec<Membership>, StoreError> {
            Err(down())
        }
    }

    impl PermissionStore for DownDirectory {
        fn has_active_permission(&self, _p: PrincipalId, _c: &str) -> Result<bool, StoreError> {
            Err(down())
        }
    }

    #[test]
    fn directory_failure_denies() {
        let mut admin = principal(2);
        admin.role = ADMIN_ROLE.into();
        let ctx = AuthzContext::for_principal(admin).scoped_to(InstitutionId::new(10));
        assert!(!has_permission(&ctx, &DownDirectory, APPROVE_USERS_PERMISSION));
        assert!(!institution_admin(&ctx, &DownDirectory));
        assert!(!can_approve_institution_users(&ctx, &DownDirectory));
        assert!(AuthzContext::from_claims(&DownDirectory, Some("2"), None)
            .principal
            .is_none());
    }

    #[test]
    fn registry_standard_policies() {
        let dir = directory();
        let registry = PolicyRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                APPROVED_USER,
                CAN_APPROVE_INSTITUTION_USERS,
                GLOBAL_ADMIN,
                INSTITUTION_ADMIN
            ]
        );
        let ctx = AuthzContext::for_principal(principal(1)).scoped_to(InstitutionId::new(10));
        assert!(registry.evaluate(APPROVED_USER, &ctx, &dir));
        assert!(registry.evaluate(INSTITUTION_ADMIN, &ctx, &dir));
        assert!(registry.evaluate(CAN_APPROVE_INSTITUTION_USERS, &ctx, &dir));
        assert!(!registry.evaluate(GLOBAL_ADMIN, &ctx, &dir));
    }

    #[test]
    fn registry_unknown_policy_is_false() {
        let dir = directory();
        let mut root = principal(1);
        root.is_global_admin = true;
        let ctx = AuthzContext::for_principal(root);
        assert!(!PolicyRegistry::standard().evaluate("NoSuchPolicy", &ctx, &dir));
    }

    #[test]
    fn registry_permission_policy() {
        let dir = directory();
        let mut registry = PolicyRegistry::new();
        assert!(registry.is_empty());
        registry.register_permission("CanApproveUsers", APPROVE_USERS_PERMISSION);
        assert!(registry.contains("CanApproveUsers"));
        let mut admin = principal(2);
        admin.role = ADMIN_ROLE.into();
        assert!(registry.evaluate(
            "CanApproveUsers",
            &AuthzContext::for_principal(admin),
            &dir
        ));
        assert!(!registry.evaluate(
            "CanApproveUsers",
            &AuthzContext::for_principal(principal(1)),
            &dir
        ));
    }
}
