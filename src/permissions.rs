//! Pure permission checks. No hidden state: every check is evaluated fresh
//! against the role and ownership values the caller just loaded.

use crate::db::models::Role;
use crate::routes::users::UpdateUserRequest;
use uuid::Uuid;

/// A super admin can manage any content; a content admin only content they
/// created.
pub fn can_manage_content(role: Role, resource_owner: Uuid, actor: Uuid) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::ContentAdmin => resource_owner == actor,
    }
}

/// Whether a patch against a protected user touches locked fields.
///
/// Protected accounts may only change name and password. Setting role or
/// email, flipping `is_protected` off, or deactivating the account is
/// rejected for every actor, super admins included.
pub fn protected_patch_rejected(patch: &UpdateUserRequest) -> bool {
    patch.role.is_some()
        || patch.email.is_some()
        || patch.is_protected == Some(false)
        || patch.is_active == Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;

    fn empty_patch() -> UpdateUserRequest {
        UpdateUserRequest {
            name: None,
            email: None,
            password: None,
            role: None,
            avatar: None,
            is_active: None,
            is_protected: None,
        }
    }

    #[test]
    fn test_super_admin_manages_any_content() {
        let owner = Uuid::new_v4();
        let actor = Uuid::new_v4();
        assert!(can_manage_content(Role::SuperAdmin, owner, actor));
    }

    #[test]
    fn test_content_admin_manages_only_own_content() {
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(can_manage_content(Role::ContentAdmin, actor, actor));
        assert!(!can_manage_content(Role::ContentAdmin, other, actor));
    }

    #[test]
    fn test_protected_patch_allows_name_and_password() {
        let patch = UpdateUserRequest {
            name: Some("New Name".to_string()),
            password: Some("new-password".to_string()),
            ..empty_patch()
        };
        assert!(!protected_patch_rejected(&patch));
    }

    #[test]
    fn test_protected_patch_rejects_role_change() {
        let patch = UpdateUserRequest {
            role: Some(Role::ContentAdmin),
            ..empty_patch()
        };
        assert!(protected_patch_rejected(&patch));
    }

    #[test]
    fn test_protected_patch_rejects_email_change() {
        let patch = UpdateUserRequest {
            email: Some("new@example.com".to_string()),
            ..empty_patch()
        };
        assert!(protected_patch_rejected(&patch));
    }

    #[test]
    fn test_protected_patch_rejects_deactivation() {
        let patch = UpdateUserRequest {
            is_active: Some(false),
            ..empty_patch()
        };
        assert!(protected_patch_rejected(&patch));
    }

    #[test]
    fn test_protected_patch_rejects_unprotecting() {
        let patch = UpdateUserRequest {
            is_protected: Some(false),
            ..empty_patch()
        };
        assert!(protected_patch_rejected(&patch));
    }

    #[test]
    fn test_protected_patch_allows_reactivation_and_reprotection() {
        let patch = UpdateUserRequest {
            is_active: Some(true),
            is_protected: Some(true),
            ..empty_patch()
        };
        assert!(!protected_patch_rejected(&patch));
    }
}
