use serde::{Deserialize, Serialize};

use crate::storage::models::StoredUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Worker,
}

/// Group every worker account is created in.
pub const WORKER_GROUP: &str = "trabajadores";

// "adimistradores" is a misspelling present in existing deployments.
const ADMIN_GROUPS: &[&str] = &["administradores", "administrador", "admins", "adimistradores"];
const WORKER_GROUPS: &[&str] = &["trabajadores", "trabajador"];

fn in_any_group(groups: &[String], names: &[&str]) -> bool {
    groups
        .iter()
        .any(|g| names.contains(&g.trim().to_lowercase().as_str()))
}

pub fn is_admin(user: &StoredUser) -> bool {
    user.is_superuser || in_any_group(&user.groups, ADMIN_GROUPS)
}

pub fn is_worker(user: &StoredUser) -> bool {
    in_any_group(&user.groups, WORKER_GROUPS)
}

pub fn roles_for(user: &StoredUser) -> Vec<Role> {
    let mut roles = Vec::new();
    if is_admin(user) {
        roles.push(Role::Admin);
    }
    if is_worker(user) {
        roles.push(Role::Worker);
    }
    roles
}

pub fn has_role(user: &StoredUser, role: Role) -> bool {
    match role {
        Role::Admin => is_admin(user),
        Role::Worker => is_worker(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(is_superuser: bool, groups: &[&str]) -> StoredUser {
        StoredUser {
            uid: "u1".to_string(),
            username: "ana".to_string(),
            email: None,
            password_hash: String::new(),
            is_superuser,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn superuser_is_admin_without_groups() {
        assert!(is_admin(&user(true, &[])));
        assert!(!is_worker(&user(true, &[])));
    }

    #[test]
    fn admin_group_names_are_normalised() {
        assert!(is_admin(&user(false, &["  Administradores "])));
        assert!(is_admin(&user(false, &["ADMINS"])));
        assert!(is_admin(&user(false, &["adimistradores"])));
        assert!(!is_admin(&user(false, &["administration"])));
    }

    #[test]
    fn worker_groups() {
        assert!(is_worker(&user(false, &["Trabajador"])));
        assert!(is_worker(&user(false, &["trabajadores"])));
        assert!(!is_worker(&user(false, &["clientes"])));
    }

    #[test]
    fn user_can_hold_both_roles() {
        let both = user(false, &["admins", "trabajadores"]);
        assert_eq!(roles_for(&both), vec![Role::Admin, Role::Worker]);
        assert!(roles_for(&user(false, &[])).is_empty());
    }
}
