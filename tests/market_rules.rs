#[cfg(test)]
mod tests {
    use artmart_server::shared::types::account::{Account, Role};
    use artmart_server::shared::util::auth::{
        assert_can_mutate, check_account_delete, check_role_change, AuthError, RoleChangeError
    };
    use uuid::Uuid;

    fn account_with_role(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Al".to_string(),
            email: "al@x.com".to_string(),
            bio: "".to_string(),
            pfp_url: "".to_string(),
            role,
            suspended: false,
            created: chrono::offset::Utc::now(),
            settings: serde_json::from_str("{}").unwrap()
        }
    }

    #[test]
    fn role_change_validation() {
        let admin = account_with_role(Role::Admin);
        let other = Uuid::new_v4();

        assert_eq!(check_role_change(&admin, &other, "owner"), Err(RoleChangeError::InvalidRole),
            "Unknown role names are rejected");
        assert_eq!(check_role_change(&admin, &other, ""), Err(RoleChangeError::InvalidRole),
            "Empty role is rejected");
        assert_eq!(check_role_change(&admin, &other, "manager"), Ok(Role::Manager),
            "Admins promote other accounts freely");
    }

    #[test]
    fn admins_cannot_demote_themselves() {
        let admin = account_with_role(Role::Admin);

        assert_eq!(check_role_change(&admin, &admin.id.clone(), "manager"),
            Err(RoleChangeError::SelfDemotionForbidden),
            "An admin cannot drop to manager");
        assert_eq!(check_role_change(&admin, &admin.id.clone(), "user"),
            Err(RoleChangeError::SelfDemotionForbidden),
            "An admin cannot drop to user");
        assert_eq!(check_role_change(&admin, &admin.id.clone(), "admin"), Ok(Role::Admin),
            "Admin to admin on yourself is a no-op, not an error");
    }

    #[test]
    fn self_protection_is_admin_only() {
        // The rule is deliberately asymmetric: nothing stops a manager
        // or user from having their own role changed
        let manager = account_with_role(Role::Manager);
        let user = account_with_role(Role::User);

        assert_eq!(check_role_change(&manager, &manager.id.clone(), "user"), Ok(Role::User),
            "Managers have no self-demotion protection");
        assert_eq!(check_role_change(&user, &user.id.clone(), "admin"), Ok(Role::Admin),
            "The guard itself does not block promotion, permissions do");
    }

    #[test]
    fn post_mutation_ownership() {
        let owner = account_with_role(Role::User);
        let stranger = account_with_role(Role::User);
        let manager = account_with_role(Role::Manager);
        let admin = account_with_role(Role::Admin);
        let owner_id = owner.id.clone();

        assert!(assert_can_mutate(&owner, &owner_id).is_ok(), "Owners mutate their own posts");
        assert!(assert_can_mutate(&admin, &owner_id).is_ok(), "Admins mutate anyone's posts");
        assert_eq!(assert_can_mutate(&stranger, &owner_id), Err(AuthError::Forbidden),
            "Strangers do not");
        assert_eq!(assert_can_mutate(&manager, &owner_id), Err(AuthError::Forbidden),
            "Manager role grants no ownership bypass");
    }

    #[test]
    fn no_account_deletes_itself() {
        let admin = account_with_role(Role::Admin);
        let user = account_with_role(Role::User);

        assert_eq!(check_account_delete(&admin, &admin.id.clone()), Err(AuthError::Forbidden),
            "Not even admins delete their own account");
        assert_eq!(check_account_delete(&user, &user.id.clone()), Err(AuthError::Forbidden),
            "Users cannot delete their own account");
        assert!(check_account_delete(&admin, &user.id.clone()).is_ok(),
            "Deleting someone else passes this check");
    }
}
