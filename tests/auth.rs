#[cfg(test)]
mod tests {
    use artmart_server::shared::types::account::{permissions_for, permissions_for_name, Account, Role};
    use artmart_server::shared::util::auth::{require_permission, require_role, AuthError};
    use artmart_server::shared::util::jwt::{self, TokenError};
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
    fn permission_sets() {
        for role in [Role::User, Role::Manager, Role::Admin] {
            assert!(!permissions_for(role).is_empty(), "Every role grants at least one permission");
            assert_eq!(permissions_for(role), permissions_for(role), "Same role, same set, every time");
        }

        assert!(permissions_for(Role::User).contains(&"create_post"), "Users can create posts");
        assert!(!permissions_for(Role::User).contains(&"suspend_user"), "Users cannot suspend anyone");
        assert!(permissions_for(Role::Manager).contains(&"approve_post"), "Managers approve posts");
        assert!(!permissions_for(Role::Manager).contains(&"change_role"), "Managers cannot change roles");

        // The inherited quirk: managers approve posts, admins do not
        assert!(!permissions_for(Role::Admin).contains(&"approve_post"), "Admins do not carry approve_post");
        assert!(permissions_for(Role::Admin).contains(&"delete_user"), "Admins delete users");
    }

    #[test]
    fn permission_lookup_by_name() {
        assert_eq!(permissions_for_name("manager"), permissions_for(Role::Manager), "Known names resolve to their set");
        assert!(permissions_for_name("superuser").is_empty(), "Unknown role degrades to no permissions");
        assert!(permissions_for_name("").is_empty(), "Empty role degrades to no permissions");
    }

    #[test]
    fn permission_checks() {
        let user = account_with_role(Role::User);
        let manager = account_with_role(Role::Manager);
        let admin = account_with_role(Role::Admin);

        assert!(require_permission(&user, "create_post").is_ok(), "Users may create posts");
        assert_eq!(require_permission(&user, "approve_post"), Err(AuthError::Forbidden), "Users may not approve posts");
        assert!(require_permission(&manager, "approve_post").is_ok(), "Managers may approve posts");
        assert_eq!(require_permission(&admin, "approve_post"), Err(AuthError::Forbidden), "Admin role does not include approval");
        assert!(require_permission(&admin, "change_role").is_ok(), "Admins may change roles");
        assert_eq!(require_permission(&manager, "change_role"), Err(AuthError::Forbidden), "Managers may not change roles");
    }

    #[test]
    fn role_checks() {
        let manager = account_with_role(Role::Manager);

        assert!(require_role(&manager, &[Role::Manager, Role::Admin]).is_ok(), "Role in the allowed set");
        assert_eq!(require_role(&manager, &[Role::Admin]), Err(AuthError::Forbidden), "Role not in the allowed set");
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Admin"), None, "Role names are exact");
        assert_eq!(Role::parse("owner"), None, "Unknown role does not parse");
    }

    #[test]
    fn token_round_trip() {
        let secret = b"test-secret-that-is-plenty-long-for-hs256";
        let id = Uuid::new_v4();

        let token = jwt::sign(id, "al@x.com", "user", secret, 3600).unwrap();
        let claims = jwt::verify(&token, secret).unwrap();

        assert_eq!(claims.sub, id, "Account id survives the round trip");
        assert_eq!(claims.email, "al@x.com", "Email survives the round trip");
        assert_eq!(claims.role, "user", "Role at issuance survives the round trip");
        assert_eq!(claims.exp - claims.iat, 3600, "Expiry is issuance plus the ttl");
    }

    #[test]
    fn token_expiry() {
        let secret = b"test-secret-that-is-plenty-long-for-hs256";

        let token = jwt::sign(Uuid::new_v4(), "al@x.com", "user", secret, -3600).unwrap();
        assert_eq!(jwt::verify(&token, secret), Err(TokenError::Expired), "Stale tokens report expiry");
    }

    #[test]
    fn token_tampering() {
        let secret = b"test-secret-that-is-plenty-long-for-hs256";
        let other_secret = b"a-completely-different-signing-secret";

        let token = jwt::sign(Uuid::new_v4(), "al@x.com", "admin", secret, 3600).unwrap();
        assert_eq!(jwt::verify(&token, other_secret), Err(TokenError::Invalid), "Wrong secret fails the signature check");
        assert_eq!(jwt::verify("not.a.token", secret), Err(TokenError::Invalid), "Garbage is rejected outright");
    }
}
