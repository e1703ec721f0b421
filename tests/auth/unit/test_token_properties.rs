use std::time::Duration;

use dyhe::auth::{
    jwt::{Claims, TokenKind},
    AuthError, JwtKeys, Role,
};
use dyhe::domain::UserId;
use proptest::prelude::*;

fn keys() -> JwtKeys {
    JwtKeys::new(
        b"property-access-secret-0123456789abcdef",
        b"property-refresh-secret-0123456789abcdef",
        Duration::from_secs(900),
        Duration::from_secs(86_400),
    )
}

fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn issued_pairs_verify_with_matching_kind(role in role()) {
        let keys = keys();
        let user_id = UserId::new();
        let pair = keys.issue_pair(&user_id, role).unwrap();

        let access = keys.verify_access(&pair.access_token).unwrap();
        prop_assert_eq!(access.sub, user_id.to_string());
        prop_assert_eq!(access.role, Some(role));

        let refresh = keys.verify_refresh(&pair.refresh_token).unwrap();
        prop_assert_eq!(refresh.role, None);

        prop_assert!(matches!(keys.verify_access(&pair.refresh_token), Err(AuthError::TokenMalformed)));
        prop_assert!(matches!(keys.verify_refresh(&pair.access_token), Err(AuthError::TokenMalformed)));
    }

    #[test]
    fn anything_past_expiry_is_expired(role in role(), seconds_ago in 1i64..100_000) {
        let keys = keys();
        let mut claims = Claims::new(TokenKind::Access, &UserId::new(), Some(role), Duration::ZERO);
        claims.exp -= seconds_ago;
        let token = keys.sign(&claims).unwrap();

        prop_assert!(matches!(keys.verify_access(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn foreign_secrets_are_malformed(secret in "[a-zA-Z0-9]{32,48}", role in role()) {
        prop_assume!(secret != "property-access-secret-0123456789abcdef");
        let foreign = JwtKeys::new(
            secret.as_bytes(),
            b"unused-refresh-secret-000000000000000000",
            Duration::from_secs(900),
            Duration::from_secs(86_400),
        );
        let pair = foreign.issue_pair(&UserId::new(), role).unwrap();

        prop_assert!(matches!(keys().verify_access(&pair.access_token), Err(AuthError::TokenMalformed)));
    }

    #[test]
    fn garbage_never_verifies(token in "[A-Za-z0-9._-]{0,200}") {
        prop_assert!(keys().verify_access(&token).is_err());
    }
}
