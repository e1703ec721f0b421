use dyhe::guard::{GuardDecision, RouteGuard};
use proptest::prelude::*;

fn guard() -> RouteGuard {
    RouteGuard::new(["/dashboard", "/users", "/packages"], "/sign-in", "/dashboard")
}

proptest! {
    #[test]
    fn nested_protected_paths_redirect_anonymous(
        prefix in prop::sample::select(vec!["/dashboard", "/users", "/packages"]),
        tail in "(/[a-z0-9-]{1,12}){0,3}",
    ) {
        let path = format!("{}{}", prefix, tail);
        match guard().decide(&path, false) {
            GuardDecision::RedirectToSignIn(location) => {
                prop_assert!(location.starts_with("/sign-in?redirect="));
                prop_assert!(location.ends_with(&path));
            }
            other => prop_assert!(false, "unexpected {:?} for {}", other, path),
        }
    }

    #[test]
    fn tokens_always_pass_protected_paths(
        prefix in prop::sample::select(vec!["/dashboard", "/users", "/packages"]),
        tail in "(/[a-z0-9-]{1,12}){0,3}",
    ) {
        let path = format!("{}{}", prefix, tail);
        prop_assert_eq!(guard().decide(&path, true), GuardDecision::Pass);
    }

    #[test]
    fn glued_suffixes_are_not_protected(
        prefix in prop::sample::select(vec!["/dashboard", "/users", "/packages"]),
        suffix in "[a-z0-9]{1,8}",
    ) {
        let path = format!("{}{}", prefix, suffix);
        prop_assert!(!guard().is_protected(&path));
        prop_assert_eq!(guard().decide(&path, false), GuardDecision::Pass);
    }

    #[test]
    fn unrelated_paths_pass_either_way(path in "/(api|assets|public)(/[a-z0-9]{1,8}){0,3}", has_token: bool) {
        prop_assert_eq!(guard().decide(&path, has_token), GuardDecision::Pass);
    }
}
