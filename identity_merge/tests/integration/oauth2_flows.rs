use identity_merge::{EmailStatusCode, ResolutionError};
use serde_json::json;

use crate::common::{Profiles, RecordingNotifier, TestEnv};

#[tokio::test]
async fn test_first_login_creates_root_account() {
    let env = TestEnv::memory();
    let raw = Profiles::google("g-100", "Founder@Example.com", "Founder");

    let account = env
        .resolver
        .resolve_oauth_profile("google", &raw, None)
        .await
        .expect("First login should create an account");

    assert_eq!(account.email, "founder@example.com");
    assert_eq!(account.name, "Founder");
    assert_eq!(account.email_status.code, EmailStatusCode::Confirmed);
    assert!(account.roles.contains("root"));
    assert!(account.validated_emails.contains("founder@example.com"));
    assert_eq!(account.provider_id("google"), Some("g-100"));
    assert_eq!(env.account_count().await, 1);

    let granted = env.access.granted();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].0, account.id);
}

#[tokio::test]
async fn test_returning_login_matches_by_provider_id() {
    let env = TestEnv::memory();
    let first = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(7, "octo", &["octo@old.example"]), None)
        .await
        .unwrap();

    // The address changed at the provider, the provider id did not
    let again = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(7, "octo", &["octo@new.example"]), None)
        .await
        .unwrap();

    assert_eq!(again.id, first.id);
    assert!(again.emails.contains("octo@old.example"));
    assert!(again.validated_emails.contains("octo@new.example"));
    assert_eq!(again.providers["github"].emails, vec!["octo@new.example".to_string()]);
    assert_eq!(env.account_count().await, 1);
}

#[tokio::test]
async fn test_single_confirmed_match_links_provider() {
    let env = TestEnv::memory();
    let existing = env.seed_account("existing", "jane@example.com", 30).await;

    let account = env
        .resolver
        .resolve_oauth_profile(
            "google",
            &Profiles::google("g-1", "jane@example.com", "Jane G"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(account.id, existing.id);
    assert_eq!(account.name, existing.name);
    assert_eq!(account.provider_id("google"), Some("g-1"));
    assert_eq!(env.account_count().await, 1);
    assert!(env.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_two_confirmed_matches_raise_conflict() {
    let env = TestEnv::memory();
    env.seed_account("by-email", "sam@example.com", 20).await;
    let mut by_validated = env.seed_account("by-validated", "sam@work.example", 10).await;
    by_validated
        .validated_emails
        .insert("sam.alt@example.com".to_string());
    env.save_account(by_validated).await;
    env.seed_account("bystander", "other@example.com", 5).await;

    let raw = Profiles::github(55, "sam", &["sam@example.com", "sam.alt@example.com"]);
    let result = env.resolver.resolve_oauth_profile("github", &raw, None).await;

    let Err(ResolutionError::MergeConflict(conflict)) = result else {
        panic!("Expected a merge conflict");
    };
    assert_eq!(conflict.candidate_ids(), vec!["by-email", "by-validated"]);
    assert!(!conflict.explanation.is_empty());

    // Nothing changed while escalating
    assert_eq!(env.account_count().await, 3);
    assert!(env.account("by-email").await.unwrap().providers.is_empty());
}

#[tokio::test]
async fn test_resolving_conflict_merges_into_selected_account() {
    let env = TestEnv::memory();
    env.seed_account("older", "pat@example.com", 20).await;
    env.seed_account("newer", "pat@home.example", 10).await;
    env.save("comments", json!({"id": "c1", "from": "older", "message": "first!"}))
        .await;

    let raw = Profiles::generic("ipb-3", "Pat", &["pat@example.com", "pat@home.example"]);
    assert!(matches!(
        env.resolver.resolve_oauth_profile("ipboard", &raw, None).await,
        Err(ResolutionError::MergeConflict(_))
    ));

    let account = env
        .resolver
        .resolve_merge_conflict("ipboard", &raw, "newer")
        .await
        .expect("Resubmission should merge");

    assert_eq!(account.id, "newer");
    assert!(account.emails.contains("pat@example.com"));
    assert_eq!(account.provider_id("ipboard"), Some("ipb-3"));
    assert!(env.account("older").await.is_none());
    assert_eq!(env.get("comments", "c1").await.unwrap()["from"], json!("newer"));

    let sent = env.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].survivor, "newer");
    assert_eq!(sent[0].removed, "older");
}

#[tokio::test]
async fn test_resolving_conflict_with_non_candidate_fails() {
    let env = TestEnv::memory();
    env.seed_account("a", "kim@example.com", 3).await;
    env.seed_account("b", "kim@example.org", 2).await;
    env.seed_account("outsider", "lee@example.com", 1).await;

    let raw = Profiles::google("g-kim", "kim@example.com", "Kim");
    let result = env
        .resolver
        .resolve_merge_conflict("google", &raw, "outsider")
        .await;

    assert!(matches!(result, Err(ResolutionError::InvalidMergeSelection(_))));
    assert_eq!(env.account_count().await, 3);
}

#[tokio::test]
async fn test_conflict_resolution_survives_notifier_failure() {
    let env = TestEnv::memory_with_notifier(RecordingNotifier::failing());
    env.seed_account("one", "dup@example.com", 2).await;
    let mut two = env.seed_account("two", "two@example.com", 1).await;
    two.emails.insert("dup@example.com".to_string());
    env.save_account(two).await;

    let raw = Profiles::google("g-dup", "dup@example.com", "Dup");
    let account = env
        .resolver
        .resolve_merge_conflict("google", &raw, "one")
        .await
        .expect("Notifier failures must not fail the merge");

    assert_eq!(account.id, "one");
    assert!(env.account("two").await.is_none());
}

#[tokio::test]
async fn test_signed_in_link_deletes_pending_registration() {
    let env = TestEnv::memory();
    let caller = env.seed_account("caller", "me@example.com", 40).await;
    let pending = env
        .seed_pending_registration("pending", "me@work.example", "tok-1")
        .await;
    env.save("comments", json!({"id": "c9", "from": "pending"})).await;

    let account = env
        .resolver
        .resolve_oauth_profile(
            "github",
            &Profiles::github(900, "me", &["me@work.example"]),
            Some(&caller),
        )
        .await
        .unwrap();

    assert_eq!(account.id, "caller");
    assert_eq!(account.provider_id("github"), Some("900"));
    assert!(env.account(&pending.id).await.is_none());
    // Deleted rather than merged: its references were not moved
    assert_eq!(env.get("comments", "c9").await.unwrap()["from"], json!("pending"));
    assert!(env.notifier.sent().is_empty());
    assert_eq!(env.access.revoked()[0].0, "pending");
}

#[tokio::test]
async fn test_signed_in_caller_absorbs_all_candidates_silently() {
    let env = TestEnv::memory();
    let caller = env.seed_account("caller", "alex@example.com", 50).await;
    env.seed_account("dup1", "alex@gmail.example", 10).await;
    env.seed_account("dup2", "alex@corp.example", 5).await;

    let raw = Profiles::github(31, "alex", &["alex@gmail.example", "alex@corp.example"]);
    let account = env
        .resolver
        .resolve_oauth_profile("github", &raw, Some(&caller))
        .await
        .unwrap();

    assert_eq!(account.id, "caller");
    assert_eq!(env.account_count().await, 1);
    for email in ["alex@example.com", "alex@gmail.example", "alex@corp.example"] {
        assert!(account.emails.contains(email), "missing {email}");
    }
    assert!(env.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_signed_in_caller_cannot_link_second_identity_of_same_provider() {
    let env = TestEnv::memory();
    let caller = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(1, "first", &["f@example.com"]), None)
        .await
        .unwrap();

    let result = env
        .resolver
        .resolve_oauth_profile(
            "github",
            &Profiles::github(2, "second", &["s@example.com"]),
            Some(&caller),
        )
        .await;

    assert!(matches!(
        result,
        Err(ResolutionError::ProviderIdentityConflict { .. })
    ));
    assert_eq!(env.account_count().await, 1);
}

#[tokio::test]
async fn test_profile_without_email_is_rejected() {
    let env = TestEnv::memory();
    let raw = json!({"id": 12, "login": "ghost", "email": null});

    let result = env.resolver.resolve_oauth_profile("github", &raw, None).await;

    assert!(matches!(result, Err(ResolutionError::ProfileIncomplete(_))));
    assert_eq!(env.account_count().await, 0);
}

#[tokio::test]
async fn test_name_collision_is_disambiguated() {
    let env = TestEnv::memory();
    let mut taken = env.seed_account("taken", "taken@example.com", 1).await;
    taken.name = "Robin".to_string();
    env.save_account(taken).await;

    let account = env
        .resolver
        .resolve_oauth_profile(
            "google",
            &Profiles::google("g-robin", "robin@example.com", "Robin"),
            None,
        )
        .await
        .unwrap();

    assert_ne!(account.name, "Robin");
    assert!(account.name.starts_with("Robin"));
}

#[tokio::test]
async fn test_conflict_flow_on_sqlite_store() {
    let env = TestEnv::sqlite().await;
    env.seed_account("s1", "sql@example.com", 4).await;
    env.seed_account("s2", "sql@example.net", 2).await;

    let raw = Profiles::github(404, "sql", &["sql@example.com", "sql@example.net"]);
    let Err(ResolutionError::MergeConflict(conflict)) =
        env.resolver.resolve_oauth_profile("github", &raw, None).await
    else {
        panic!("Expected a merge conflict");
    };
    assert_eq!(conflict.candidate_ids(), vec!["s1", "s2"]);

    let account = env
        .resolver
        .resolve_merge_conflict("github", &raw, "s1")
        .await
        .unwrap();
    assert_eq!(account.provider_id("github"), Some("404"));
    assert_eq!(env.account_count().await, 1);

    // A later login finds the survivor by provider id alone
    let again = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(404, "sql", &["sql@new.example"]), None)
        .await
        .unwrap();
    assert_eq!(again.id, "s1");
}

#[tokio::test]
async fn test_other_identity_of_same_provider_cannot_take_over_account() {
    let env = TestEnv::memory();
    let owner = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(1, "owner", &["shared@example.com"]), None)
        .await
        .unwrap();

    let result = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(2, "intruder", &["shared@example.com"]), None)
        .await;

    assert!(matches!(
        result,
        Err(ResolutionError::ProviderIdentityConflict { .. })
    ));
    let stored = env.account(&owner.id).await.unwrap();
    assert_eq!(stored.provider_id("github"), Some("1"));
    assert_eq!(env.account_count().await, 1);
}

#[tokio::test]
async fn test_conflict_resolution_keeps_existing_identity_links() {
    let env = TestEnv::memory();
    env.seed_account("plain", "jo@example.com", 5).await;
    let linked = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(10, "jo", &["jo@work.example"]), None)
        .await
        .unwrap();

    let raw = Profiles::github(11, "jo2", &["jo@example.com", "jo@work.example"]);
    let result = env.resolver.resolve_merge_conflict("github", &raw, "plain").await;

    assert!(matches!(
        result,
        Err(ResolutionError::ProviderIdentityConflict { .. })
    ));
    assert_eq!(env.account_count().await, 2);
    assert_eq!(
        env.account(&linked.id).await.unwrap().provider_id("github"),
        Some("10")
    );
    assert!(env.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_signed_in_caller_cannot_absorb_account_with_other_identity() {
    let env = TestEnv::memory();
    let caller = env.seed_account("caller", "kai@example.com", 30).await;
    let other = env
        .resolver
        .resolve_oauth_profile("github", &Profiles::github(70, "kai-old", &["kai@old.example"]), None)
        .await
        .unwrap();

    let raw = Profiles::github(71, "kai", &["kai@example.com", "kai@old.example"]);
    let result = env
        .resolver
        .resolve_oauth_profile("github", &raw, Some(&caller))
        .await;

    assert!(matches!(
        result,
        Err(ResolutionError::ProviderIdentityConflict { .. })
    ));
    assert_eq!(env.account(&other.id).await.unwrap().provider_id("github"), Some("70"));
    assert!(env.account("caller").await.unwrap().providers.is_empty());
    assert_eq!(env.account_count().await, 2);
}
