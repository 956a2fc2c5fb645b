//! Auth Service Tests
//!
//! Registration, verification, login, and the forgot/reset password flow.

use userland::application::services::AuthService;
use userland::domain::{AccessTokenRecord, SessionStore, UserRepository, VerificationTokenStore};
use userland::shared::error::AppError;
use userland::shared::security::check_password;

use crate::common::{register_and_verify, TestHarness};

const FULLNAME: &str = "Ada Lovelace";
const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "Aa1aaaaa";

#[tokio::test]
async fn register_creates_inactive_user_with_history_and_mail() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();

    let user = harness
        .users
        .get_user_by_email(EMAIL)
        .await
        .unwrap()
        .expect("user row should exist");
    assert!(!user.is_active);
    assert!(check_password(PASSWORD, &user.password_hash).unwrap());

    // Exactly one history row right after registration.
    assert_eq!(harness.history.count_for(&user.id), 1);

    // The verification mail carries the stored token.
    let token = harness
        .verification
        .get_email_verification_token(&user.id)
        .await
        .unwrap()
        .expect("verification token should be stored");
    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, EMAIL);
    assert!(sent[0].html.contains(&token));
    assert!(sent[0].html.contains(&user.id));
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();
    let err = auth.register("Someone Else", EMAIL, PASSWORD).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn register_fails_when_mail_fails_but_user_row_remains() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    harness.mailer.fail_next_sends(true);
    let err = auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    // The user row survives; the resend endpoint is the recovery path.
    let user = harness.users.get_user_by_email(EMAIL).await.unwrap();
    assert!(user.is_some());

    harness.mailer.fail_next_sends(false);
    auth.send_email_verification(EMAIL).await.unwrap();
    assert_eq!(harness.mailer.sent().len(), 1);
}

#[tokio::test]
async fn resend_verification_rejects_active_and_unknown_users() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    let err = auth.send_email_verification(EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let err = auth.send_email_verification(EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn verify_email_is_one_shot() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();
    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();
    let token = harness
        .verification
        .get_email_verification_token(&user.id)
        .await
        .unwrap()
        .unwrap();

    auth.verify_email(&user.id, &token).await.unwrap();
    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();
    assert!(user.is_active);

    // Second redemption finds no token.
    let err = auth.verify_email(&user.id, &token).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn verify_email_rejects_wrong_token() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();
    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();

    let err = auth
        .verify_email(&user.id, "deadbeefdeadbeefdeadbeefdeadbeef")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();
    assert!(!user.is_active);
}

#[tokio::test]
async fn login_requires_known_active_user_and_right_password() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    let err = auth.login(EMAIL, PASSWORD, "web", "1.2.3.4").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();
    let err = auth.login(EMAIL, PASSWORD, "web", "1.2.3.4").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();
    let token = harness
        .verification
        .get_email_verification_token(&user.id)
        .await
        .unwrap()
        .unwrap();
    auth.verify_email(&user.id, &token).await.unwrap();

    let err = auth
        .login(EMAIL, "Aa1aaaab", "web", "1.2.3.4")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn login_opens_a_session_and_emits_the_audit_log() {
    let harness = TestHarness::new();
    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let auth = harness.auth_service();

    let access_token = auth.login(EMAIL, PASSWORD, "web", "1.2.3.4").await.unwrap();

    // The KV presence record matches the minted JTI.
    let present = harness
        .sessions
        .check_access_token(&AccessTokenRecord {
            jti: access_token.jti.clone(),
            user_id: access_token.user_id.clone(),
            session_id: access_token.session_id.clone(),
        })
        .await
        .unwrap();
    assert!(present);

    // Session hash and index entry exist.
    let session = harness
        .sessions
        .get_session(&access_token.user_id, &access_token.session_id)
        .await
        .unwrap()
        .expect("session hash should exist");
    assert_eq!(session.client_id, "web");
    assert_eq!(session.ip_address, "1.2.3.4");
    assert!(harness
        .sessions
        .index_contains(&access_token.user_id, &access_token.session_id));

    // Exactly one login event on the bus.
    let logins = harness.producer.logins();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].remote_ip, "1.2.3.4");
}

#[tokio::test]
async fn concurrent_logins_get_independent_sessions() {
    let harness = TestHarness::new();
    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let auth = harness.auth_service();

    let a = auth.login(EMAIL, PASSWORD, "client-a", "1.1.1.1").await.unwrap();
    let b = auth.login(EMAIL, PASSWORD, "client-b", "2.2.2.2").await.unwrap();

    assert_ne!(a.session_id, b.session_id);
    assert_eq!(harness.sessions.get_all_sessions(&a.user_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn login_fails_when_the_bus_is_down() {
    let harness = TestHarness::new();
    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let auth = harness.auth_service();

    harness.producer.fail_next_emits(true);
    let err = auth.login(EMAIL, PASSWORD, "web", "1.2.3.4").await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn forgot_password_requires_an_active_account() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    let err = auth.forgot_password(EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    auth.register(FULLNAME, EMAIL, PASSWORD).await.unwrap();
    let err = auth.forgot_password(EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn forgot_then_reset_rotates_the_password() {
    let harness = TestHarness::new();
    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let auth = harness.auth_service();

    auth.forgot_password(EMAIL).await.unwrap();

    let tokens = harness.verification.forgot_password_tokens();
    assert_eq!(tokens.len(), 1);
    let token = &tokens[0];

    // The reset mail carries the token itself.
    let sent = harness.mailer.sent();
    assert!(sent.last().unwrap().html.contains(token));

    auth.reset_password(token, "Bb2bbbbb").await.unwrap();

    let user = harness.users.get_user_by_email(EMAIL).await.unwrap().unwrap();
    assert!(check_password("Bb2bbbbb", &user.password_hash).unwrap());
    assert_eq!(harness.history.count_for(&user.id), 2);

    // The token is one-shot.
    let err = auth.reset_password(token, "Cc3ccccc").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn reset_rejects_reuse_of_the_last_three_passwords() {
    let harness = TestHarness::new();
    register_and_verify(&harness, FULLNAME, EMAIL, PASSWORD).await;
    let auth = harness.auth_service();

    auth.forgot_password(EMAIL).await.unwrap();
    let token = harness.verification.forgot_password_tokens()[0].clone();

    let err = auth.reset_password(&token, PASSWORD).await.unwrap_err();
    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(
                msg,
                "new password can't be the same as one of the last 3 passwords"
            );
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }

    // The failed attempt consumed nothing: the token still works.
    auth.reset_password(&token, "Bb2bbbbb").await.unwrap();
}

#[tokio::test]
async fn reset_with_unknown_token_is_unauthorized() {
    let harness = TestHarness::new();
    let auth = harness.auth_service();

    let err = auth
        .reset_password("deadbeefdeadbeefdeadbeefdeadbeef", "Bb2bbbbb")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}
