use box_office::models::UserRole;
use box_office::services::accounts::Registration;
use box_office::store::Store;
use box_office::Error;

mod support;

#[tokio::test]
async fn registered_password_is_stored_as_bcrypt_hash() {
    let app = support::build_app();
    let registration = support::registration();
    let user = app.state.accounts.register(registration.clone()).await.expect("register");

    assert_eq!(user.role, UserRole::User);
    assert_ne!(user.password_hash, support::PASSWORD);
    assert!(user.password_hash.starts_with("$2"));

    let stored = app.store.user_by_email(&registration.email).await.unwrap().expect("stored user");
    assert_eq!(stored.id, user.id);
    assert!(stored.verify_password(support::PASSWORD));
}

#[tokio::test]
async fn authenticate_verifies_the_hash() {
    let app = support::build_app();
    let registration = support::registration();
    app.state.accounts.register(registration.clone()).await.expect("register");
    let accounts = &app.state.accounts;

    let found = accounts.authenticate(&registration.email, support::PASSWORD).await.unwrap();
    assert_eq!(found.map(|u| u.email), Some(registration.email.clone()));

    assert!(accounts.authenticate(&registration.email, "wrong").await.unwrap().is_none());
    assert!(accounts.authenticate("nobody@example.com", support::PASSWORD).await.unwrap().is_none());
    assert!(accounts.authenticate("", "").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = support::build_app();
    let registration = support::registration();
    app.state.accounts.register(registration.clone()).await.expect("register");

    let again = Registration { email: format!("  {}  ", registration.email), ..registration };
    let err = app.state.accounts.register(again).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn empty_fields_are_rejected() {
    let app = support::build_app();
    let mut registration = support::registration();
    registration.name = "   ".to_string();
    assert!(matches!(app.state.accounts.register(registration).await, Err(Error::Validation(_))));

    let mut registration = support::registration();
    registration.password = String::new();
    assert!(matches!(app.state.accounts.register(registration).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn create_admin_assigns_admin_role() {
    let app = support::build_app();
    let admin = app.admin().await;
    assert!(admin.is_admin());
}
