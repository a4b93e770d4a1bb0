use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_users() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;

    let username_one = "someusername";
    let username_two = "someotherusername";
    let password = "somepassword";
    let role = "manager";

    // fetch current user
    let (status_code, current_user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let current_user = current_user.unwrap();
    assert_eq!("admin", current_user.username);
    assert_eq!("Initial Admin", current_user.full_name);

    // fetch users, current user is there
    let (status_code, users) = helper::list_users(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(users.unwrap().iter().any(|user| user.id == current_user.id));

    // create new user
    let (status_code, user_one, _) =
        helper::maybe_create_user(&mut app, &access_token, username_one, role, None).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let user_one = user_one.unwrap();
    assert_eq!("someusername".to_string(), user_one.username);
    assert_eq!("Jane Doe".to_string(), user_one.full_name);
    assert!(user_one.password.is_some()); // new password is generated

    // create new user with same username
    let (status_code, _, error) =
        helper::maybe_create_user(&mut app, &access_token, username_one, role, None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("User already exists".to_string()), error);

    // create new user with blank username
    let (status_code, _, error) =
        helper::maybe_create_user(&mut app, &access_token, "  ", role, None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Username is required".to_string()), error);

    // create new user with password
    let (status_code, user_two, _) = helper::maybe_create_user(
        &mut app,
        &access_token,
        username_two,
        role,
        Some(password),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    let user_two = user_two.unwrap();
    assert_eq!("someotherusername".to_string(), user_two.username);
    assert!(user_two.password.is_none()); // given password is used

    // the manager can log in, but can not manage users
    let (status_code, manager_token, _) =
        helper::login_with_password(&mut app, username_two, password).await;
    assert_eq!(StatusCode::OK, status_code);
    let manager_token = manager_token.unwrap();

    let (status_code, users) = helper::list_users(&mut app, &manager_token).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert!(users.is_none());

    let (status_code, _, error) =
        helper::maybe_create_user(&mut app, &manager_token, "third", role, None).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert_eq!(Some("Not allowed to access".to_string()), error);

    let (status_code, me) = helper::current_user(&mut app, &manager_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(user_two.id, me.unwrap().id);
}
