use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_invalid_json() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;

    // wrong data type
    let body = r#"{"agenda":"Kick-off","attendees":"not a list"}"#;
    let (status_code, error) =
        helper::maybe_create_meeting_with_raw_body(&mut app, &access_token, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    let error = error.unwrap();
    assert_eq!("Data error".to_string(), error.error);
    let description = error.description.unwrap_or_default();
    assert!(
        description.starts_with("Failed to deserialize the JSON body into the target type"),
        "{description}"
    );

    // syntax error
    let body = r#"{"}"#;
    let (status_code, error) =
        helper::maybe_create_meeting_with_raw_body(&mut app, &access_token, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    let error = error.unwrap();
    assert_eq!("JSON syntax error".to_string(), error.error);
    assert_eq!(
        Some("EOF while parsing a string at line 1 column 3".to_string()),
        error.description
    );

    // missing content type
    let body = r"{}";
    let (status_code, error) =
        helper::maybe_create_meeting_with_raw_body(&mut app, &access_token, body, false).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Missing `application/json` content type".to_string(),
        error.unwrap().error
    );
}
