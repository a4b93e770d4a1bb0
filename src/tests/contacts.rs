use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_contacts_and_leads() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;

    let alice = helper::create_contact(&mut app, &access_token, "  Alice Adams ").await;
    assert_eq!("Alice Adams", alice.name);

    let (status_code, contacts) = helper::list_contacts(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let contacts = contacts.unwrap();
    assert_eq!(1, contacts.len());
    assert_eq!(alice.id, contacts[0].id);

    let (status_code, error) = helper::maybe_create_contact_with_payload(
        &mut app,
        &access_token,
        json!({ "fullName": "   " }),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Full name is required".to_string()), error);

    let acme = helper::create_lead(&mut app, &access_token, "Acme Corp").await;

    let (status_code, leads) = helper::list_leads(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let leads = leads.unwrap();
    assert_eq!(1, leads.len());
    assert_eq!(acme.id, leads[0].id);
    assert_eq!("Acme Corp", leads[0].name);
}
