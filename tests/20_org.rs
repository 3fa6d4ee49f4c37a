mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;
use orgkeep_api::{
    auth::token::to_header_value,
    database::{Status, OWNER_NONE},
};

#[tokio::test]
async fn root_creates_org_once() -> Result<()> {
    let server = TestServer::spawn().await?;
    let root = server.root_client();
    let token = root.token().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/v0/org"))
        .header("X-OrgKeep-ID", &server.root.user)
        .header("Authorization", to_header_value(&token.bearer))
        .json(&json!({ "name": "Acme" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    assert!(location.starts_with("/api/v0/org/"));

    let id = location.trim_start_matches("/api/v0/org/");
    let org = root.org_read(id).await?;
    assert_eq!(org.name, "Acme");
    assert_eq!(org.owner, OWNER_NONE);
    assert_eq!(org.meta.status, Status::Unconfirmed);

    let err = root.org_create("Acme").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));

    Ok(())
}

#[tokio::test]
async fn malformed_org_requests() -> Result<()> {
    let server = TestServer::spawn().await?;
    let root = server.root_client();

    let err = root.org_create("bad'name").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let err = root.org_create("").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let token = root.token().await?;
    let resp = reqwest::Client::new()
        .post(server.url("/api/v0/org"))
        .header("X-OrgKeep-ID", &server.root.user)
        .header("Authorization", to_header_value(&token.bearer))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // unknown update operation
    let org_id = root.org_create("Acme").await?;
    let resp = reqwest::Client::new()
        .put(server.url(&format!("/api/v0/org/{org_id}")))
        .header("X-OrgKeep-ID", &server.root.user)
        .header("Authorization", to_header_value(&token.bearer))
        .json(&json!({ "op": "rename", "name": "Globex" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn only_root_creates_and_updates_orgs() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (org, owner) = server.org_owner("acme").await?;
    let member = server.member(&org, "Member", "m@acme.example.com").await?;

    for user in [&owner, &member] {
        let client = server.client_for(user);
        let err = client.org_create("Globex").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

        let err = client.org_update_status(&org.id, Status::Inactive).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

        let err = client.org_update_owner(&org.id, &member.id).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    Ok(())
}

#[tokio::test]
async fn org_visibility() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (acme, owner) = server.org_owner("acme").await?;
    let member = server.member(&acme, "Member", "m@acme.example.com").await?;
    let (globex, _) = server.org_owner("globex").await?;

    for user in [&owner, &member] {
        let client = server.client_for(user);
        let own = client.org_read(&acme.id).await?;
        assert_eq!(own.id, acme.id);
        assert_eq!(own.owner, owner.id);

        let err = client.org_read(&globex.id).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    let root = server.root_client();
    assert_eq!(root.org_read(&globex.id).await?.name, "globex");
    let err = root.org_read("no-such-org").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    Ok(())
}

#[tokio::test]
async fn new_owner_reads_only_their_org() -> Result<()> {
    let server = TestServer::spawn().await?;
    let root = server.root_client();

    let acme = root.org_create("Acme").await?;
    let globex = root.org_create("Globex").await?;
    root.org_update_status(&acme, Status::Active).await?;

    let user_id = root.user_create("Wile", "wile@acme.example.com", &acme, "beep-beep").await?;

    // unconfirmed users cannot own
    let err = root.org_update_owner(&acme, &user_id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    root.user_update_status(&user_id, Status::Active).await?;
    root.org_update_owner(&acme, &user_id).await?;
    assert_eq!(root.org_read(&acme).await?.owner, user_id);

    let user = server.read_user(&user_id).await?;
    let client = server.client_for(&user);
    assert_eq!(client.whoami().await?.privilege, "org");

    let err = client.org_read(&globex).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

    Ok(())
}

#[tokio::test]
async fn owner_must_belong_to_org() -> Result<()> {
    let server = TestServer::spawn().await?;
    let root = server.root_client();
    let (acme, _) = server.org_owner("acme").await?;
    let (_, outsider) = server.org_owner("globex").await?;

    let err = root.org_update_owner(&acme.id, &outsider.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let err = root.org_update_owner("no-such-org", &outsider.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    Ok(())
}

#[tokio::test]
async fn status_updates_reject_none() -> Result<()> {
    let server = TestServer::spawn().await?;
    let root = server.root_client();
    let id = root.org_create("Acme").await?;

    root.org_update_status(&id, Status::Inactive).await?;
    assert_eq!(root.org_read(&id).await?.meta.status, Status::Inactive);

    let token = root.token().await?;
    let resp = reqwest::Client::new()
        .put(server.url(&format!("/api/v0/org/{id}")))
        .header("X-OrgKeep-ID", &server.root.user)
        .header("Authorization", to_header_value(&token.bearer))
        .json(&json!({ "op": "status", "status": -1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
