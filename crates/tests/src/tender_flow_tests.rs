use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

fn tender_body(title: &str) -> Value {
    let deadline = chrono::Utc::now() + chrono::Duration::days(21);
    json!({
        "title": title,
        "description": "Excavation, foundations and outdoor works",
        "terms": {
            "standard": "ns8406",
            "security_percent": 10,
            "defect_liability_years": 5,
        },
        "deadline": deadline.to_rfc3339(),
        "budget_ore": 450_000_000i64,
    })
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn tender_is_created_as_draft_and_published_to_open() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("pub").await;

    let resp = app
        .post_as("/api/tender", seed.customer)
        .json(&tender_body("Groundworks, lot 1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let tender: Value = resp.json().await.unwrap();
    assert_eq!(tender["status"], "draft");
    let tender_id = tender["id"].as_str().unwrap().to_string();

    let resp = app
        .post_as(&format!("/api/tender/{tender_id}/publish"), seed.customer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let tender: Value = resp.json().await.unwrap();
    assert_eq!(tender["status"], "open");
    assert!(tender["publish_date"].as_str().is_some());
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn inviting_the_same_supplier_twice_keeps_one_invitation() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("inv").await;
    let supplier = &seed.suppliers[0];

    let resp = app
        .post_as("/api/tender", seed.customer)
        .json(&tender_body("Roof works"))
        .send()
        .await
        .unwrap();
    let tender: Value = resp.json().await.unwrap();
    let tender_id = tender["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let resp = app
            .post_as(&format!("/api/tender/{tender_id}/invitation"), seed.customer)
            .json(&json!({
                "user_id": supplier.user_id.to_hex(),
                "email": supplier.email,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let tender: Value = app
        .get_as(&format!("/api/tender/{tender_id}"), seed.customer)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tender["invitations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn questions_are_rejected_on_draft_tenders() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("qdraft").await;
    let supplier = &seed.suppliers[0];

    let resp = app
        .post_as("/api/tender", seed.customer)
        .json(&tender_body("Facade works"))
        .send()
        .await
        .unwrap();
    let tender: Value = resp.json().await.unwrap();
    let tender_id = tender["id"].as_str().unwrap().to_string();

    let resp = app
        .post_as(&format!("/api/tender/{tender_id}/question"), supplier.user_id)
        .json(&json!({ "text": "Is winter heating included in the scope?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn answering_a_question_records_answerer_and_notifies_asker() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("qa").await;
    let supplier = &seed.suppliers[0];

    let resp = app
        .post_as("/api/tender", seed.customer)
        .json(&tender_body("Interior works"))
        .send()
        .await
        .unwrap();
    let tender: Value = resp.json().await.unwrap();
    let tender_id = tender["id"].as_str().unwrap().to_string();

    app.post_as(&format!("/api/tender/{tender_id}/publish"), seed.customer)
        .send()
        .await
        .unwrap();

    let question: Value = app
        .post_as(&format!("/api/tender/{tender_id}/question"), supplier.user_id)
        .json(&json!({ "text": "Which floors are in scope?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question_id = question["id"].as_str().unwrap().to_string();

    let answered: Value = app
        .post_as(
            &format!("/api/tender/{tender_id}/question/{question_id}/answer"),
            seed.customer,
        )
        .json(&json!({ "answer": "Floors 2 through 5." }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answered["answer"], "Floors 2 through 5.");
    assert!(answered["answered_at"].as_str().is_some());

    // The asker got an in-app notification.
    let notifications: Value = app
        .get_as("/api/notification", supplier.user_id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(notifications["total"].as_u64().unwrap() >= 1);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn close_is_idempotent_and_reopen_restores_open() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("close").await;

    let resp = app
        .post_as("/api/tender", seed.customer)
        .json(&tender_body("Demolition"))
        .send()
        .await
        .unwrap();
    let tender: Value = resp.json().await.unwrap();
    let tender_id = tender["id"].as_str().unwrap().to_string();

    app.post_as(&format!("/api/tender/{tender_id}/publish"), seed.customer)
        .send()
        .await
        .unwrap();

    for _ in 0..2 {
        let resp = app
            .post_as(&format!("/api/tender/{tender_id}/close"), seed.customer)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let tender: Value = resp.json().await.unwrap();
        assert_eq!(tender["status"], "closed");
    }

    let resp = app
        .post_as(&format!("/api/tender/{tender_id}/reopen"), seed.customer)
        .send()
        .await
        .unwrap();
    let tender: Value = resp.json().await.unwrap();
    assert_eq!(tender["status"], "open");
}
