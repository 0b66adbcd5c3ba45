use bson::doc;
use serde_json::{Value, json};

use crate::fixtures::{seed::Seed, test_app::TestApp};

async fn awarded_tender(app: &TestApp, seed: &Seed) -> (String, String) {
    let deadline = chrono::Utc::now() + chrono::Duration::days(14);
    let tender: Value = app
        .post_as("/api/tender", seed.customer)
        .json(&json!({
            "title": "Design-build sports hall",
            "description": "Turnkey NS 8407 contract",
            "terms": {
                "standard": "ns8407",
                "security_percent": 10,
                "defect_liability_years": 5,
                "design_handover_weeks": 6,
            },
            "deadline": deadline.to_rfc3339(),
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tender_id = tender["id"].as_str().unwrap().to_string();

    app.post_as(&format!("/api/tender/{tender_id}/publish"), seed.customer)
        .send()
        .await
        .unwrap();

    let supplier = &seed.suppliers[0];
    let payload = json!({
        "company_id": supplier.company_id.to_hex(),
        "total_ore": 980_000_000i64,
        "structure": "fixed_price",
    });
    let form = reqwest::multipart::Form::new().text("payload", payload.to_string());
    let bid: Value = app
        .post_as(&format!("/api/tender/{tender_id}/bid"), supplier.user_id)
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bid_id = bid["id"].as_str().unwrap().to_string();

    app.post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": bid_id,
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();

    (tender_id, bid_id)
}

/// Rewinds the stored standstill window so the gate treats it as over.
async fn expire_standstill(app: &TestApp, tender_id: &str) {
    let id = bson::oid::ObjectId::parse_str(tender_id).unwrap();
    let past = bson::DateTime::from_millis(bson::DateTime::now().timestamp_millis() - 1_000);
    app.db
        .collection::<bson::Document>("tenders")
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "standstill_end_date": past } },
        )
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn contract_is_generated_after_standstill_expiry() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("gen").await;
    let (tender_id, bid_id) = awarded_tender(&app, &seed).await;
    expire_standstill(&app, &tender_id).await;

    let resp = app
        .post_as("/api/contract", seed.customer)
        .json(&json!({
            "tender_id": tender_id,
            "bid_id": bid_id,
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let contract: Value = resp.json().await.unwrap();

    assert_eq!(contract["version"], 1);
    assert_eq!(contract["standard"], "NS8407");
    assert_eq!(contract["total_ore"], 980_000_000i64);
    assert!(contract["changes"].as_array().unwrap().is_empty());
    // Signing was requested on the disabled transport, so the contract
    // has moved on from plain draft.
    assert_eq!(contract["status"], "pending_signature");

    // Only one contract per tender.
    let resp = app
        .post_as("/api/contract", seed.customer)
        .json(&json!({
            "tender_id": tender_id,
            "bid_id": bid_id,
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn signing_sets_signed_state_and_records_signer() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("sign").await;
    let (tender_id, bid_id) = awarded_tender(&app, &seed).await;
    expire_standstill(&app, &tender_id).await;

    let contract: Value = app
        .post_as("/api/contract", seed.customer)
        .json(&json!({
            "tender_id": tender_id,
            "bid_id": bid_id,
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let contract_id = contract["id"].as_str().unwrap().to_string();

    let supplier = &seed.suppliers[0];
    let resp = app
        .post_as(&format!("/api/contract/{contract_id}/sign"), supplier.user_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let signed: Value = resp.json().await.unwrap();
    assert_eq!(signed["status"], "signed");
    assert_eq!(signed["signed_by"], supplier.user_id.to_hex());
    assert!(signed["signed_at"].as_str().is_some());

    // Signing twice is rejected.
    let resp = app
        .post_as(&format!("/api/contract/{contract_id}/sign"), supplier.user_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn amendments_append_to_the_change_log_and_bump_version() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("amend").await;
    let (tender_id, bid_id) = awarded_tender(&app, &seed).await;
    expire_standstill(&app, &tender_id).await;

    let contract: Value = app
        .post_as("/api/contract", seed.customer)
        .json(&json!({
            "tender_id": tender_id,
            "bid_id": bid_id,
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let contract_id = contract["id"].as_str().unwrap().to_string();

    let first: Value = app
        .post_as(&format!("/api/contract/{contract_id}/change"), seed.customer)
        .json(&json!({
            "field": "total_ore",
            "old_value": "980000000",
            "new_value": "1010000000",
            "reason": "Extended foundation works per survey report",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["version"], 2);
    assert_eq!(first["status"], "amended");

    let second: Value = app
        .post_as(&format!("/api/contract/{contract_id}/change"), seed.customer)
        .json(&json!({
            "field": "completion_date",
            "old_value": "2026-10-01",
            "new_value": "2026-11-15",
            "reason": "Winter shutdown agreed with the customer",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["version"], 3);

    let changes = second["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["version"], 2);
    assert_eq!(changes[1]["version"], 3);
}
