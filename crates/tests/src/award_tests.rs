use bson::oid::ObjectId;
use serde_json::{Value, json};

use crate::fixtures::{seed::Seed, test_app::TestApp};

async fn open_tender_with_three_bids(app: &TestApp, seed: &Seed) -> (String, Vec<String>) {
    let deadline = chrono::Utc::now() + chrono::Duration::days(14);
    let tender: Value = app
        .post_as("/api/tender", seed.customer)
        .json(&json!({
            "title": "School extension, main contract",
            "description": "Full NS 8405 execution contract",
            "terms": {
                "standard": "ns8405",
                "security_percent": 10,
                "defect_liability_years": 5,
                "daily_penalty_permille": 1,
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

    // priceA < priceB < priceC
    let totals = [420_000_000i64, 455_000_000, 510_000_000];
    let mut bid_ids = Vec::new();
    for (supplier, total) in seed.suppliers.iter().zip(totals) {
        let payload = json!({
            "company_id": supplier.company_id.to_hex(),
            "total_ore": total,
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
        bid_ids.push(bid["id"].as_str().unwrap().to_string());
    }

    (tender_id, bid_ids)
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn awarding_the_cheapest_bid_rejects_the_others() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("award").await;
    let (tender_id, bid_ids) = open_tender_with_three_bids(&app, &seed).await;

    let resp = app
        .post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": bid_ids[0],
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let tender: Value = resp.json().await.unwrap();

    assert_eq!(tender["status"], "awarded");
    assert_eq!(tender["awarded_bid_id"], bid_ids[0].as_str());
    let bids = tender["bids"].as_array().unwrap();
    assert_eq!(bids[0]["status"], "awarded");
    assert_eq!(bids[1]["status"], "rejected");
    assert_eq!(bids[2]["status"], "rejected");

    // 10-day standstill window from the award instant, end of day.
    let end = chrono::DateTime::parse_from_rfc3339(
        tender["standstill_end_date"].as_str().unwrap(),
    )
    .unwrap()
    .with_timezone(&chrono::Utc);
    let expected_date = (chrono::Utc::now() + chrono::Duration::days(10)).date_naive();
    assert_eq!(end.date_naive(), expected_date);

    // The winner got an in-app award notification.
    let notifications: Value = app
        .get_as("/api/notification", seed.suppliers[0].user_id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let kinds: Vec<&str> = notifications["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"tender_awarded"));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn second_award_attempt_conflicts() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("award2").await;
    let (tender_id, bid_ids) = open_tender_with_three_bids(&app, &seed).await;

    let first = app
        .post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": bid_ids[0],
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = app
        .post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": bid_ids[1],
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn awarding_an_unknown_bid_is_404() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("award404").await;
    let (tender_id, _) = open_tender_with_three_bids(&app, &seed).await;

    let resp = app
        .post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": ObjectId::new().to_hex(),
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn contract_generation_is_blocked_during_standstill() {
    let app = TestApp::spawn().await;
    let seed = app.seed_procurement("standstill").await;
    let (tender_id, bid_ids) = open_tender_with_three_bids(&app, &seed).await;

    app.post_as(&format!("/api/tender/{tender_id}/award"), seed.customer)
        .json(&json!({
            "bid_id": bid_ids[0],
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();

    // Still inside the 10-day window.
    let resp = app
        .post_as("/api/contract", seed.customer)
        .json(&json!({
            "tender_id": tender_id,
            "bid_id": bid_ids[0],
            "project_id": seed.project.to_hex(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}
