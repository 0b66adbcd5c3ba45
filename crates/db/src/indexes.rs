use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Tenders
    create_indexes(
        db,
        "tenders",
        vec![
            index(bson::doc! { "creator_id": 1, "created_at": -1 }),
            index(bson::doc! { "status": 1, "deadline": 1 }),
            index(bson::doc! { "invitations.user_id": 1 }),
        ],
    )
    .await?;

    // Contracts
    create_indexes(
        db,
        "contracts",
        vec![
            index_unique(bson::doc! { "tender_id": 1 }),
            index(bson::doc! { "supplier.company_id": 1 }),
        ],
    )
    .await?;

    // Users
    create_indexes(
        db,
        "users",
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // Companies
    create_indexes(
        db,
        "companies",
        vec![index(bson::doc! { "org_number": 1 })],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "user_id": 1, "is_read": 1 }),
        ],
    )
    .await?;

    info!("MongoDB indexes ensured");
    Ok(())
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<bson::Document>(collection);
    coll.create_indexes(indexes).await?;
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}
