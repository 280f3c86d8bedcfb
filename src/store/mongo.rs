use super::{DUPLICATE_KEY_CODE, ListQuery, RecordStore, StoreError, UserPage};
use crate::config::StoreConfig;
use crate::models::{Category, HealthCheckEvent, HealthStatus, NewUser, StoredUser};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// User as laid out in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl From<&NewUser> for UserDocument {
    fn from(user: &NewUser) -> Self {
        Self {
            id: None,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            category: user.category,
            created_at: to_bson_datetime(user.created_at),
        }
    }
}

impl UserDocument {
    fn into_stored(self, id: ObjectId) -> StoredUser {
        StoredUser {
            id: id.to_hex(),
            name: self.name,
            email: self.email,
            age: self.age,
            category: self.category,
            created_at: from_bson_datetime(self.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HealthCheckDocument {
    timestamp: bson::DateTime,
    status: HealthStatus,
}

impl From<HealthCheckEvent> for HealthCheckDocument {
    fn from(event: HealthCheckEvent) -> Self {
        Self {
            timestamp: to_bson_datetime(event.timestamp),
            status: event.status,
        }
    }
}

impl From<HealthCheckDocument> for HealthCheckEvent {
    fn from(document: HealthCheckDocument) -> Self {
        Self {
            timestamp: from_bson_datetime(document.timestamp),
            status: document.status,
        }
    }
}

// BSON dates carry millisecond precision.
fn to_bson_datetime(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson_datetime(at: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

fn search_filter(query: &ListQuery) -> Document {
    match query.search.as_deref() {
        Some(term) => doc! { "$text": { "$search": term } },
        None => doc! {},
    }
}

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        match err.kind.as_ref() {
            // `email` carries the only unique index besides `_id`.
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                StoreError::duplicate_email()
            }
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Connectivity(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// # MongoDB Record Store
///
/// Users live in one collection with a unique index on `email` and a text
/// index over `name` + `email`; probe events live in a second collection.
///
/// Server selection and connect timeouts both come from
/// [`StoreConfig::timeout`], so an unreachable server fails operations with
/// [`StoreError::Connectivity`] instead of hanging.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
    users: Collection<UserDocument>,
    health_checks: Collection<HealthCheckDocument>,
}

impl MongoStore {
    /// Connects, verifies the server answers a ping, and ensures indexes.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(config.timeout);
        options.connect_timeout = Some(config.timeout);

        let client = Client::with_options(options)?;
        let store = Self::with_client(client, config);

        store.ping().await?;
        store.ensure_indexes().await?;
        info!(database = %config.database, "connected to MongoDB");

        Ok(store)
    }

    pub fn with_client(client: Client, config: &StoreConfig) -> Self {
        let db = client.database(&config.database);
        Self {
            users: db.collection(&config.users_collection),
            health_checks: db.collection(&config.health_collection),
            database: config.database.clone(),
            client,
        }
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        let text_search = IndexModel::builder()
            .keys(doc! { "name": "text", "email": "text" })
            .options(
                IndexOptions::builder()
                    .name("name_email_text".to_string())
                    .build(),
            )
            .build();

        self.users.create_index(unique_email).await?;
        self.users.create_index(text_search).await?;
        debug!("user indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError> {
        let document = UserDocument::from(&user);
        let result = self.users.insert_one(&document).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Backend(format!(
                "unexpected inserted id type: {}",
                result.inserted_id
            ))
        })?;

        Ok(document.into_stored(id))
    }

    async fn list(&self, query: &ListQuery) -> Result<UserPage, StoreError> {
        let filter = search_filter(query);
        let total = self.users.count_documents(filter.clone()).await?;

        let cursor = self
            .users
            .find(filter)
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(query.pagination.skip())
            .limit(query.pagination.limit() as i64)
            .await?;
        let documents: Vec<UserDocument> = cursor.try_collect().await?;

        let items = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id?;
                Some(document.into_stored(id))
            })
            .collect();

        Ok(UserPage { items, total })
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.users.count_documents(doc! {}).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn record_health_check(&self, event: HealthCheckEvent) -> Result<(), StoreError> {
        self.health_checks
            .insert_one(HealthCheckDocument::from(event))
            .await?;
        Ok(())
    }

    async fn latest_health_check(&self) -> Result<Option<HealthCheckEvent>, StoreError> {
        let latest = self
            .health_checks
            .find_one(doc! {})
            .sort(doc! { "timestamp": -1 })
            .await?;
        Ok(latest.map(HealthCheckEvent::from))
    }

    async fn count_health_checks(&self) -> Result<u64, StoreError> {
        Ok(self.health_checks.count_documents(doc! {}).await?)
    }
}
