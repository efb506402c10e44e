//! libSQL backend — async `ProfileStore` implementation.
//!
//! Supports a local database file and an in-memory database for tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Database, Value};
use tracing::info;

use crate::error::StoreError;
use crate::llm::ChatMessage;
use crate::onboarding::{OnboardingStage, ProfileUpdate, UserProfile};
use crate::store::migrations;
use crate::store::traits::ProfileStore;

const PROFILE_COLUMNS: &str = "phone, name, country, age, gender, language, \
     onboarding_stage, message_history, created_at, updated_at";

/// libSQL profile store.
///
/// Holds a single connection reused for all operations; `libsql::Connection`
/// is safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run(&conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

fn query_err(e: libsql::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

/// Append one `column = ?N` clause and its positional value.
fn bind(sets: &mut Vec<String>, values: &mut Vec<Value>, column: &str, value: Value) {
    values.push(value);
    sets.push(format!("{column} = ?{}", values.len()));
}

/// Parse an RFC 3339 timestamp written by this backend.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn row_to_profile(row: &libsql::Row) -> Result<UserProfile, StoreError> {
    let phone: String = row.get(0).map_err(query_err)?;
    let name: Option<String> = row.get(1).map_err(query_err)?;
    let country: Option<String> = row.get(2).map_err(query_err)?;
    let age: Option<i64> = row.get(3).map_err(query_err)?;
    let gender: Option<String> = row.get(4).map_err(query_err)?;
    let language: Option<String> = row.get(5).map_err(query_err)?;
    let stage: String = row.get(6).map_err(query_err)?;
    let history_json: Option<String> = row.get(7).map_err(query_err)?;
    let created_at: String = row.get(8).map_err(query_err)?;
    let updated_at: String = row.get(9).map_err(query_err)?;

    let message_history: Vec<ChatMessage> = match history_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| StoreError::Serialization(format!("Bad message_history for {phone}: {e}")))?,
        None => Vec::new(),
    };

    Ok(UserProfile {
        phone,
        name,
        country,
        age: age.map(|a| a as u32),
        gender,
        language,
        onboarding_stage: OnboardingStage::parse(&stage),
        message_history,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

#[async_trait]
impl ProfileStore for LibSqlStore {
    async fn get(&self, phone: &str) -> Result<Option<UserProfile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE phone = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![phone])
            .await
            .map_err(query_err)?;

        match rows.next().await.map_err(query_err)? {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, phone: &str) -> Result<UserProfile, StoreError> {
        let profile = UserProfile::new(phone);
        self.conn
            .execute(
                "INSERT INTO users (phone, onboarding_stage, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    profile.phone.as_str(),
                    profile.onboarding_stage.to_string(),
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(query_err)?;
        Ok(profile)
    }

    async fn update(&self, phone: &str, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        // One UPDATE per turn; only the fields carried by the update are
        // touched.
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(name) = &update.name {
            bind(&mut sets, &mut values, "name", Value::Text(name.clone()));
        }
        if let Some(country) = &update.country {
            bind(&mut sets, &mut values, "country", Value::Text(country.clone()));
        }
        if let Some(age) = update.age {
            bind(&mut sets, &mut values, "age", Value::Integer(age as i64));
        }
        if let Some(gender) = &update.gender {
            bind(&mut sets, &mut values, "gender", Value::Text(gender.clone()));
        }
        if let Some(language) = &update.language {
            bind(&mut sets, &mut values, "language", Value::Text(language.clone()));
        }
        if let Some(stage) = update.onboarding_stage {
            bind(
                &mut sets,
                &mut values,
                "onboarding_stage",
                Value::Text(stage.to_string()),
            );
        }
        if let Some(history) = &update.message_history {
            let json = serde_json::to_string(history)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            bind(&mut sets, &mut values, "message_history", Value::Text(json));
        }
        bind(
            &mut sets,
            &mut values,
            "updated_at",
            Value::Text(Utc::now().to_rfc3339()),
        );

        let sql = format!(
            "UPDATE users SET {} WHERE phone = ?{}",
            sets.join(", "),
            sets.len() + 1
        );
        values.push(Value::Text(phone.to_string()));

        let affected = self
            .conn
            .execute(&sql, libsql::params_from_iter(values))
            .await
            .map_err(query_err)?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                phone: phone.to_string(),
            });
        }

        self.get(phone).await?.ok_or_else(|| StoreError::NotFound {
            phone: phone.to_string(),
        })
    }
}
