//! In-process backend for local demos and tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::{AuthSession, AuthUser, Backend, BackendError, Credentials, Query, Table};

/// Keeps tables and accounts in memory.
///
/// Rows get sequential ids and `created_at` stamps that strictly increase,
/// so "newest first" is well defined even for rows inserted back to back.
/// Accounts are confirmed on sign-up.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Value>>,
    next_id: i64,
    last_stamp: Option<DateTime<Utc>>,
    users: HashMap<String, StoredUser>,
    sessions: HashMap<String, String>,
    next_token: u64,
}

struct StoredUser {
    password: String,
    user: AuthUser,
}

impl MemoryState {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in a table
    pub fn row_count(&self, table: Table) -> usize {
        self.state
            .read()
            .tables
            .get(&table)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn timestamp(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// Order two column values: missing/null first, then numbers or text
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => super::query::value_text(x).cmp(&super::query::value_text(y)),
    }
}

/// Keep only the selected columns of a row
fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }

    let mut out = serde_json::Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(value) = row.get(column) {
            out.insert(column.to_string(), value.clone());
        }
    }
    Value::Object(out)
}

fn not_an_object() -> BackendError {
    BackendError::Api {
        status: 400,
        message: "row must be a JSON object".to_string(),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, BackendError> {
        let state = self.state.read();
        let mut rows: Vec<&Value> = state
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn insert(
        &self,
        table: Table,
        row: Value,
        _token: Option<&str>,
    ) -> Result<(), BackendError> {
        let Value::Object(mut fields) = row else {
            return Err(not_an_object());
        };

        let mut state = self.state.write();
        state.next_id += 1;
        let id = state.next_id;
        let created = state.stamp();

        fields.entry("id").or_insert_with(|| Value::from(id));
        fields
            .entry("created_at")
            .or_insert_with(|| timestamp(created));

        state
            .tables
            .entry(table)
            .or_default()
            .push(Value::Object(fields));
        Ok(())
    }

    async fn update(
        &self,
        table: Table,
        id: i64,
        row: Value,
        _token: Option<&str>,
    ) -> Result<(), BackendError> {
        let Value::Object(changes) = row else {
            return Err(not_an_object());
        };

        let mut state = self.state.write();
        let target = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)));

        // No matching row is not an error, mirroring the REST API
        if let Some(Value::Object(existing)) = target {
            for (key, value) in changes {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: i64, _token: Option<&str>) -> Result<(), BackendError> {
        let mut state = self.state.write();
        if let Some(rows) = state.tables.get_mut(&table) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        Ok(())
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, BackendError> {
        let email = credentials.email.trim().to_lowercase();
        let mut state = self.state.write();

        if state.users.contains_key(&email) {
            return Err(BackendError::Api {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let confirmed = state.stamp();
        let user = AuthUser {
            id: format!("user-{}", state.users.len() + 1),
            email: Some(email.clone()),
            email_confirmed_at: Some(confirmed),
        };
        state.users.insert(
            email,
            StoredUser {
                password: credentials.password.clone(),
                user: user.clone(),
            },
        );
        Ok(user)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError> {
        let email = credentials.email.trim().to_lowercase();
        let mut state = self.state.write();

        let user = match state.users.get(&email) {
            Some(stored) if stored.password == credentials.password => stored.user.clone(),
            _ => {
                return Err(BackendError::Api {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                })
            }
        };

        state.next_token += 1;
        let access_token = format!("memory-token-{}", state.next_token);
        state.sessions.insert(access_token.clone(), email);
        Ok(AuthSession { access_token, user })
    }

    async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        self.state.write().sessions.remove(token);
        Ok(())
    }

    async fn user(&self, token: &str) -> Result<AuthUser, BackendError> {
        let state = self.state.read();
        state
            .sessions
            .get(token)
            .and_then(|email| state.users.get(email))
            .map(|stored| stored.user.clone())
            .ok_or_else(|| BackendError::Unauthorized("invalid JWT".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        for (title, category) in [
            ("Bitcoin halving", "Bitcoin"),
            ("Ether staking", "Ethereum"),
            ("Lightning fees", "Bitcoin"),
            ("Layer 2 roundup", "Ethereum"),
        ] {
            backend
                .insert(
                    Table::Posts,
                    json!({"title": title, "category": category}),
                    None,
                )
                .await
                .unwrap();
        }
        backend
    }

    fn titles(rows: &[Value]) -> Vec<&str> {
        rows.iter()
            .filter_map(|r| r.get("title").and_then(Value::as_str))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let backend = seeded().await;
        let rows = backend.select(Table::Posts, &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(row_id(&rows[0]), Some(1));
        assert!(rows[0].get("created_at").is_some());
    }

    #[tokio::test]
    async fn test_newest_first_with_filters_and_limit() {
        let backend = seeded().await;
        let query = Query::new()
            .eq("category", "Bitcoin")
            .neq("id", 1)
            .newest_first()
            .limit(3);
        let rows = backend.select(Table::Posts, &query).await.unwrap();
        assert_eq!(titles(&rows), vec!["Lightning fees"]);

        let all = backend
            .select(Table::Posts, &Query::new().newest_first().limit(2))
            .await
            .unwrap();
        assert_eq!(titles(&all), vec!["Layer 2 roundup", "Lightning fees"]);
    }

    #[tokio::test]
    async fn test_column_projection() {
        let backend = seeded().await;
        let rows = backend
            .select(Table::Posts, &Query::new().columns("id, title"))
            .await
            .unwrap();
        let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "title"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let backend = seeded().await;
        backend
            .update(Table::Posts, 2, json!({"title": "Ether staking 2.0"}), None)
            .await
            .unwrap();
        backend.delete(Table::Posts, 1, None).await.unwrap();

        let rows = backend
            .select(Table::Posts, &Query::new().eq("id", 2))
            .await
            .unwrap();
        assert_eq!(titles(&rows), vec!["Ether staking 2.0"]);
        assert_eq!(backend.row_count(Table::Posts), 3);
    }

    #[tokio::test]
    async fn test_auth_round_trip() {
        let backend = MemoryBackend::new();
        let creds = Credentials {
            email: "Admin@MernCryptoBlog.com".to_string(),
            password: "Admin123!".to_string(),
        };

        backend.sign_up(&creds).await.unwrap();
        let dup = backend.sign_up(&creds).await.unwrap_err();
        assert_eq!(dup.to_string(), "User already registered");

        let session = backend.sign_in(&creds).await.unwrap();
        let user = backend.user(&session.access_token).await.unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@merncryptoblog.com"));

        backend.sign_out(&session.access_token).await.unwrap();
        assert!(backend.user(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let backend = MemoryBackend::new();
        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "right".to_string(),
        };
        backend.sign_up(&creds).await.unwrap();

        let wrong = Credentials {
            password: "wrong".to_string(),
            ..creds
        };
        let err = backend.sign_in(&wrong).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
