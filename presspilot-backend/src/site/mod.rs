//! Site adapter: the pass-through action executor behind `wp_api`,
//! plus the optional host CLI used for literal free-text commands.

pub mod host;

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::db::Database;
use crate::models::{Plugin, Post, SiteUser};

#[derive(Debug)]
pub enum SiteError {
    UnknownAction(String),
    MissingField(&'static str),
    NotFound(&'static str),
    Db(rusqlite::Error),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::UnknownAction(a) => write!(f, "unknown action '{}'", a),
            SiteError::MissingField(field) => write!(f, "missing field '{}'", field),
            SiteError::NotFound(what) => write!(f, "{} not found", what),
            SiteError::Db(e) => write!(f, "site store error: {}", e),
        }
    }
}

impl From<rusqlite::Error> for SiteError {
    fn from(e: rusqlite::Error) -> Self {
        SiteError::Db(e)
    }
}

pub trait SiteAdapter: Send + Sync {
    /// Forward a bound action to the content store. Structured results
    /// come back as JSON values; the caller wraps them.
    fn execute_action(&self, action: &str, params: &Map<String, Value>)
        -> Result<Value, SiteError>;

    fn list_users(&self) -> Result<Vec<SiteUser>, SiteError>;
    fn list_posts(&self, limit: i64) -> Result<Vec<Post>, SiteError>;
    fn list_plugins(&self) -> Result<Vec<Plugin>, SiteError>;
    fn get_option(&self, name: &str) -> Result<Option<String>, SiteError>;
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str()).map(str::trim).filter(|s| !s.is_empty())
}

fn param_i64(params: &Map<String, Value>, key: &str) -> Option<i64> {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn param_f64(params: &Map<String, Value>, key: &str) -> Option<f64> {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct SqliteSite {
    db: Arc<Database>,
}

impl SqliteSite {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn create_content(
        &self,
        post_type: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, SiteError> {
        let title = param_str(params, "title").ok_or(SiteError::MissingField("title"))?;
        let content = param_str(params, "content").ok_or(SiteError::MissingField("content"))?;
        let status = param_str(params, "status").unwrap_or("draft");
        let id = self.db.insert_post(post_type, title, content, status)?;
        Ok(json!({
            "id": id,
            "post_type": post_type,
            "title": title,
            "status": status
        }))
    }
}

impl SiteAdapter for SqliteSite {
    fn execute_action(
        &self,
        action: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, SiteError> {
        match action {
            "create_post" => self.create_content("post", params),
            "create_page" => self.create_content("page", params),
            "update_post" => {
                let id = param_i64(params, "id").ok_or(SiteError::MissingField("id"))?;
                let changed = self.db.update_post(
                    id,
                    param_str(params, "title"),
                    param_str(params, "content"),
                    param_str(params, "status"),
                )?;
                if changed == 0 {
                    return Err(SiteError::NotFound("post"));
                }
                Ok(json!({"id": id, "updated": true}))
            }
            "get_post" => {
                let id = param_i64(params, "id").ok_or(SiteError::MissingField("id"))?;
                let post = self.db.get_post(id)?.ok_or(SiteError::NotFound("post"))?;
                Ok(serde_json::to_value(post).unwrap_or(Value::Null))
            }
            "get_posts" => {
                let limit = param_i64(params, "limit").filter(|n| *n > 0).unwrap_or(10);
                let posts = self.db.list_posts(limit)?;
                Ok(serde_json::to_value(posts).unwrap_or(Value::Null))
            }
            "delete_post" => {
                let id = param_i64(params, "id").ok_or(SiteError::MissingField("id"))?;
                if self.db.delete_post(id)? == 0 {
                    return Err(SiteError::NotFound("post"));
                }
                Ok(json!({"id": id, "deleted": true}))
            }
            "create_user" => {
                let login = param_str(params, "username").ok_or(SiteError::MissingField("username"))?;
                let email = param_str(params, "email").ok_or(SiteError::MissingField("email"))?;
                let role = param_str(params, "role").unwrap_or("subscriber");
                let id = self.db.insert_site_user(login, email, role)?;
                Ok(json!({"id": id, "username": login, "role": role}))
            }
            "get_users" => {
                let users = self.db.list_site_users()?;
                Ok(serde_json::to_value(users).unwrap_or(Value::Null))
            }
            "create_membership" => {
                let title = param_str(params, "title")
                    .or_else(|| param_str(params, "name"))
                    .ok_or(SiteError::MissingField("title"))?;
                let price = param_f64(params, "price").unwrap_or(0.0);
                let id = self.db.insert_membership(title, price)?;
                Ok(json!({"id": id, "title": title, "price": price}))
            }
            "get_memberships" => {
                let limit = param_i64(params, "limit").filter(|n| *n > 0).unwrap_or(25);
                let memberships = self.db.list_memberships(limit)?;
                Ok(serde_json::to_value(memberships).unwrap_or(Value::Null))
            }
            other => Err(SiteError::UnknownAction(other.to_string())),
        }
    }

    fn list_users(&self) -> Result<Vec<SiteUser>, SiteError> {
        Ok(self.db.list_site_users()?)
    }

    fn list_posts(&self, limit: i64) -> Result<Vec<Post>, SiteError> {
        Ok(self.db.list_posts(limit)?)
    }

    fn list_plugins(&self) -> Result<Vec<Plugin>, SiteError> {
        Ok(self.db.list_plugins()?)
    }

    fn get_option(&self, name: &str) -> Result<Option<String>, SiteError> {
        Ok(self.db.get_site_option(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> (tempfile::TempDir, SqliteSite) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap());
        (dir, SqliteSite::new(db))
    }

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn create_post_defaults_to_draft() {
        let (_dir, site) = site();
        let out = site
            .execute_action(
                "create_post",
                &params(&[("title", "T".into()), ("content", "C".into())]),
            )
            .unwrap();
        assert_eq!(out["status"], "draft");
        assert_eq!(out["post_type"], "post");
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let (_dir, site) = site();
        let err = site
            .execute_action("create_post", &params(&[("title", "T".into())]))
            .unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn unknown_action_is_an_error() {
        let (_dir, site) = site();
        let err = site.execute_action("drop_tables", &Map::new()).unwrap_err();
        assert!(err.to_string().contains("drop_tables"));
    }

    #[test]
    fn missing_record_is_reported_as_not_found() {
        let (_dir, site) = site();
        let err = site
            .execute_action("get_post", &params(&[("id", Value::from(999))]))
            .unwrap_err();
        assert!(matches!(err, SiteError::NotFound("post")));
        assert_eq!(err.to_string(), "post not found");

        let err = site
            .execute_action("delete_post", &params(&[("id", Value::from(999))]))
            .unwrap_err();
        assert!(matches!(err, SiteError::NotFound("post")));
    }

    #[test]
    fn numeric_ids_accept_string_form() {
        let (_dir, site) = site();
        let created = site
            .execute_action(
                "create_post",
                &params(&[("title", "T".into()), ("content", "C".into())]),
            )
            .unwrap();
        let id = created["id"].as_i64().unwrap();
        let got = site
            .execute_action("get_post", &params(&[("id", Value::from(id.to_string()))]))
            .unwrap();
        assert_eq!(got["title"], "T");
    }
}
