//! Site content store operations (posts, users, plugins, options)

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::{Plugin, Post, SiteUser};

impl Database {
    pub fn insert_post(
        &self,
        post_type: &str,
        title: &str,
        content: &str,
        status: &str,
    ) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO posts (post_type, title, content, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![post_type, title, content, status, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_post(&self, id: i64) -> SqliteResult<Option<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, post_type, title, content, status, created_at FROM posts WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id], row_to_post)?;
        rows.next().transpose()
    }

    pub fn list_posts(&self, limit: i64) -> SqliteResult<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, post_type, title, content, status, created_at FROM posts
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], row_to_post)?;
        rows.collect()
    }

    pub fn update_post(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        status: Option<&str>,
    ) -> SqliteResult<usize> {
        let conn = self.conn();
        conn.execute(
            "UPDATE posts SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                status = COALESCE(?4, status)
             WHERE id = ?1",
            params![id, title, content, status],
        )
    }

    pub fn delete_post(&self, id: i64) -> SqliteResult<usize> {
        let conn = self.conn();
        conn.execute("DELETE FROM posts WHERE id = ?1", [id])
    }

    pub fn insert_site_user(&self, login: &str, email: &str, role: &str) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO site_users (login, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![login, email, role, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_site_users(&self) -> SqliteResult<Vec<SiteUser>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, login, email, role, created_at FROM site_users ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(SiteUser {
                id: row.get(0)?,
                login: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    pub fn list_plugins(&self) -> SqliteResult<Vec<Plugin>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, status, version FROM plugins ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Plugin {
                id: row.get(0)?,
                name: row.get(1)?,
                status: row.get(2)?,
                version: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    pub fn upsert_plugin(&self, name: &str, status: &str, version: &str) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO plugins (name, status, version) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET status = ?2, version = ?3",
            params![name, status, version],
        )?;
        Ok(())
    }

    pub fn get_site_option(&self, name: &str) -> SqliteResult<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM site_options WHERE name = ?1")?;
        let mut rows = stmt.query_map([name], |row| row.get::<_, String>(0))?;
        rows.next().transpose()
    }

    pub fn set_site_option(&self, name: &str, value: &str) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO site_options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = ?2",
            [name, value],
        )?;
        Ok(())
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        post_type: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_crud_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        let id = db.insert_post("post", "Hello", "Body", "draft").unwrap();
        let post = db.get_post(id).unwrap().unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.status, "draft");

        db.update_post(id, None, None, Some("publish")).unwrap();
        assert_eq!(db.get_post(id).unwrap().unwrap().status, "publish");
        assert_eq!(db.get_post(id).unwrap().unwrap().title, "Hello");

        db.delete_post(id).unwrap();
        assert!(db.get_post(id).unwrap().is_none());
    }

    #[test]
    fn options_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        assert!(db.get_site_option("blogname").unwrap().is_none());
        db.set_site_option("blogname", "My Site").unwrap();
        db.set_site_option("blogname", "Renamed").unwrap();
        assert_eq!(
            db.get_site_option("blogname").unwrap().as_deref(),
            Some("Renamed")
        );
    }
}
