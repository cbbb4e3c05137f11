//! Membership commerce store operations

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::{CommerceCounts, Member, Membership, ProductSales, Subscription, Transaction};

impl Database {
    pub fn insert_member(&self, username: &str, email: &str) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO members (username, email, joined_at) VALUES (?1, ?2, ?3)",
            params![username, email, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_members(&self, limit: i64) -> SqliteResult<Vec<Member>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, email, joined_at FROM members ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(Member {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                joined_at: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    pub fn insert_membership(&self, title: &str, price: f64) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO memberships (title, price) VALUES (?1, ?2)",
            params![title, price],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_memberships(&self, limit: i64) -> SqliteResult<Vec<Membership>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, title, price FROM memberships ORDER BY id ASC LIMIT ?1")?;
        let rows = stmt.query_map([limit], |row| {
            Ok(Membership {
                id: row.get(0)?,
                title: row.get(1)?,
                price: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    pub fn insert_transaction(
        &self,
        member_email: &str,
        amount: f64,
        status: &str,
        membership: Option<&str>,
    ) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO transactions (member_email, amount, status, membership, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![member_email, amount, status, membership, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_transactions(&self, limit: i64) -> SqliteResult<Vec<Transaction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, member_email, amount, status, created_at FROM transactions
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(Transaction {
                id: row.get(0)?,
                member_email: row.get(1)?,
                amount: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    pub fn insert_subscription(
        &self,
        member_email: &str,
        membership: &str,
        status: &str,
    ) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO subscriptions (member_email, membership, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![member_email, membership, status, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_subscriptions(&self, limit: i64) -> SqliteResult<Vec<Subscription>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, member_email, membership, status, created_at FROM subscriptions
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(Subscription {
                id: row.get(0)?,
                member_email: row.get(1)?,
                membership: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    /// Completed transactions grouped by membership, best sellers first.
    pub fn best_selling(&self, limit: i64) -> SqliteResult<Vec<ProductSales>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT COALESCE(membership, '(unassigned)') AS m, COUNT(*) AS n
             FROM transactions WHERE status = 'complete'
             GROUP BY m ORDER BY n DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(ProductSales {
                membership: row.get(0)?,
                sales: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    pub fn commerce_counts(&self) -> SqliteResult<CommerceCounts> {
        let conn = self.conn();
        let count = |table: &str| -> SqliteResult<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
        };
        Ok(CommerceCounts {
            members: count("members")?,
            memberships: count("memberships")?,
            transactions: count("transactions")?,
            subscriptions: count("subscriptions")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        let counts = db.commerce_counts().unwrap();
        assert_eq!(counts.members, 0);
        assert_eq!(counts.memberships, 0);
        assert_eq!(counts.transactions, 0);
        assert_eq!(counts.subscriptions, 0);
    }

    #[test]
    fn best_selling_ranks_complete_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        db.insert_transaction("a@x.io", 10.0, "complete", Some("Gold")).unwrap();
        db.insert_transaction("b@x.io", 10.0, "complete", Some("Gold")).unwrap();
        db.insert_transaction("c@x.io", 5.0, "complete", Some("Silver")).unwrap();
        db.insert_transaction("d@x.io", 5.0, "refunded", Some("Silver")).unwrap();

        let best = db.best_selling(10).unwrap();
        assert_eq!(best[0].membership, "Gold");
        assert_eq!(best[0].sales, 2);
        assert_eq!(best[1].sales, 1);
    }
}
