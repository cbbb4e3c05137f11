//! Membership commerce backend, consumed by the info aggregator and
//! the site action executor.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::db::Database;
use crate::models::{CommerceCounts, Member, Membership, ProductSales, Subscription, Transaction};

#[derive(Debug)]
pub enum CommerceError {
    Db(rusqlite::Error),
}

impl fmt::Display for CommerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommerceError::Db(e) => write!(f, "commerce store error: {}", e),
        }
    }
}

impl From<rusqlite::Error> for CommerceError {
    fn from(e: rusqlite::Error) -> Self {
        CommerceError::Db(e)
    }
}

/// Result data is heterogeneous on purpose: some backends hand back
/// pre-formatted tabular text, others hand back rows the caller
/// renders itself.
pub enum CommerceData {
    Formatted(String),
    Members(Vec<Member>),
    Memberships(Vec<Membership>),
    Transactions(Vec<Transaction>),
    Subscriptions(Vec<Subscription>),
    BestSelling(Vec<ProductSales>),
}

fn filter_limit(filter: &Map<String, Value>) -> i64 {
    filter
        .get("limit")
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .filter(|n| *n > 0)
        .unwrap_or(25)
}

pub trait CommerceBackend: Send + Sync {
    /// Whether the commerce subsystem is installed at all. When false,
    /// readers are not called and the caller reports an upsell result.
    fn is_available(&self) -> bool;

    fn members(&self, filter: &Map<String, Value>, formatted: bool)
        -> Result<CommerceData, CommerceError>;
    fn memberships(
        &self,
        filter: &Map<String, Value>,
        formatted: bool,
    ) -> Result<CommerceData, CommerceError>;
    fn transactions(
        &self,
        filter: &Map<String, Value>,
        formatted: bool,
    ) -> Result<CommerceData, CommerceError>;
    fn subscriptions(
        &self,
        filter: &Map<String, Value>,
        formatted: bool,
    ) -> Result<CommerceData, CommerceError>;
    fn best_selling(
        &self,
        filter: &Map<String, Value>,
        formatted: bool,
    ) -> Result<CommerceData, CommerceError>;
    fn counts(&self) -> Result<CommerceCounts, CommerceError>;
}

/// Sqlite-backed commerce store. `available` is wired from config so a
/// site without the subsystem reports the expected upsell condition.
pub struct SqliteCommerce {
    db: Arc<Database>,
    available: bool,
}

impl SqliteCommerce {
    pub fn new(db: Arc<Database>, available: bool) -> Self {
        Self { db, available }
    }
}

impl CommerceBackend for SqliteCommerce {
    fn is_available(&self) -> bool {
        self.available
    }

    fn members(
        &self,
        filter: &Map<String, Value>,
        _formatted: bool,
    ) -> Result<CommerceData, CommerceError> {
        Ok(CommerceData::Members(
            self.db.list_members(filter_limit(filter))?,
        ))
    }

    fn memberships(
        &self,
        filter: &Map<String, Value>,
        _formatted: bool,
    ) -> Result<CommerceData, CommerceError> {
        Ok(CommerceData::Memberships(
            self.db.list_memberships(filter_limit(filter))?,
        ))
    }

    fn transactions(
        &self,
        filter: &Map<String, Value>,
        _formatted: bool,
    ) -> Result<CommerceData, CommerceError> {
        Ok(CommerceData::Transactions(
            self.db.list_transactions(filter_limit(filter))?,
        ))
    }

    fn subscriptions(
        &self,
        filter: &Map<String, Value>,
        _formatted: bool,
    ) -> Result<CommerceData, CommerceError> {
        Ok(CommerceData::Subscriptions(
            self.db.list_subscriptions(filter_limit(filter))?,
        ))
    }

    fn best_selling(
        &self,
        filter: &Map<String, Value>,
        _formatted: bool,
    ) -> Result<CommerceData, CommerceError> {
        Ok(CommerceData::BestSelling(
            self.db.best_selling(filter_limit(filter))?,
        ))
    }

    fn counts(&self) -> Result<CommerceCounts, CommerceError> {
        Ok(self.db.commerce_counts()?)
    }
}
