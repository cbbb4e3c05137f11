//! Aggregated membership information tool. Backends that hand back
//! pre-formatted text are passed through; row data is rendered into
//! fixed-column tab-separated tables here.

use crate::commerce::{CommerceBackend, CommerceData};
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

pub const TOOL_NAME: &str = "memberpress_info";

/// The information views this tool serves.
#[derive(Debug, Clone, Copy, PartialEq, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InfoType {
    Summary,
    Members,
    Memberships,
    Transactions,
    Subscriptions,
    BestSelling,
    SystemInfo,
    All,
}

pub struct MemberpressInfoTool {
    definition: ToolDefinition,
    commerce: Arc<dyn CommerceBackend>,
}

impl MemberpressInfoTool {
    pub fn new(commerce: Arc<dyn CommerceBackend>) -> Self {
        let mut schema = ToolInputSchema::default();
        let mut type_schema = PropertySchema::string("Which information view to fetch")
            .with_default(Value::from("summary"));
        type_schema.enum_values =
            Some(InfoType::iter().map(|t| t.as_ref().to_string()).collect());
        schema.properties.insert("type".to_string(), type_schema);
        schema.properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of rows per listing (default 25)"),
        );

        MemberpressInfoTool {
            definition: ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: "Fetch membership data: summary counts, member and \
                              transaction listings, best sellers, or system info."
                    .to_string(),
                input_schema: schema,
            },
            commerce,
        }
    }

    fn summary_table(&self) -> Result<String, String> {
        let counts = self.commerce.counts().map_err(|e| e.to_string())?;
        Ok(format!(
            "Metric\tValue\nTotal Members\t{}\nTotal Memberships\t{}\nTotal Transactions\t{}\nTotal Subscriptions\t{}",
            counts.members, counts.memberships, counts.transactions, counts.subscriptions
        ))
    }

    fn listing(&self, kind: InfoType, filter: &Map<String, Value>) -> Result<String, String> {
        let data = match kind {
            InfoType::Members => self.commerce.members(filter, true),
            InfoType::Memberships => self.commerce.memberships(filter, true),
            InfoType::Transactions => self.commerce.transactions(filter, true),
            InfoType::Subscriptions => self.commerce.subscriptions(filter, true),
            _ => self.commerce.best_selling(filter, true),
        }
        .map_err(|e| e.to_string())?;
        Ok(render(data))
    }

    fn system_info(&self) -> String {
        format!(
            "=== System ===\nBackend Version\t{}\nOS\t{} ({})\n\n=== Runtime ===\nTime (UTC)\t{}\nCommerce Subsystem\t{}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH,
            chrono::Utc::now().to_rfc3339(),
            if self.commerce.is_available() { "installed" } else { "not installed" },
        )
    }
}

fn render(data: CommerceData) -> String {
    match data {
        CommerceData::Formatted(text) => text,
        CommerceData::Members(rows) => {
            let mut text = String::from("ID\tUsername\tEmail\tJoined");
            for m in rows {
                text.push_str(&format!("\n{}\t{}\t{}\t{}", m.id, m.username, m.email, m.joined_at));
            }
            text
        }
        CommerceData::Memberships(rows) => {
            let mut text = String::from("ID\tTitle\tPrice");
            for m in rows {
                text.push_str(&format!("\n{}\t{}\t{:.2}", m.id, m.title, m.price));
            }
            text
        }
        CommerceData::Transactions(rows) => {
            let mut text = String::from("ID\tMember\tAmount\tStatus\tDate");
            for t in rows {
                text.push_str(&format!(
                    "\n{}\t{}\t{:.2}\t{}\t{}",
                    t.id, t.member_email, t.amount, t.status, t.created_at
                ));
            }
            text
        }
        CommerceData::Subscriptions(rows) => {
            let mut text = String::from("ID\tMember\tMembership\tStatus\tStarted");
            for s in rows {
                text.push_str(&format!(
                    "\n{}\t{}\t{}\t{}\t{}",
                    s.id, s.member_email, s.membership, s.status, s.created_at
                ));
            }
            text
        }
        CommerceData::BestSelling(rows) => {
            let mut text = String::from("Membership\tSales");
            for p in rows {
                text.push_str(&format!("\n{}\t{}", p.membership, p.sales));
            }
            text
        }
    }
}

#[async_trait]
impl Tool for MemberpressInfoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: &Map<String, Value>) -> ToolResult {
        let raw_kind = params
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("summary");
        let kind = match InfoType::from_str(raw_kind) {
            Ok(k) => k,
            Err(_) => {
                return ToolResult::failure(
                    TOOL_NAME,
                    format!("unknown info type '{}'", raw_kind),
                )
            }
        };

        // An absent commerce subsystem is an expected condition, not a
        // fault; the caller gets a distinguishable unavailable result.
        if !self.commerce.is_available() && kind != InfoType::SystemInfo {
            return ToolResult::structured(
                TOOL_NAME,
                json!({
                    "available": false,
                    "message": "The membership subsystem is not installed on this site. \
                                Install and activate it to enable membership reporting.",
                }),
            );
        }

        let text = match kind {
            InfoType::Summary => self.summary_table(),
            InfoType::SystemInfo => Ok(self.system_info()),
            InfoType::All => {
                let mut sections = vec![self.summary_table()];
                for k in [
                    InfoType::Members,
                    InfoType::Memberships,
                    InfoType::Transactions,
                    InfoType::Subscriptions,
                    InfoType::BestSelling,
                ] {
                    sections.push(
                        self.listing(k, params)
                            .map(|body| format!("=== {} ===\n{}", k.as_ref(), body)),
                    );
                }
                sections.push(Ok(self.system_info()));
                sections
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()
                    .map(|parts| parts.join("\n\n"))
            }
            listing => self.listing(listing, params),
        };

        match text {
            Ok(text) => ToolResult::table(TOOL_NAME, Some(raw_kind.to_string()), text),
            Err(e) => ToolResult::failure(TOOL_NAME, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::{CommerceBackend, CommerceError, SqliteCommerce};
    use crate::db::Database;
    use crate::models::CommerceCounts;
    use crate::tools::types::ToolOutput;
    use tempfile::tempdir;

    /// Backend that formats its own listings, like a remote store whose
    /// API returns finished tables.
    struct PreformattedCommerce;

    impl PreformattedCommerce {
        fn table(&self, formatted: bool, label: &str) -> Result<CommerceData, CommerceError> {
            assert!(formatted, "listing readers are asked for formatted data");
            Ok(CommerceData::Formatted(format!(
                "{} (backend-rendered)",
                label
            )))
        }
    }

    impl CommerceBackend for PreformattedCommerce {
        fn is_available(&self) -> bool {
            true
        }

        fn members(
            &self,
            _filter: &Map<String, Value>,
            formatted: bool,
        ) -> Result<CommerceData, CommerceError> {
            self.table(formatted, "members")
        }

        fn memberships(
            &self,
            _filter: &Map<String, Value>,
            formatted: bool,
        ) -> Result<CommerceData, CommerceError> {
            self.table(formatted, "memberships")
        }

        fn transactions(
            &self,
            _filter: &Map<String, Value>,
            formatted: bool,
        ) -> Result<CommerceData, CommerceError> {
            self.table(formatted, "transactions")
        }

        fn subscriptions(
            &self,
            _filter: &Map<String, Value>,
            formatted: bool,
        ) -> Result<CommerceData, CommerceError> {
            self.table(formatted, "subscriptions")
        }

        fn best_selling(
            &self,
            _filter: &Map<String, Value>,
            formatted: bool,
        ) -> Result<CommerceData, CommerceError> {
            self.table(formatted, "best_selling")
        }

        fn counts(&self) -> Result<CommerceCounts, CommerceError> {
            Ok(CommerceCounts::default())
        }
    }

    fn commerce_tool(available: bool) -> (tempfile::TempDir, Arc<Database>, MemberpressInfoTool) {
        let dir = tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap());
        let tool = MemberpressInfoTool::new(Arc::new(SqliteCommerce::new(db.clone(), available)));
        (dir, db, tool)
    }

    fn type_params(kind: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("type".to_string(), Value::from(kind));
        params
    }

    #[tokio::test]
    async fn empty_summary_has_four_zero_rows() {
        let (_dir, _db, tool) = commerce_tool(true);
        let result = tool.execute(&type_params("summary")).await;
        assert!(result.success);
        let text = match result.output {
            ToolOutput::Table { text, .. } => text,
            other => panic!("expected table, got {:?}", other),
        };
        let zero_rows: Vec<&str> = text
            .lines()
            .skip(1)
            .filter(|l| l.ends_with("\t0"))
            .collect();
        assert_eq!(zero_rows.len(), 4, "summary rows: {}", text);
    }

    #[tokio::test]
    async fn member_listing_renders_rows() {
        let (_dir, db, tool) = commerce_tool(true);
        db.insert_member("bob", "bob@example.com").unwrap();
        let result = tool.execute(&type_params("members")).await;
        match result.output {
            ToolOutput::Table { command_type, text } => {
                assert_eq!(command_type.as_deref(), Some("members"));
                assert!(text.contains("bob@example.com"));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn backend_rendered_listings_pass_through_verbatim() {
        let tool = MemberpressInfoTool::new(Arc::new(PreformattedCommerce));
        let result = tool.execute(&type_params("transactions")).await;
        match result.output {
            ToolOutput::Table { command_type, text } => {
                assert_eq!(command_type.as_deref(), Some("transactions"));
                assert_eq!(text, "transactions (backend-rendered)");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unavailable_subsystem_is_an_upsell_not_an_error() {
        let (_dir, _db, tool) = commerce_tool(false);
        let result = tool.execute(&type_params("summary")).await;
        assert!(result.success);
        match result.output {
            ToolOutput::Structured(value) => {
                assert_eq!(value["available"], Value::Bool(false));
            }
            other => panic!("expected structured result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn system_info_carries_labeled_sections() {
        let (_dir, _db, tool) = commerce_tool(true);
        let result = tool.execute(&type_params("system_info")).await;
        match result.output {
            ToolOutput::Table { text, .. } => {
                assert!(text.contains("=== System ==="));
                assert!(text.contains("Backend Version"));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_type_fails_structurally() {
        let (_dir, _db, tool) = commerce_tool(true);
        let result = tool.execute(&type_params("nonsense")).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("nonsense"));
    }
}
