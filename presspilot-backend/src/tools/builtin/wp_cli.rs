//! Free-text site command tool. Common read and mutation commands are
//! emulated against the local content store; anything else runs on the
//! host CLI when one is available, and otherwise turns into a guidance
//! message.

use crate::db::Database;
use crate::site::host::CommandHost;
use crate::site::SiteAdapter;
use crate::tools::allowlist::CommandAllowList;
use crate::tools::format::{classify_command, truncate_output};
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TOOL_NAME: &str = "wp_cli";

static LONG_OPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"--([a-z_]+)=(?:"([^"]*)"|'([^']*)'|(\S+))"#).unwrap()
});
static USER_CREATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^wp\s+user\s+create\s+(\S+)\s+(\S+)").unwrap());
static OPTION_GET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^wp\s+option\s+get\s+(\S+)").unwrap());

/// Pull a `--name="value"` style option out of a command line.
pub fn extract_long_opt(command: &str, name: &str) -> Option<String> {
    for cap in LONG_OPT_RE.captures_iter(command) {
        if &cap[1] == name {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| m.as_str().to_string());
            return value;
        }
    }
    None
}

pub struct WpCliTool {
    definition: ToolDefinition,
    site: Arc<dyn SiteAdapter>,
    host: Option<Arc<dyn CommandHost>>,
    allowlist: CommandAllowList,
    db: Arc<Database>,
}

impl WpCliTool {
    pub fn new(
        site: Arc<dyn SiteAdapter>,
        host: Option<Arc<dyn CommandHost>>,
        allowlist: CommandAllowList,
        db: Arc<Database>,
    ) -> Self {
        let mut schema = ToolInputSchema::default();
        schema.properties.insert(
            "command".to_string(),
            PropertySchema::string(
                "The full site CLI command to run, e.g. \"wp plugin list\"",
            ),
        );
        schema.required.push("command".to_string());

        WpCliTool {
            definition: ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: "Run a site CLI command. Common read and create operations \
                              are served locally; other commands require the host CLI."
                    .to_string(),
                input_schema: schema,
            },
            site,
            host,
            allowlist,
            db,
        }
    }

    /// Pattern-matched emulations for common commands. `None` means no
    /// emulation applied and the command should fall through.
    fn emulate(&self, command: &str) -> Option<ToolResult> {
        let trimmed = command.trim();

        if trimmed.starts_with("wp user list") {
            return Some(match self.site.list_users() {
                Ok(users) => {
                    let mut text = String::from("ID\tLogin\tEmail\tRole");
                    for u in users {
                        text.push_str(&format!("\n{}\t{}\t{}\t{}", u.id, u.login, u.email, u.role));
                    }
                    ToolResult::table(TOOL_NAME, Some("user".to_string()), text)
                }
                Err(e) => ToolResult::failure(TOOL_NAME, e.to_string()),
            });
        }

        if trimmed.starts_with("wp post list") {
            return Some(match self.site.list_posts(25) {
                Ok(posts) => {
                    let mut text = String::from("ID\tTitle\tType\tStatus");
                    for p in posts {
                        text.push_str(&format!(
                            "\n{}\t{}\t{}\t{}",
                            p.id, p.title, p.post_type, p.status
                        ));
                    }
                    ToolResult::table(TOOL_NAME, Some("post".to_string()), text)
                }
                Err(e) => ToolResult::failure(TOOL_NAME, e.to_string()),
            });
        }

        if trimmed.starts_with("wp plugin list") {
            // Only serve this locally when the store actually knows
            // about plugins; otherwise fall through to the host CLI or
            // the guidance path.
            match self.site.list_plugins() {
                Ok(plugins) if !plugins.is_empty() => {
                    let mut text = String::from("Name\tStatus\tVersion\tLast Activity");
                    for p in plugins {
                        let activity = self
                            .db
                            .last_activity_for_tool(&p.name)
                            .unwrap_or(None)
                            .unwrap_or_else(|| "-".to_string());
                        text.push_str(&format!(
                            "\n{}\t{}\t{}\t{}",
                            p.name, p.status, p.version, activity
                        ));
                    }
                    return Some(ToolResult::table(TOOL_NAME, Some("plugin".to_string()), text));
                }
                Ok(_) => return None,
                Err(e) => return Some(ToolResult::failure(TOOL_NAME, e.to_string())),
            }
        }

        if let Some(cap) = OPTION_GET_RE.captures(trimmed) {
            return Some(match self.site.get_option(&cap[1]) {
                Ok(Some(value)) => ToolResult::text(TOOL_NAME, value),
                Ok(None) => ToolResult::failure(TOOL_NAME, format!("option '{}' not found", &cap[1])),
                Err(e) => ToolResult::failure(TOOL_NAME, e.to_string()),
            });
        }

        if trimmed.starts_with("wp post create") || trimmed.starts_with("wp page create") {
            let is_page = trimmed.starts_with("wp page create");
            let mut params = Map::new();
            params.insert(
                "action".to_string(),
                Value::from(if is_page { "create_page" } else { "create_post" }),
            );
            if let Some(title) = extract_long_opt(trimmed, "post_title") {
                params.insert("title".to_string(), Value::from(title));
            }
            if let Some(content) = extract_long_opt(trimmed, "post_content") {
                params.insert("content".to_string(), Value::from(content));
            }
            if let Some(status) = extract_long_opt(trimmed, "post_status") {
                params.insert("status".to_string(), Value::from(status));
            }
            let action = if is_page { "create_page" } else { "create_post" };
            return Some(match self.site.execute_action(action, &params) {
                Ok(value) => ToolResult::structured(TOOL_NAME, value),
                Err(e) => ToolResult::failure(TOOL_NAME, e.to_string()),
            });
        }

        if let Some(cap) = USER_CREATE_RE.captures(trimmed) {
            let mut params = Map::new();
            params.insert("username".to_string(), Value::from(&cap[1]));
            params.insert("email".to_string(), Value::from(&cap[2]));
            if let Some(role) = extract_long_opt(trimmed, "role") {
                params.insert("role".to_string(), Value::from(role));
            }
            return Some(match self.site.execute_action("create_user", &params) {
                Ok(value) => ToolResult::structured(TOOL_NAME, value),
                Err(e) => ToolResult::failure(TOOL_NAME, e.to_string()),
            });
        }

        None
    }

    /// Structured "how to achieve this without the CLI" message, keyed
    /// by the dominant keyword in the command text.
    fn guidance(&self, command: &str) -> ToolResult {
        let text = match classify_command(command).as_deref() {
            Some("plugin") => {
                "The host CLI is not available, so plugin commands cannot run here. \
                 You can manage plugins from the admin dashboard under Plugins, or \
                 ask for plugin activity via the plugin_logs tool."
            }
            Some("user") => {
                "The host CLI is not available. User accounts can be created and \
                 listed through the wp_api tool (actions create_user / get_users)."
            }
            Some("post") => {
                "The host CLI is not available. Posts and pages can be created, \
                 read, and updated through the wp_api tool (actions create_post, \
                 get_posts, update_post)."
            }
            Some("membership") | Some("transaction") | Some("subscription") => {
                "The host CLI is not available. Membership data is served by the \
                 memberpress_info tool (types: summary, members, transactions, \
                 subscriptions, best_selling)."
            }
            _ => {
                "The host CLI is not available on this site, so this command cannot \
                 be executed literally. Read operations are available through the \
                 wp_api and memberpress_info tools."
            }
        };
        ToolResult::text(TOOL_NAME, text)
    }
}

#[async_trait]
impl Tool for WpCliTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: &Map<String, Value>) -> ToolResult {
        let command = match params.get("command").and_then(Value::as_str) {
            Some(c) if !c.trim().is_empty() => c.trim().to_string(),
            _ => return ToolResult::failure(TOOL_NAME, "missing required parameter: command"),
        };

        if let Err(refusal) = self.allowlist.check(&command) {
            return ToolResult::failure(TOOL_NAME, refusal);
        }

        if let Some(result) = self.emulate(&command) {
            return result;
        }

        if let Some(host) = &self.host {
            return match host.run(&command).await {
                Ok(output) => ToolResult::text(TOOL_NAME, truncate_output(&output)),
                Err(e) => ToolResult::failure(TOOL_NAME, e),
            };
        }

        self.guidance(&command)
    }
}
