//! Built-in tools registered at startup.

pub mod memberpress_info;
pub mod plugin_logs;
pub mod wp_api;
pub mod wp_cli;

pub use memberpress_info::MemberpressInfoTool;
pub use plugin_logs::PluginLogsTool;
pub use wp_api::WpApiTool;
pub use wp_cli::WpCliTool;

use std::sync::Arc;

use crate::commerce::CommerceBackend;
use crate::config::Config;
use crate::db::Database;
use crate::site::host::CommandHost;
use crate::site::SiteAdapter;
use crate::tools::allowlist::CommandAllowList;
use crate::tools::registry::ToolRegistry;

/// Build the default registry, honoring the per-capability enable
/// flags. Further tools can still be merged in afterwards through
/// `ToolRegistry::register`.
pub fn register_defaults(
    config: &Config,
    db: Arc<Database>,
    site: Arc<dyn SiteAdapter>,
    host: Option<Arc<dyn CommandHost>>,
    commerce: Arc<dyn CommerceBackend>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    if config.tool_wp_cli_enabled {
        let allowlist =
            CommandAllowList::new(config.allowed_commands.clone(), config.enforce_allowlist);
        registry.register(Arc::new(WpCliTool::new(
            site.clone(),
            host,
            allowlist,
            db.clone(),
        )));
    }
    if config.tool_wp_api_enabled {
        registry.register(Arc::new(WpApiTool::new(site)));
    }
    if config.tool_memberpress_info_enabled {
        registry.register(Arc::new(MemberpressInfoTool::new(commerce)));
    }
    if config.tool_plugin_logs_enabled {
        registry.register(Arc::new(PluginLogsTool::new(db, config.log_retention_days)));
    }

    log::info!("registered {} built-in tools", registry.len());
    registry
}
