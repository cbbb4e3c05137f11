use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const ADMIN_TOKEN: &str = "PP_ADMIN_TOKEN";
    pub const VALIDATOR_URL: &str = "PP_VALIDATOR_URL";
    pub const SITE_CLI_ENABLED: &str = "PP_SITE_CLI_ENABLED";
    // Per-capability enable flags
    pub const TOOL_WP_CLI: &str = "PP_TOOL_WP_CLI";
    pub const TOOL_WP_API: &str = "PP_TOOL_WP_API";
    pub const TOOL_MEMBERPRESS_INFO: &str = "PP_TOOL_MEMBERPRESS_INFO";
    pub const TOOL_PLUGIN_LOGS: &str = "PP_TOOL_PLUGIN_LOGS";
    // Free-text command allow-list
    pub const ALLOWED_COMMANDS: &str = "PP_ALLOWED_COMMANDS";
    pub const ENFORCE_ALLOWLIST: &str = "PP_ENFORCE_ALLOWLIST";
    // Commerce subsystem
    pub const COMMERCE_ENABLED: &str = "PP_COMMERCE_ENABLED";
    // Execution log retention window shown by default (days)
    pub const LOG_RETENTION_DAYS: &str = "PP_LOG_RETENTION_DAYS";
}

/// Settings-table keys for values adjustable through the admin API.
/// Stored values override the environment at startup.
pub mod settings {
    pub const ALLOWED_COMMANDS: &str = "tools.allowed_commands";
    pub const ENFORCE_ALLOWLIST: &str = "tools.enforce_allowlist";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8090;
    pub const DATABASE_URL: &str = "./.db/presspilot.db";
    pub const ALLOWED_COMMANDS: &str = "wp post list,wp user list,wp plugin list,wp option get";
    pub const LOG_RETENTION_DAYS: i64 = 30;
}

fn env_bool(var: &str, default: bool) -> bool {
    env::var(var)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Bearer token for the admin API. Generated at startup when unset.
    pub admin_token: String,
    /// Optional external validation collaborator endpoint.
    pub validator_url: Option<String>,
    /// Whether the literal site CLI may be invoked for free-text commands.
    pub site_cli_enabled: bool,
    pub tool_wp_cli_enabled: bool,
    pub tool_wp_api_enabled: bool,
    pub tool_memberpress_info_enabled: bool,
    pub tool_plugin_logs_enabled: bool,
    pub allowed_commands: Vec<String>,
    pub enforce_allowlist: bool,
    pub commerce_enabled: bool,
    pub log_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let admin_token = env::var(env_vars::ADMIN_TOKEN).unwrap_or_else(|_| {
            let token = uuid::Uuid::new_v4().to_string();
            log::warn!(
                "{} not set - generated admin token: {}",
                env_vars::ADMIN_TOKEN,
                token
            );
            token
        });

        let allowed_commands = env::var(env_vars::ALLOWED_COMMANDS)
            .unwrap_or_else(|_| defaults::ALLOWED_COMMANDS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            admin_token,
            validator_url: env::var(env_vars::VALIDATOR_URL).ok(),
            site_cli_enabled: env_bool(env_vars::SITE_CLI_ENABLED, true),
            tool_wp_cli_enabled: env_bool(env_vars::TOOL_WP_CLI, true),
            tool_wp_api_enabled: env_bool(env_vars::TOOL_WP_API, true),
            tool_memberpress_info_enabled: env_bool(env_vars::TOOL_MEMBERPRESS_INFO, true),
            tool_plugin_logs_enabled: env_bool(env_vars::TOOL_PLUGIN_LOGS, true),
            allowed_commands,
            enforce_allowlist: env_bool(env_vars::ENFORCE_ALLOWLIST, false),
            commerce_enabled: env_bool(env_vars::COMMERCE_ENABLED, true),
            log_retention_days: env::var(env_vars::LOG_RETENTION_DAYS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::LOG_RETENTION_DAYS),
        }
    }

    /// Apply overrides persisted through the admin config API.
    pub fn apply_stored_settings(&mut self, db: &crate::db::Database) {
        if let Ok(Some(raw)) = db.get_setting(settings::ALLOWED_COMMANDS) {
            self.allowed_commands = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(Some(raw)) = db.get_setting(settings::ENFORCE_ALLOWLIST) {
            self.enforce_allowlist = raw == "1" || raw.eq_ignore_ascii_case("true");
        }
    }
}
