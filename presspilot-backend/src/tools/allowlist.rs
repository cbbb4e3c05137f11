//! Prefix allow-list for free-text commands. The verdict is computed
//! for every command, but only enforced when the operator opts in;
//! the historical behavior is to log the verdict and proceed.

use log::warn;

#[derive(Debug, Clone)]
pub struct CommandAllowList {
    prefixes: Vec<String>,
    enforce: bool,
}

impl CommandAllowList {
    pub fn new(prefixes: Vec<String>, enforce: bool) -> Self {
        Self { prefixes, enforce }
    }

    /// Literal case-sensitive prefix match. An empty list admits nothing.
    pub fn is_allowed(&self, command: &str) -> bool {
        let trimmed = command.trim_start();
        self.prefixes.iter().any(|p| trimmed.starts_with(p.as_str()))
    }

    /// Returns `Err` with a refusal message only when enforcement is
    /// enabled and the command fails the prefix check. Otherwise a
    /// disallowed command is logged and waved through.
    pub fn check(&self, command: &str) -> Result<(), String> {
        if self.is_allowed(command) {
            return Ok(());
        }
        if self.enforce {
            return Err(format!(
                "command '{}' is not on the allowed command list",
                command.trim()
            ));
        }
        warn!("command '{}' is outside the allow-list; executing anyway", command.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["wp post list".to_string(), "wp option get".to_string()]
    }

    #[test]
    fn prefix_match_is_literal_and_case_sensitive() {
        let list = CommandAllowList::new(prefixes(), false);
        assert!(list.is_allowed("wp post list --format=csv"));
        assert!(!list.is_allowed("WP POST LIST"));
        assert!(!list.is_allowed("wp post delete 3"));
    }

    #[test]
    fn empty_list_admits_nothing() {
        let list = CommandAllowList::new(vec![], false);
        assert!(!list.is_allowed("wp post list"));
    }

    #[test]
    fn unenforced_verdict_never_blocks() {
        let list = CommandAllowList::new(prefixes(), false);
        assert!(list.check("wp db drop").is_ok());
    }

    #[test]
    fn enforcement_rejects_with_the_offending_command() {
        let list = CommandAllowList::new(prefixes(), true);
        let err = list.check("wp db drop").unwrap_err();
        assert!(err.contains("wp db drop"));
        assert!(list.check("wp option get blogname").is_ok());
    }
}
