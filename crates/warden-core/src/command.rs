//! Command vocabulary and dispatch table.
//!
//! The whitelist and the dispatch table are one object: a name is accepted by
//! the validator iff a handler is registered under it, so the two cannot
//! drift apart.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::site::{CacheTarget, ConfigKey, ConfigValue, LogLevel, SiteAction};

/// Produces the side effects of one command.
pub trait CommandHandler: Send + Sync {
    /// Actions to apply, in order.
    fn actions(&self) -> Vec<SiteAction>;
}

impl<F> CommandHandler for F
where
    F: Fn() -> Vec<SiteAction> + Send + Sync,
{
    fn actions(&self) -> Vec<SiteAction> {
        self()
    }
}

/// Settings applied by `lockDown`, in write order.
pub const LOCKDOWN_SETTINGS: &[(ConfigKey, ConfigValue)] = &[
    (ConfigKey::RegistrationEnabled, ConfigValue::Bool(false)),
    (ConfigKey::SingleSessionPerUser, ConfigValue::Bool(true)),
    (ConfigKey::IpBanningEnabled, ConfigValue::Bool(true)),
    (ConfigKey::CommentsOpen, ConfigValue::Bool(false)),
    (ConfigKey::CaptchaEnabled, ConfigValue::Bool(true)),
    (ConfigKey::HtmlSanitization, ConfigValue::Bool(true)),
    (ConfigKey::MinSearchChars, ConfigValue::Int(4)),
    (ConfigKey::CompressionEnabled, ConfigValue::Bool(false)),
    (ConfigKey::MinPasswordLength, ConfigValue::Int(12)),
    (ConfigKey::PasswordComplexity, ConfigValue::Int(3)),
    (ConfigKey::AllowEmailChange, ConfigValue::Bool(false)),
    (ConfigKey::AllowDisplayNameChange, ConfigValue::Bool(false)),
    (ConfigKey::AllowExternalImages, ConfigValue::Bool(false)),
    (ConfigKey::AllowRemoteAvatars, ConfigValue::Bool(false)),
];

/// Commands every deployment understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Report liveness.
    CheckPulse,
    /// Close the site to visitors.
    CloseSite,
    /// Reserved. Reopening needs elevated handling because the closed-site
    /// gate also blocks the request that would reopen it.
    OpenSite,
    /// Clear the data cache and compiled templates.
    ClearCache,
    /// Enable debug mode.
    DebugOn,
    /// Disable debug mode.
    DebugOff,
    /// Apply [`LOCKDOWN_SETTINGS`].
    LockDown,
}

impl Builtin {
    /// All built-in commands.
    pub const ALL: [Self; 7] = [
        Self::CheckPulse,
        Self::CloseSite,
        Self::OpenSite,
        Self::ClearCache,
        Self::DebugOn,
        Self::DebugOff,
        Self::LockDown,
    ];

    /// Wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CheckPulse => "checkPulse",
            Self::CloseSite => "closeSite",
            Self::OpenSite => "openSite",
            Self::ClearCache => "clearCache",
            Self::DebugOn => "debugOn",
            Self::DebugOff => "debugOff",
            Self::LockDown => "lockDown",
        }
    }
}

impl CommandHandler for Builtin {
    fn actions(&self) -> Vec<SiteAction> {
        match self {
            Self::CheckPulse => vec![SiteAction::ReportPulse],
            Self::CloseSite => vec![SiteAction::SetConfig {
                key: ConfigKey::SiteClosed,
                value: ConfigValue::Bool(true),
            }],
            Self::OpenSite => vec![SiteAction::Log {
                level: LogLevel::Warn,
                message: "openSite is reserved and requires elevated handling; no action taken"
                    .to_string(),
            }],
            Self::ClearCache => vec![
                SiteAction::ClearCache(CacheTarget::Data),
                SiteAction::ClearCache(CacheTarget::CompiledTemplates),
            ],
            Self::DebugOn => vec![SiteAction::SetConfig {
                key: ConfigKey::DebugMode,
                value: ConfigValue::Bool(true),
            }],
            Self::DebugOff => vec![SiteAction::SetConfig {
                key: ConfigKey::DebugMode,
                value: ConfigValue::Bool(false),
            }],
            Self::LockDown => LOCKDOWN_SETTINGS
                .iter()
                .map(|&(key, value)| SiteAction::SetConfig { key, value })
                .collect(),
        }
    }
}

/// Errors from registering a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Command names must be non-empty ASCII letters.
    #[error("invalid command name: {0:?}")]
    InvalidName(String),

    /// A handler is already registered under this name.
    #[error("command already registered: {0}")]
    Duplicate(String),
}

/// Registry mapping command names to handlers.
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Registry with no commands. Rejects everything.
    pub fn empty() -> Self {
        Self { handlers: BTreeMap::new() }
    }

    /// Registry holding every [`Builtin`].
    pub fn builtin() -> Self {
        let handlers = Builtin::ALL
            .into_iter()
            .map(|cmd| (cmd.name().to_string(), Arc::new(cmd) as Arc<dyn CommandHandler>))
            .collect();
        Self { handlers }
    }

    /// Add a command.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidName` if `name` is empty or not all ASCII
    ///   letters
    /// - `RegistryError::Duplicate` if `name` is taken
    pub fn register(
        &mut self,
        name: &str,
        handler: impl CommandHandler + 'static,
    ) -> Result<(), RegistryError> {
        if !is_command_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.handlers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.handlers.insert(name.to_string(), Arc::new(handler));
        Ok(())
    }

    /// Whether `name` is whitelisted.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Handler for `name`.
    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(AsRef::as_ref)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Command names are non-empty ASCII alphabetic.
pub fn is_command_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_holds_the_vocabulary() {
        let registry = CommandRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec![
            "checkPulse",
            "clearCache",
            "closeSite",
            "debugOff",
            "debugOn",
            "lockDown",
            "openSite"
        ]);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = CommandRegistry::builtin();
        assert!(registry.contains("checkPulse"));
        assert!(!registry.contains("checkpulse"));
        assert!(!registry.contains("CHECKPULSE"));
    }

    #[test]
    fn lockdown_writes_every_setting_once() {
        let actions = Builtin::LockDown.actions();
        assert_eq!(actions.len(), LOCKDOWN_SETTINGS.len());
        assert!(actions.contains(&SiteAction::SetConfig {
            key: ConfigKey::RegistrationEnabled,
            value: ConfigValue::Bool(false),
        }));
        assert!(actions.contains(&SiteAction::SetConfig {
            key: ConfigKey::MinPasswordLength,
            value: ConfigValue::Int(12),
        }));
    }

    #[test]
    fn open_site_changes_nothing() {
        let actions = Builtin::OpenSite.actions();
        assert!(actions.iter().all(|a| matches!(a, SiteAction::Log { .. })));
    }

    #[test]
    fn clear_cache_clears_both_stores() {
        assert_eq!(Builtin::ClearCache.actions(), vec![
            SiteAction::ClearCache(CacheTarget::Data),
            SiteAction::ClearCache(CacheTarget::CompiledTemplates),
        ]);
    }

    #[test]
    fn register_custom_command() {
        let mut registry = CommandRegistry::builtin();
        registry
            .register("purgeLogs", || vec![SiteAction::ClearCache(CacheTarget::Data)])
            .unwrap();
        assert!(registry.contains("purgeLogs"));
        assert_eq!(registry.get("purgeLogs").unwrap().actions().len(), 1);
    }

    #[test]
    fn register_rejects_bad_names() {
        let mut registry = CommandRegistry::empty();
        for name in ["", "purge_logs", "purge1", "purge logs", "pürge"] {
            assert!(matches!(
                registry.register(name, Vec::<SiteAction>::new),
                Err(RegistryError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = CommandRegistry::builtin();
        let result = registry.register("lockDown", Vec::<SiteAction>::new);
        assert_eq!(result, Err(RegistryError::Duplicate("lockDown".to_string())));
    }
}
