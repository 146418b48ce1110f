//! Site-management side effects.
//!
//! Dispatch does not touch the host application directly. It returns
//! [`SiteAction`]s, and the driver applies them to the [`ConfigStore`] and
//! [`CacheInvalidator`] it was given.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Host configuration settings the built-in commands write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKey {
    /// Site is closed to visitors.
    SiteClosed,
    /// Debug output enabled.
    DebugMode,
    /// New account registration allowed.
    RegistrationEnabled,
    /// At most one active session per user.
    SingleSessionPerUser,
    /// Automatic IP banning enabled.
    IpBanningEnabled,
    /// Comments accepted on content.
    CommentsOpen,
    /// CAPTCHA on forms.
    CaptchaEnabled,
    /// HTML sanitization of user content.
    HtmlSanitization,
    /// Minimum search term length in characters.
    MinSearchChars,
    /// Response compression.
    CompressionEnabled,
    /// Minimum password length.
    MinPasswordLength,
    /// Password complexity level (0 = none, 3 = mixed case, digits, symbols).
    PasswordComplexity,
    /// Users may change their own email address.
    AllowEmailChange,
    /// Users may change their own display name.
    AllowDisplayNameChange,
    /// Posts may embed images from other hosts.
    AllowExternalImages,
    /// Users may link avatars from other hosts.
    AllowRemoteAvatars,
}

impl ConfigKey {
    /// Setting name as the host application knows it.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SiteClosed => "site_closed",
            Self::DebugMode => "debug_mode",
            Self::RegistrationEnabled => "registration_enabled",
            Self::SingleSessionPerUser => "single_session_per_user",
            Self::IpBanningEnabled => "ip_banning_enabled",
            Self::CommentsOpen => "comments_open",
            Self::CaptchaEnabled => "captcha_enabled",
            Self::HtmlSanitization => "html_sanitization",
            Self::MinSearchChars => "min_search_chars",
            Self::CompressionEnabled => "compression_enabled",
            Self::MinPasswordLength => "min_password_length",
            Self::PasswordComplexity => "password_complexity",
            Self::AllowEmailChange => "allow_email_change",
            Self::AllowDisplayNameChange => "allow_display_name_change",
            Self::AllowExternalImages => "allow_external_images",
            Self::AllowRemoteAvatars => "allow_remote_avatars",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value written to a configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValue {
    /// Flag.
    Bool(bool),
    /// Count or level.
    Int(u32),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", u8::from(*value)),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Which cache to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTarget {
    /// Application data cache.
    Data,
    /// Compiled template store.
    CompiledTemplates,
}

impl CacheTarget {
    const fn index(self) -> usize {
        match self {
            Self::Data => 0,
            Self::CompiledTemplates => 1,
        }
    }
}

/// Log level for [`SiteAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// A side effect requested by an authenticated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteAction {
    /// Signal liveness to the caller.
    ReportPulse,

    /// Write one configuration setting.
    SetConfig {
        /// Setting to write
        key: ConfigKey,
        /// New value
        value: ConfigValue,
    },

    /// Clear a cache.
    ClearCache(CacheTarget),

    /// Emit a log line.
    Log {
        /// Level to log at
        level: LogLevel,
        /// Message text
        message: String,
    },
}

/// Error reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SiteError(pub String);

/// Host configuration storage.
pub trait ConfigStore: Send + Sync {
    /// Write one setting.
    fn set_config(&self, key: ConfigKey, value: ConfigValue) -> Result<(), SiteError>;
}

/// Host cache invalidation.
pub trait CacheInvalidator: Send + Sync {
    /// Clear `target`.
    fn clear_cache(&self, target: CacheTarget) -> Result<(), SiteError>;
}

/// Configuration store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<BTreeMap<ConfigKey, ConfigValue>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`.
    pub fn get(&self, key: ConfigKey) -> Option<ConfigValue> {
        self.values.read().ok().and_then(|values| values.get(&key).copied())
    }

    /// All written settings, ordered by key.
    pub fn snapshot(&self) -> Vec<(ConfigKey, ConfigValue)> {
        self.values
            .read()
            .map(|values| values.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn set_config(&self, key: ConfigKey, value: ConfigValue) -> Result<(), SiteError> {
        let mut values =
            self.values.write().map_err(|_| SiteError("config store lock poisoned".into()))?;
        values.insert(key, value);
        Ok(())
    }
}

/// Cache invalidator that counts clears per target.
///
/// Each clear bumps a generation number; readers holding an older generation
/// know their cached view is stale.
#[derive(Debug, Default)]
pub struct GenerationCache {
    generations: [AtomicU64; 2],
}

impl GenerationCache {
    /// Create with all generations at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `target` has been cleared.
    pub fn generation(&self, target: CacheTarget) -> u64 {
        self.generations[target.index()].load(Ordering::Acquire)
    }
}

impl CacheInvalidator for GenerationCache {
    fn clear_cache(&self, target: CacheTarget) -> Result<(), SiteError> {
        self.generations[target.index()].fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
