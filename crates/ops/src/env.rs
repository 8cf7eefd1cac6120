//! Window-level capabilities the catalog reaches for (storage, history,
//! cookies, console, notifications), injected so the engine runs headless.

use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Session,
    Local,
}

impl StorageKind {
    /// `"session"` selects session storage; anything else is persistent.
    pub fn from_type(value: Option<&str>) -> Self {
        match value {
            Some("session") => StorageKind::Session,
            _ => StorageKind::Local,
        }
    }
}

pub trait Storage {
    fn get_item(&self, key: &str) -> Option<&str>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
    fn clear(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "log" => Some(ConsoleLevel::Log),
            "info" => Some(ConsoleLevel::Info),
            "warn" => Some(ConsoleLevel::Warn),
            "error" => Some(ConsoleLevel::Error),
            "debug" => Some(ConsoleLevel::Debug),
            _ => None,
        }
    }

    fn log_level(self) -> log::Level {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Info => log::Level::Info,
            ConsoleLevel::Warn => log::Level::Warn,
            ConsoleLevel::Error => log::Level::Error,
            ConsoleLevel::Debug => log::Level::Debug,
        }
    }
}

pub trait Console {
    fn log(&mut self, level: ConsoleLevel, message: &str);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingNotification {
    pub title: String,
    pub options: Value,
}

pub trait Notifications {
    fn permission(&self) -> Permission;
    /// Queues a permission prompt; `pending` is shown once the host grants it.
    fn request_permission(&mut self, pending: PendingNotification);
    fn show(&mut self, notification: PendingNotification);
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub state: Value,
    pub title: String,
    pub url: Option<String>,
}

pub trait Environment {
    fn storage(&mut self, kind: StorageKind) -> &mut dyn Storage;
    fn push_state(&mut self, state: Value, title: &str, url: Option<&str>);
    fn set_cookie(&mut self, raw: &str);
    fn console(&mut self) -> &mut dyn Console;
    fn notifications(&mut self) -> &mut dyn Notifications;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Everything after the first `;`, as sent.
    pub attributes: String,
}

/// Name-keyed cookie store fed with raw `document.cookie`-style assignments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn set(&mut self, raw: &str) {
        let (pair, attributes) = raw.split_once(';').unwrap_or((raw, ""));
        let (name, value) = pair.split_once('=').unwrap_or(("", pair));
        let (name, value) = (name.trim(), value.trim());
        let expired = attributes.split(';').any(|a| {
            a.split_once('=').is_some_and(|(k, v)| {
                k.trim().eq_ignore_ascii_case("max-age") && v.trim().parse::<i64>().is_ok_and(|n| n <= 0)
            })
        });
        self.cookies.retain(|c| c.name != name);
        if !expired {
            self.cookies.push(Cookie {
                name: name.to_string(),
                value: value.to_string(),
                attributes: attributes.trim().to_string(),
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// The `name=value; name=value` view scripts read back.
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| {
                if c.name.is_empty() {
                    c.value.clone()
                } else {
                    format!("{}={}", c.name, c.value)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Forwards console output to `log` and keeps a copy.
#[derive(Clone, Debug, Default)]
pub struct LogConsole {
    pub lines: Vec<(ConsoleLevel, String)>,
}

impl Console for LogConsole {
    fn log(&mut self, level: ConsoleLevel, message: &str) {
        log::log!(target: "ops.console", level.log_level(), "{message}");
        self.lines.push((level, message.to_string()));
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryNotifications {
    pub permission: Permission,
    pub pending: Vec<PendingNotification>,
    pub shown: Vec<PendingNotification>,
}

impl MemoryNotifications {
    /// Resolves every outstanding prompt, showing the queue when granted.
    pub fn settle_permission(&mut self, permission: Permission) {
        self.permission = permission;
        let pending = std::mem::take(&mut self.pending);
        if permission == Permission::Granted {
            self.shown.extend(pending);
        }
    }
}

impl Notifications for MemoryNotifications {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self, pending: PendingNotification) {
        self.pending.push(pending);
    }

    fn show(&mut self, notification: PendingNotification) {
        self.shown.push(notification);
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryEnvironment {
    pub session: MemoryStorage,
    pub local: MemoryStorage,
    pub history: Vec<HistoryEntry>,
    pub cookies: CookieJar,
    pub console: LogConsole,
    pub notifications: MemoryNotifications,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for MemoryEnvironment {
    fn storage(&mut self, kind: StorageKind) -> &mut dyn Storage {
        match kind {
            StorageKind::Session => &mut self.session,
            StorageKind::Local => &mut self.local,
        }
    }

    fn push_state(&mut self, state: Value, title: &str, url: Option<&str>) {
        self.history.push(HistoryEntry {
            state,
            title: title.to_string(),
            url: url.map(str::to_string),
        });
    }

    fn set_cookie(&mut self, raw: &str) {
        self.cookies.set(raw);
    }

    fn console(&mut self) -> &mut dyn Console {
        &mut self.console
    }

    fn notifications(&mut self) -> &mut dyn Notifications {
        &mut self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn storage_type_flag() {
        assert_eq!(StorageKind::from_type(Some("session")), StorageKind::Session);
        assert_eq!(StorageKind::from_type(Some("local")), StorageKind::Local);
        assert_eq!(StorageKind::from_type(None), StorageKind::Local);
    }

    #[test]
    fn storages_are_independent() {
        let mut env = MemoryEnvironment::new();
        env.storage(StorageKind::Session).set_item("k", "s");
        env.storage(StorageKind::Local).set_item("k", "l");
        env.storage(StorageKind::Session).clear();
        assert!(env.session.is_empty());
        assert_eq!(env.local.get_item("k"), Some("l"));
    }

    #[test]
    fn cookies_replace_by_name_and_expire() {
        let mut jar = CookieJar::default();
        jar.set("theme=dark; path=/");
        jar.set("lang=en");
        jar.set("theme=light; path=/; Secure");
        assert_eq!(jar.header(), "lang=en; theme=light");
        assert_eq!(jar.get("theme").unwrap().attributes, "path=/; Secure");
        jar.set("lang=; Max-Age=0");
        assert_eq!(jar.header(), "theme=light");
    }

    #[test]
    fn notifications_wait_for_the_host() {
        let mut n = MemoryNotifications::default();
        n.request_permission(PendingNotification {
            title: "Hi".into(),
            options: json!({ "body": "there" }),
        });
        assert!(n.shown.is_empty());
        n.settle_permission(Permission::Granted);
        assert_eq!(n.shown.len(), 1);
        assert!(n.pending.is_empty());

        n.request_permission(PendingNotification {
            title: "Again".into(),
            options: Value::Null,
        });
        n.settle_permission(Permission::Denied);
        assert_eq!(n.shown.len(), 1);
    }

    #[test]
    fn console_levels() {
        assert_eq!(ConsoleLevel::from_name("warn"), Some(ConsoleLevel::Warn));
        assert_eq!(ConsoleLevel::from_name("shout"), None);
        let mut console = LogConsole::default();
        console.log(ConsoleLevel::Error, "bad");
        assert_eq!(console.lines, [(ConsoleLevel::Error, "bad".to_string())]);
    }
}
