//! Common filesystem paths used by qfind.

use std::path::PathBuf;

/// Base directory for qfind state (config, etc).
///
/// Defaults to `~/.qfind`, but can be overridden via `QFIND_DIR` for testing
/// or multi-instance setups.
pub fn qfind_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("QFIND_DIR") {
        return PathBuf::from(dir);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".qfind")
}

/// Path to the qfind configuration file.
pub fn config_path() -> PathBuf {
    qfind_dir().join("config.toml")
}

#[doc(hidden)]
pub fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}
