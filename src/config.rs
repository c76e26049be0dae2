//! Application configuration.
//!
//! Every field has a default, so a partial document deserializes fine:
//!
//! ```rust
//! let cfg: mvcapp::Config = serde_json::from_str(r#"{ "default_controller": "Site" }"#).unwrap();
//! assert_eq!(cfg.default_controller, "Site");
//! assert_eq!(cfg.default_action, "Index");
//! ```
//!
//! Where the document comes from (TOML, JSON, environment) is up to the
//! application.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::static_files::DEFAULT_DENIED_PREFIXES;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Controller used for `/` and for the not-found page when nothing else
    /// matches.
    pub default_controller: String,
    /// Action used when the path stops at the controller name.
    pub default_action: String,
    /// Name of the cookie carrying the session id.
    pub session_cookie: String,
    /// Inactivity after which a session is swept.
    pub session_timeout_secs: u64,
    /// How often the server sweeps expired sessions. `0` disables it.
    pub sweep_interval_secs: u64,
    /// First path segments never served as static files.
    pub denied_prefixes: Vec<String>,
    /// Application root: static files and `views/` live here.
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_controller: "Home".to_owned(),
            default_action: "Index".to_owned(),
            session_cookie: "SessionID".to_owned(),
            session_timeout_secs: 900,
            sweep_interval_secs: 60,
            denied_prefixes: DEFAULT_DENIED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.default_controller, "Home");
        assert_eq!(cfg.session_cookie, "SessionID");
        assert_eq!(cfg.session_timeout(), Duration::from_secs(900));
        assert_eq!(cfg.denied_prefixes, ["controllers", "models", "emails", "views"]);
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{ "session_cookie": "sid", "sweep_interval_secs": 0, "root": "/srv/site" }"#,
        )
        .unwrap();
        assert_eq!(cfg.session_cookie, "sid");
        assert_eq!(cfg.sweep_interval(), None);
        assert_eq!(cfg.root, PathBuf::from("/srv/site"));
        assert_eq!(cfg.default_action, "Index");
    }
}
