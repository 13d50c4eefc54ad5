use std::path::PathBuf;

use anyhow::{Context, Result};

use riverlog_api::mail::MailConfig;

/// Signing secret used when none is configured. Fine for local runs only.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// `None` when `MAIL_HOST` is unset; reset mails are then dropped.
    pub mail: Option<MailConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let host = get("RIVERLOG_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("RIVERLOG_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("RIVERLOG_PORT is not a valid port")?;
        let db_path = get("RIVERLOG_DB_PATH").unwrap_or_else(|| "riverlog.db".into()).into();
        let jwt_secret = get("RIVERLOG_JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.into());

        let mail = match get("MAIL_HOST") {
            Some(host) => Some(MailConfig {
                host,
                user: get("MAIL_USER").context("MAIL_USER must be set when MAIL_HOST is")?,
                password: get("MAIL_PASSWORD").context("MAIL_PASSWORD must be set when MAIL_HOST is")?,
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            mail,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_path, PathBuf::from("riverlog.db"));
        assert!(cfg.uses_default_secret());
        assert!(cfg.mail.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("RIVERLOG_PORT", "9000"),
            ("RIVERLOG_JWT_SECRET", "s3cret"),
            ("MAIL_HOST", "smtp.example.com"),
            ("MAIL_USER", "logbook@example.com"),
            ("MAIL_PASSWORD", "pw"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert!(!cfg.uses_default_secret());
        let mail = cfg.mail.unwrap();
        assert_eq!(mail.host, "smtp.example.com");
        assert_eq!(mail.user, "logbook@example.com");
    }

    #[test]
    fn rejects_bad_port_and_partial_mail() {
        assert!(config(&[("RIVERLOG_PORT", "eighty")]).is_err());
        assert!(config(&[("MAIL_HOST", "smtp.example.com")]).is_err());
        // empty host means mail stays off
        assert!(config(&[("MAIL_HOST", "")]).unwrap().mail.is_none());
    }
}
