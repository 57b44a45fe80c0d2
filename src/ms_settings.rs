// Bootstrap settings read from the environment at process start
// Shared by the terminal client (API base URL) and the server (dev server, assets)

use std::path::PathBuf;

use log::LevelFilter;

use crate::ms_error::SettingsError;

/// Build mode selector, the equivalent of a frontend's NODE_ENV.
pub const ENV_MODE: &str = "APP_ENV";
/// Generic API domain; preferred when both base URL variables are set.
pub const ENV_API_DOMAIN: &str = "APP_API_DOMAIN";
pub const ENV_BASE_URL: &str = "APP_BASE_URL";
pub const ENV_HOST: &str = "HOST";
pub const ENV_SSL_KEY: &str = "SSL_KEY";
pub const ENV_SSL_CERT: &str = "SSL_CERT";
pub const ENV_PORT: &str = "PORT";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";
pub const ENV_CORS_WHITELIST: &str = "CORS_ORIGIN_WHITELIST";
pub const ENV_LOG_LEVEL: &str = "ROOT_LOGGING_LEVEL";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STATIC_DIR: &str = "ui/dist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
    Test,
}

impl BuildMode {
    /// Unset means production: a server started without configuration
    /// must not expect dev-only TLS files.
    pub fn from_lookup<F>(lookup: F) -> Result<BuildMode, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_MODE) {
            None => Ok(BuildMode::Production),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "development" => Ok(BuildMode::Development),
                "production" => Ok(BuildMode::Production),
                "test" => Ok(BuildMode::Test),
                _ => Err(SettingsError::InvalidValue { var: ENV_MODE, value: v }),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
            BuildMode::Test => "test",
        }
    }
}

/// URL prefix the built UI assets are served under.
pub fn public_path(mode: BuildMode) -> &'static str {
    match mode {
        BuildMode::Production => "/static/",
        _ => "/",
    }
}

/// Settings for the API client of the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Root address prepended to every API request, kept exactly as given.
    pub base_url: String,
}

impl ClientSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<ClientSettings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_DOMAIN)
            .or_else(|| lookup(ENV_BASE_URL))
            .ok_or(SettingsError::MissingVar(ENV_API_DOMAIN))?;
        Ok(ClientSettings { base_url })
    }

    pub fn from_env() -> Result<ClientSettings, SettingsError> {
        ClientSettings::from_lookup(env_lookup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub key: PathBuf,
    pub cert: PathBuf,
}

/// Development server: host binding plus TLS material paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServer {
    pub host: Option<String>,
    pub tls: TlsFiles,
}

impl DevServer {
    fn from_lookup<F>(lookup: &F) -> Result<DevServer, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(ENV_SSL_KEY).ok_or(SettingsError::MissingVar(ENV_SSL_KEY))?;
        let cert = lookup(ENV_SSL_CERT).ok_or(SettingsError::MissingVar(ENV_SSL_CERT))?;
        Ok(DevServer {
            host: lookup(ENV_HOST),
            tls: TlsFiles {
                key: PathBuf::from(key),
                cert: PathBuf::from(cert),
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub mode: BuildMode,
    pub public_path: &'static str,
    /// Present only in development.
    pub dev_server: Option<DevServer>,
    pub port: u16,
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub log_level: LevelFilter,
}

impl ServerSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<ServerSettings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = BuildMode::from_lookup(&lookup)?;
        let dev_server = match mode {
            BuildMode::Development => Some(DevServer::from_lookup(&lookup)?),
            _ => None,
        };
        let port = match lookup(ENV_PORT) {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| SettingsError::InvalidValue { var: ENV_PORT, value: v })?,
            None => DEFAULT_PORT,
        };
        let log_level = match lookup(ENV_LOG_LEVEL) {
            Some(v) => v
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| SettingsError::InvalidValue { var: ENV_LOG_LEVEL, value: v })?,
            None => LevelFilter::Info,
        };
        let cors_origins = lookup(ENV_CORS_WHITELIST)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(ServerSettings {
            mode,
            public_path: public_path(mode),
            dev_server,
            port,
            static_dir: PathBuf::from(
                lookup(ENV_STATIC_DIR).unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ),
            cors_origins,
            log_level,
        })
    }

    pub fn from_env() -> Result<ServerSettings, SettingsError> {
        ServerSettings::from_lookup(env_lookup)
    }

    /// Address the listener binds to. The dev server host wins when set.
    pub fn bind_host(&self) -> &str {
        self.dev_server
            .as_ref()
            .and_then(|d| d.host.as_deref())
            .unwrap_or("0.0.0.0")
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn public_path_depends_on_mode() {
        assert_eq!(public_path(BuildMode::Production), "/static/");
        assert_eq!(public_path(BuildMode::Development), "/");
        assert_eq!(public_path(BuildMode::Test), "/");
    }

    #[test]
    fn mode_defaults_to_production() {
        assert_eq!(BuildMode::from_lookup(vars(&[])), Ok(BuildMode::Production));
        assert_eq!(
            BuildMode::from_lookup(vars(&[("APP_ENV", "Development")])),
            Ok(BuildMode::Development)
        );
        assert!(BuildMode::from_lookup(vars(&[("APP_ENV", "staging")])).is_err());
    }

    #[test]
    fn development_carries_dev_server_verbatim() {
        let s = ServerSettings::from_lookup(vars(&[
            ("APP_ENV", "development"),
            ("HOST", " my.local "),
            ("SSL_KEY", "certs/key with space.pem"),
            ("SSL_CERT", "/abs/cert.pem"),
        ]))
        .unwrap();
        let dev = s.dev_server.expect("dev server in development");
        assert_eq!(dev.host.as_deref(), Some(" my.local "));
        assert_eq!(dev.tls.key, PathBuf::from("certs/key with space.pem"));
        assert_eq!(dev.tls.cert, PathBuf::from("/abs/cert.pem"));
        assert_eq!(s.public_path, "/");
    }

    #[test]
    fn dev_server_absent_outside_development() {
        for mode in ["production", "test"] {
            let s = ServerSettings::from_lookup(vars(&[
                ("APP_ENV", mode),
                ("HOST", "h"),
                ("SSL_KEY", "k"),
                ("SSL_CERT", "c"),
            ]))
            .unwrap();
            assert!(s.dev_server.is_none(), "{mode}");
        }
    }

    #[test]
    fn development_without_tls_paths_fails() {
        let err = ServerSettings::from_lookup(vars(&[("APP_ENV", "development"), ("SSL_CERT", "c")]))
            .unwrap_err();
        assert_eq!(err, SettingsError::MissingVar("SSL_KEY"));
    }

    #[test]
    fn base_url_is_verbatim_and_prefers_domain_variable() {
        let s = ClientSettings::from_lookup(vars(&[("APP_API_DOMAIN", "https://api.example.com/v1/ ")]))
            .unwrap();
        assert_eq!(s.base_url, "https://api.example.com/v1/ ");

        let s = ClientSettings::from_lookup(vars(&[
            ("APP_API_DOMAIN", "https://a"),
            ("APP_BASE_URL", "https://b"),
        ]))
        .unwrap();
        assert_eq!(s.base_url, "https://a");

        let s = ClientSettings::from_lookup(vars(&[("APP_BASE_URL", "http://localhost:8000")])).unwrap();
        assert_eq!(s.base_url, "http://localhost:8000");

        assert!(ClientSettings::from_lookup(vars(&[])).is_err());
    }

    #[test]
    fn supplemental_server_keys() {
        let s = ServerSettings::from_lookup(vars(&[
            ("PORT", "9443"),
            ("CORS_ORIGIN_WHITELIST", "https://a.example  https://b.example"),
            ("ROOT_LOGGING_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(s.port, 9443);
        assert_eq!(s.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(s.log_level, LevelFilter::Debug);
        assert_eq!(s.bind_host(), "0.0.0.0");
        assert!(ServerSettings::from_lookup(vars(&[("PORT", "http")])).is_err());
    }
}
