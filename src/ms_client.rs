// API client and the bootstrap that wires it into the root view
//
// Bootstrap order: settings -> plugins -> mount. Plugins can only be added
// before `mount`, which consumes the bootstrap and builds the client.

use std::sync::Arc;

use reqwest::Method;
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder, Response};
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::ms_auth::SESSION_COOKIE;
use crate::ms_error::ClientError;
use crate::ms_game::Status;
use crate::ms_settings::ClientSettings;
use crate::ms_wire::{CellUpdate, ErrorBody, GameView, NewGame};

/// Client pieces a plugin may extend while the client is being built.
pub struct ClientParts {
    pub builder: ClientBuilder,
    pub cookies: Option<Arc<Jar>>,
}

/// An extension installed into the HTTP client before the root view mounts.
pub trait Plugin {
    /// Plugins with the same name are installed once.
    fn name(&self) -> &'static str;
    fn install(&self, parts: ClientParts) -> ClientParts;
}

/// Keeps cookies between requests so the API session survives.
#[derive(Default)]
pub struct CookiePlugin;

impl Plugin for CookiePlugin {
    fn name(&self) -> &'static str {
        "cookies"
    }

    fn install(&self, parts: ClientParts) -> ClientParts {
        let jar = parts.cookies.unwrap_or_else(|| Arc::new(Jar::default()));
        ClientParts {
            builder: parts.builder.cookie_provider(jar.clone()),
            cookies: Some(jar),
        }
    }
}

pub struct Bootstrap {
    settings: ClientSettings,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Bootstrap {
    pub fn new(settings: ClientSettings) -> Self {
        Bootstrap {
            settings,
            plugins: Vec::new(),
        }
    }

    /// Register a plugin; a second registration under the same name is ignored.
    pub fn use_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            log::debug!("plugin {} already registered", plugin.name());
        } else {
            self.plugins.push(Box::new(plugin));
        }
        self
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Build the API client and hand it to the root view.
    pub fn mount<T, F>(self, root: F) -> Result<T, ClientError>
    where
        F: FnOnce(ApiClient) -> T,
    {
        let mut parts = ClientParts {
            builder: Client::builder(),
            cookies: None,
        };
        for plugin in &self.plugins {
            log::debug!("installing plugin {}", plugin.name());
            parts = plugin.install(parts);
        }
        let http = parts.builder.build()?;
        log::info!("mounting root view, API at {}", self.settings.base_url);
        Ok(root(ApiClient {
            base_url: self.settings.base_url,
            http,
            cookies: parts.cookies,
            email: None,
        }))
    }
}

/// Blocking client for the game API.
pub struct ApiClient {
    base_url: String,
    http: Client,
    cookies: Option<Arc<Jar>>,
    email: Option<String>,
}

impl ApiClient {
    /// The base URL exactly as configured.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn has_cookie_store(&self) -> bool {
        self.cookies.is_some()
    }

    /// Base URL and path joined by exactly one slash.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Whether the cookie store holds an API session for `url`.
    fn has_session(&self, url: &str) -> bool {
        let (Some(jar), Ok(url)) = (self.cookies.as_ref(), reqwest::Url::parse(url)) else {
            return false;
        };
        jar.cookies(&url)
            .and_then(|h| h.to_str().map(|s| s.to_string()).ok())
            .is_some_and(|s| {
                s.split(';')
                    .any(|pair| pair.trim().starts_with(&format!("{SESSION_COOKIE}=")))
            })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let email = self.email.as_deref().ok_or(ClientError::NotSignedIn)?;
        let url = self.url(path);
        let with_basic = !self.has_session(&url);
        let mut req = self.http.request(method, url);
        if with_basic {
            req = req.basic_auth(email, Some(""));
        }
        Ok(req)
    }

    fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .json::<ErrorBody>()
            .map(|b| b.detail)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = Self::check(req.send()?)?;
        Ok(resp.json()?)
    }

    /// Log in with an email address. The server registers unknown players.
    pub fn sign_in(&mut self, email: &str) -> Result<Vec<GameView>, ClientError> {
        self.email = Some(email.trim().to_string());
        match self.list_games() {
            Ok(games) => {
                log::info!("signed in as {}", email.trim());
                Ok(games)
            }
            Err(e) => {
                self.email = None;
                Err(e)
            }
        }
    }

    pub fn list_games(&self) -> Result<Vec<GameView>, ClientError> {
        self.fetch(self.request(Method::GET, "api/games")?)
    }

    pub fn create_game(&self, cols: usize, rows: usize, bombs: usize) -> Result<GameView, ClientError> {
        let body = NewGame { cols, rows, bombs };
        self.fetch(self.request(Method::POST, "api/games")?.json(&body))
    }

    pub fn game(&self, uuid: Uuid) -> Result<GameView, ClientError> {
        self.fetch(self.request(Method::GET, &format!("api/games/{uuid}"))?)
    }

    /// Change one cell and return the refreshed game.
    pub fn update_cell(&self, uuid: Uuid, col: usize, row: usize, status: Status) -> Result<GameView, ClientError> {
        let path = format!("api/games/{uuid}/cells/{col},{row}");
        let req = self.request(Method::PATCH, &path)?.json(&CellUpdate { status });
        Self::check(req.send()?)?;
        self.game(uuid)
    }
}
