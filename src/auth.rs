//! OAuth2 authentication for Google APIs.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthReason, ReportError, Result};
use crate::models::{ClientSecretFile, ServiceAccountKey, TokenErrorResponse, TokenResponse};
use crate::prompt::Prompt;

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Redirect target for copy/paste authorization codes.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Lifetime requested for service account assertions.
const ASSERTION_LIFETIME: u64 = 3600;

/// Tokens are refreshed this long before they expire.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// An API surface that scopes are granted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    Analytics,
    Drive,
}

impl Api {
    /// Discovery name of the API.
    pub fn name(self) -> &'static str {
        match self {
            Api::Analytics => "analytics",
            Api::Drive => "drive",
        }
    }

    /// API version used by this crate.
    pub fn version(self) -> &'static str {
        "v3"
    }
}

/// Access level of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Edit,
}

/// An OAuth scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub api: Api,
    pub access: Access,
}

impl Scope {
    pub const fn new(api: Api, access: Access) -> Self {
        Self { api, access }
    }

    pub fn uri(&self) -> &'static str {
        match (self.api, self.access) {
            (Api::Analytics, Access::Read) => "https://www.googleapis.com/auth/analytics.readonly",
            (Api::Analytics, Access::Edit) => "https://www.googleapis.com/auth/analytics.edit",
            (Api::Drive, Access::Read) => "https://www.googleapis.com/auth/drive.readonly",
            (Api::Drive, Access::Edit) => "https://www.googleapis.com/auth/drive",
        }
    }
}

fn scope_string(scopes: &[Scope]) -> String {
    scopes.iter().map(Scope::uri).collect::<Vec<_>>().join(" ")
}

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // Space separated OAuth scopes
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<SystemTime>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => at > SystemTime::now() + EXPIRY_BUFFER,
            None => true,
        }
    }
}

/// How new access tokens are obtained.
enum Grant {
    ServiceAccount {
        key: EncodingKey,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: Option<String>,
    },
    Static,
}

struct Inner {
    identity: String,
    scopes: Vec<Scope>,
    token_uri: String,
    grant: Grant,
    http: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

/// Authenticated credentials for Google APIs.
#[derive(Clone)]
pub struct Credentials {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.inner.identity)
            .field("scopes", &self.inner.scopes)
            .finish_non_exhaustive()
    }
}

fn auth_error(reason: AuthReason, detail: impl Into<String>) -> ReportError {
    ReportError::Auth {
        reason,
        detail: detail.into(),
    }
}

fn read_key_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(auth_error(
            AuthReason::MissingKey,
            format!("no key file at {}", path.display()),
        ));
    }
    fs::read_to_string(path).map_err(|e| {
        auth_error(
            AuthReason::MissingKey,
            format!("cannot read {}: {}", path.display(), e),
        )
    })
}

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Authenticate as a service account.
///
/// # Arguments
/// * `identity` - Service account email; falls back to `client_email` from the key file
/// * `key_path` - Path to the service account JSON key file
/// * `scopes` - Scopes to request, at least one
/// * `timeout` - Timeout of the token request
pub async fn authenticate(
    identity: Option<&str>,
    key_path: &Path,
    scopes: &[Scope],
    timeout: Duration,
) -> Result<Credentials> {
    let content = read_key_file(key_path)?;
    let key_file: ServiceAccountKey = serde_json::from_str(&content).map_err(|e| {
        auth_error(
            AuthReason::InvalidKey,
            format!("{} is not a service account key: {}", key_path.display(), e),
        )
    })?;

    let pem_blocks = key_file.private_key.matches("-----BEGIN").count();
    if pem_blocks != 1 {
        return Err(auth_error(
            AuthReason::InvalidKey,
            format!("expected exactly one private key, found {}", pem_blocks),
        ));
    }
    let key = EncodingKey::from_rsa_pem(key_file.private_key.as_bytes())
        .map_err(|e| auth_error(AuthReason::InvalidKey, e.to_string()))?;

    let identity = identity
        .map(str::to_string)
        .or(key_file.client_email)
        .ok_or_else(|| auth_error(AuthReason::InvalidKey, "no service account identity"))?;

    if scopes.is_empty() {
        return Err(auth_error(AuthReason::ScopeRejected, "no scopes requested"));
    }

    let credentials = Credentials::from_parts(
        identity,
        scopes,
        key_file.token_uri.unwrap_or_else(|| TOKEN_URI.to_string()),
        Grant::ServiceAccount { key },
        http_client(timeout)?,
        None,
    );

    // Establish the first token now so rejected scopes surface here.
    credentials.get_access_token().await?;
    debug!(identity = %credentials.identity(), "authenticated service account");
    Ok(credentials)
}

/// Authorize an installed application with a copy/paste authorization code.
///
/// Prints the consent URL through `prompt`, then reads the code the user was given.
pub async fn authorize_installed<P: Prompt>(
    client_secret_path: &Path,
    scopes: &[Scope],
    prompt: &mut P,
    timeout: Duration,
) -> Result<Credentials> {
    let content = read_key_file(client_secret_path)?;
    let secret: ClientSecretFile = serde_json::from_str(&content).map_err(|e| {
        auth_error(
            AuthReason::InvalidKey,
            format!("{} is not a client secret file: {}", client_secret_path.display(), e),
        )
    })?;
    let app = secret.installed;

    if scopes.is_empty() {
        return Err(auth_error(AuthReason::ScopeRejected, "no scopes requested"));
    }

    let redirect_uri = app
        .redirect_uris
        .first()
        .cloned()
        .unwrap_or_else(|| OOB_REDIRECT_URI.to_string());
    let scope = scope_string(scopes);
    let consent_url = Url::parse_with_params(
        &app.auth_uri,
        &[
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| auth_error(AuthReason::InvalidKey, format!("invalid auth_uri: {}", e)))?;

    prompt.notice(consent_url.as_str());
    let code = prompt.ask("Enter the auth code")?;
    let code = code.trim();
    if code.is_empty() {
        return Err(auth_error(
            AuthReason::ScopeRejected,
            "no authorization code entered",
        ));
    }

    let http = http_client(timeout)?;
    let token = exchange(
        &http,
        &app.token_uri,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ],
    )
    .await?;

    let cached = CachedToken {
        access_token: token.access_token,
        expires_at: token.expires_in.map(|s| SystemTime::now() + Duration::from_secs(s)),
    };

    Ok(Credentials::from_parts(
        app.client_id.clone(),
        scopes,
        app.token_uri,
        Grant::AuthorizedUser {
            client_id: app.client_id,
            client_secret: app.client_secret,
            refresh_token: token.refresh_token,
        },
        http,
        Some(cached),
    ))
}

/// Exchange a grant at the token endpoint.
async fn exchange(http: &Client, token_uri: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
    let response = http.post(token_uri).form(params).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_token_error(status.as_u16(), body));
    }

    Ok(response.json().await?)
}

fn classify_token_error(status: u16, body: String) -> ReportError {
    let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) else {
        return ReportError::ApiError {
            status,
            message: body,
        };
    };

    let reason = match err.error.as_str() {
        "invalid_scope" | "unauthorized_client" | "access_denied" => AuthReason::ScopeRejected,
        "invalid_grant" | "invalid_client" => AuthReason::InvalidKey,
        _ => {
            return ReportError::ApiError {
                status,
                message: body,
            }
        }
    };

    let detail = match err.error_description {
        Some(description) => format!("{}: {}", err.error, description),
        None => err.error,
    };
    auth_error(reason, detail)
}

impl Credentials {
    fn from_parts(
        identity: String,
        scopes: &[Scope],
        token_uri: String,
        grant: Grant,
        http: Client,
        cached: Option<CachedToken>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                identity,
                scopes: scopes.to_vec(),
                token_uri,
                grant,
                http,
                cached_token: RwLock::new(cached),
            }),
        }
    }

    /// Wrap an access token that was issued elsewhere. It is never refreshed.
    pub fn with_access_token(access_token: impl Into<String>, scopes: &[Scope]) -> Self {
        Self::from_parts(
            "access-token".to_string(),
            scopes,
            TOKEN_URI.to_string(),
            Grant::Static,
            Client::new(),
            Some(CachedToken {
                access_token: access_token.into(),
                expires_at: None,
            }),
        )
    }

    /// The account these credentials act as.
    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.inner.scopes
    }

    /// Expiry of the current access token, if known.
    pub async fn expiry(&self) -> Option<SystemTime> {
        self.inner
            .cached_token
            .read()
            .await
            .as_ref()
            .and_then(|t| t.expires_at)
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.inner.cached_token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.access_token.clone());
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.inner.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    async fn refresh_token(&self) -> Result<CachedToken> {
        let token = match &self.inner.grant {
            Grant::ServiceAccount { key } => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();

                let claims = Claims {
                    iss: self.inner.identity.clone(),
                    scope: scope_string(&self.inner.scopes),
                    aud: self.inner.token_uri.clone(),
                    iat: now,
                    exp: now + ASSERTION_LIFETIME,
                };

                let jwt = encode(&Header::new(Algorithm::RS256), &claims, key)
                    .map_err(|e| auth_error(AuthReason::InvalidKey, e.to_string()))?;

                exchange(
                    &self.inner.http,
                    &self.inner.token_uri,
                    &[
                        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                        ("assertion", jwt.as_str()),
                    ],
                )
                .await?
            }
            Grant::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token: Some(refresh_token),
            } => {
                exchange(
                    &self.inner.http,
                    &self.inner.token_uri,
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token.as_str()),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                    ],
                )
                .await?
            }
            Grant::AuthorizedUser { .. } | Grant::Static => {
                return Err(auth_error(
                    AuthReason::InvalidKey,
                    "access token expired and cannot be refreshed",
                ));
            }
        };

        debug!(identity = %self.inner.identity, "obtained access token");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|s| SystemTime::now() + Duration::from_secs(s)),
        })
    }
}
