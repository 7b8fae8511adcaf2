//! Typed XRPC client for the AT Protocol endpoints the bot needs.
//!
//! Covers exactly the lexicon surface hugfairy uses:
//! - `com.atproto.server.createSession` / `getSession` / `refreshSession`
//! - `app.bsky.feed.searchPosts`
//! - `com.atproto.repo.createRecord`
//! - `com.atproto.server.describeServer` (diagnostics only)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

/// Collection NSID for feed posts
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// XRPC client bound to one PDS endpoint
#[derive(Clone)]
pub struct XrpcClient {
    /// Base URL of the PDS, without the /xrpc suffix
    base_url: String,
    /// Access JWT sent as a bearer token on authenticated calls
    bearer: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

impl XrpcClient {
    /// Create a client for the given service URL
    pub fn new(service_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hugfairy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: service_url.into().trim_end_matches('/').to_string(),
            bearer: None,
            client,
        })
    }

    /// Set the access token used for authenticated calls
    pub fn set_bearer(&mut self, token: impl Into<String>) {
        self.bearer = Some(token.into());
    }

    /// The service URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Server / Session Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Exchange an identifier and password for a fresh session
    pub async fn create_session(&self, identifier: &str, password: &str) -> Result<SessionTokens> {
        let req = CreateSessionRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        self.post("com.atproto.server.createSession", Some(&req), None)
            .await
    }

    /// Validate the current access token against the server
    pub async fn get_session(&self) -> Result<CurrentSession> {
        self.get("com.atproto.server.getSession", &[]).await
    }

    /// Trade a refresh token for a new token pair.
    ///
    /// refreshSession authenticates with the refresh JWT, not the access JWT,
    /// so the token is passed explicitly rather than taken from the client.
    pub async fn refresh_session(&self, refresh_jwt: &str) -> Result<SessionTokens> {
        self.post::<SessionTokens, ()>("com.atproto.server.refreshSession", None, Some(refresh_jwt))
            .await
    }

    /// Unauthenticated server metadata, used by diagnostics
    pub async fn describe_server(&self) -> Result<ServerDescription> {
        self.get("com.atproto.server.describeServer", &[]).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Feed Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch one page of hashtag search results, newest first
    pub async fn search_posts(
        &self,
        tag: &str,
        limit: u8,
        cursor: Option<&str>,
    ) -> Result<SearchPostsOutput> {
        let mut query: Vec<(&str, String)> = vec![
            ("q", format!("#{tag}")),
            ("tag", tag.to_string()),
            ("sort", "latest".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(c) = cursor {
            query.push(("cursor", c.to_string()));
        }
        self.get("app.bsky.feed.searchPosts", &query).await
    }

    /// Create a post record in the given repo
    pub async fn create_record(&self, repo: &str, record: &PostRecord) -> Result<RecordRef> {
        let req = CreateRecordRequest {
            repo: repo.to_string(),
            collection: POST_COLLECTION.to_string(),
            record,
        };
        self.post("com.atproto.repo.createRecord", Some(&req), None)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, nsid: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/xrpc/{}", self.base_url, nsid);
        debug!("XRPC request: GET {}", nsid);

        let mut req = self.client.get(&url).query(query);
        if let Some(ref token) = self.bearer {
            req = req.bearer_auth(token);
        }

        Self::decode(req.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        nsid: &str,
        body: Option<&B>,
        bearer_override: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}/xrpc/{}", self.base_url, nsid);
        debug!("XRPC request: POST {}", nsid);

        let mut req = self.client.post(&url);
        if let Some(token) = bearer_override.or(self.bearer.as_deref()) {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        Self::decode(req.send().await?).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        // XRPC failures carry a { "error", "message" } body
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<XrpcErrorBody>(&body) {
            Ok(e) => Err(Error::xrpc(status.as_u16(), e.error, e.message.unwrap_or_default())),
            Err(_) => Err(Error::xrpc(status.as_u16(), "Unknown", body)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    identifier: String,
    password: String,
}

/// Token pair returned by createSession and refreshSession
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

/// Response from getSession - the account the access token belongs to
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    pub did: String,
    pub handle: String,
}

/// Response from describeServer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescription {
    pub did: Option<String>,
    #[serde(default)]
    pub available_user_domains: Vec<String>,
}

/// One page of search results
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPostsOutput {
    /// Continuation token for the next page, absent on the last page
    pub cursor: Option<String>,
    pub posts: Vec<PostView>,
}

/// A post as returned by searchPosts, reduced to what the bot reads
#[derive(Debug, Clone, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: AuthorView,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: String,
    collection: String,
    record: &'a PostRecord,
}

/// An app.bsky.feed.post record ready for createRecord
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
    pub created_at: String,
}

impl PostRecord {
    /// Build a post record stamped with the current time
    pub fn now(text: impl Into<String>, facets: Vec<Facet>) -> Self {
        Self {
            record_type: POST_COLLECTION.to_string(),
            text: text.into(),
            facets,
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// A rich-text facet attached to a byte range of post text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

impl Facet {
    /// A single-feature mention facet over [byte_start, byte_end)
    pub fn mention(did: impl Into<String>, byte_start: usize, byte_end: usize) -> Self {
        Self {
            index: ByteSlice {
                byte_start,
                byte_end,
            },
            features: vec![FacetFeature::Mention { did: did.into() }],
        }
    }
}

/// Byte range into the UTF-8 post text, end exclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

/// Facet feature variants, tagged the way the lexicon tags them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
}

/// Reference to a created record
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    error: String,
    message: Option<String>,
}
