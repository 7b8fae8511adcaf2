//! Authenticated client handle.
//!
//! An [`Agent`] wraps the XRPC client with a live session. It is obtained by
//! resuming a stored session or by credential login; either path goes through
//! [`AgentBuilder`], which registers the session lifecycle hook first so a
//! refresh triggered during restore is captured.

use crate::error::{Error, Result};
use crate::session::{Session, SessionEvent, SessionHook, SessionStore, persist_hook};
use crate::xrpc::{Facet, PostRecord, RecordRef, SearchPostsOutput, XrpcClient};
use async_trait::async_trait;
use tracing::{debug, info};

/// Read access to the paginated hashtag search
#[async_trait]
pub trait PostIndex {
    /// Fetch one page of results for `tag`, optionally continuing from `cursor`
    async fn search_page(
        &self,
        tag: &str,
        limit: u8,
        cursor: Option<&str>,
    ) -> Result<SearchPostsOutput>;
}

/// Write access to the bot's repo
#[async_trait]
pub trait PostOutbox {
    /// Publish one post and return its record reference
    async fn publish(&self, text: &str, facets: Vec<Facet>) -> Result<RecordRef>;
}

/// Account credentials for the login fallback
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

/// Builder that wires the lifecycle hook before authentication runs
pub struct AgentBuilder {
    client: XrpcClient,
    hook: Option<SessionHook>,
}

impl AgentBuilder {
    pub fn new(service_url: &str) -> Result<Self> {
        Ok(Self {
            client: XrpcClient::new(service_url)?,
            hook: None,
        })
    }

    /// Register the callback invoked on session create and refresh
    pub fn on_session_change(mut self, hook: SessionHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Restore a stored session.
    ///
    /// The access token is validated with getSession; a stale access token is
    /// rotated via refreshSession, firing [`SessionEvent::Refresh`]. A session
    /// the server rejects outright fires [`SessionEvent::Expired`] and fails.
    pub async fn resume(self, session: Session) -> Result<Agent> {
        let mut client = self.client;
        client.set_bearer(&session.access_jwt);

        match client.get_session().await {
            Ok(current) => {
                debug!("Resumed session for {}", current.handle);
                Ok(Agent { client, session })
            }
            Err(e) if e.is_expired_token() => {
                info!("Access token expired, refreshing session");
                let tokens = client.refresh_session(&session.refresh_jwt).await?;
                client.set_bearer(&tokens.access_jwt);

                let session = Session::from(tokens);
                fire(&self.hook, SessionEvent::Refresh, &session);
                Ok(Agent { client, session })
            }
            Err(e) => {
                fire(&self.hook, SessionEvent::Expired, &session);
                Err(Error::SessionRejected(e.to_string()))
            }
        }
    }

    /// Perform a credential login, firing [`SessionEvent::Create`]
    pub async fn login(self, credentials: &Credentials) -> Result<Agent> {
        let mut client = self.client;
        let tokens = client
            .create_session(&credentials.identifier, &credentials.password)
            .await?;
        client.set_bearer(&tokens.access_jwt);

        let session = Session::from(tokens);
        fire(&self.hook, SessionEvent::Create, &session);
        Ok(Agent { client, session })
    }
}

fn fire(hook: &Option<SessionHook>, event: SessionEvent, session: &Session) {
    if let Some(hook) = hook {
        hook(event, session);
    }
}

/// Authenticated client handle for one account
pub struct Agent {
    client: XrpcClient,
    session: Session,
}

impl Agent {
    /// Obtain an authenticated agent: reuse the stored session when one
    /// exists, otherwise log in with credentials. The persistence hook is
    /// registered before either path runs.
    pub async fn init(
        service_url: &str,
        store: &SessionStore,
        credentials: &Credentials,
    ) -> Result<Agent> {
        let builder =
            AgentBuilder::new(service_url)?.on_session_change(persist_hook(store.clone()));

        match store.load()? {
            Some(session) => {
                info!("Reusing session");
                builder.resume(session).await
            }
            None => {
                info!("Creating new session");
                builder.login(credentials).await
            }
        }
    }

    /// The live session
    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl PostIndex for Agent {
    async fn search_page(
        &self,
        tag: &str,
        limit: u8,
        cursor: Option<&str>,
    ) -> Result<SearchPostsOutput> {
        self.client.search_posts(tag, limit, cursor).await
    }
}

#[async_trait]
impl PostOutbox for Agent {
    async fn publish(&self, text: &str, facets: Vec<Facet>) -> Result<RecordRef> {
        let record = PostRecord::now(text, facets);
        self.client.create_record(&self.session.did, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = AgentBuilder::new("https://bsky.social");
        assert!(builder.is_ok());
    }
}
