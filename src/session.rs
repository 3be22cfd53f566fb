//! Basket persistence per browser session.
//!
//! Each session row carries a `version`. Saving with a stale version fails
//! with [`AppError::Conflict`], so two requests racing on the same session
//! cannot silently overwrite each other.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderName, HeaderValue, header, request::Parts},
    response::AppendHeaders,
};
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::{Expr, OnConflict},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    basket::Basket,
    entity::sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as Sessions},
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "foodbee_session";
const SESSION_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBasket {
    pub basket: Basket,
    pub version: i64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> AppResult<Option<StoredBasket>>;

    /// Persist `basket`. `expected` is the version that was loaded, `None`
    /// for a session that did not exist yet. Returns the new version.
    async fn save(&self, id: Uuid, basket: &Basket, expected: Option<i64>) -> AppResult<i64>;
}

fn conflict() -> AppError {
    AppError::Conflict("basket was changed by another request, please retry".into())
}

#[derive(Debug, Clone)]
pub struct OrmSessionStore {
    orm: DatabaseConnection,
}

impl OrmSessionStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl SessionStore for OrmSessionStore {
    async fn load(&self, id: Uuid) -> AppResult<Option<StoredBasket>> {
        let Some(row) = Sessions::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        // A corrupt basket is dropped rather than blocking the session.
        let basket = serde_json::from_value(row.basket).unwrap_or_else(|err| {
            tracing::warn!(session_id = %id, error = %err, "discarding unreadable basket");
            Basket::new()
        });
        Ok(Some(StoredBasket {
            basket,
            version: row.version,
        }))
    }

    async fn save(&self, id: Uuid, basket: &Basket, expected: Option<i64>) -> AppResult<i64> {
        let json = serde_json::to_value(basket).map_err(anyhow::Error::from)?;
        let now = Utc::now();

        match expected {
            None => {
                let inserted = Sessions::insert(SessionActive {
                    id: Set(id),
                    basket: Set(json),
                    version: Set(1),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                })
                .on_conflict(OnConflict::column(SessionCol::Id).do_nothing().to_owned())
                .exec_without_returning(&self.orm)
                .await?;
                if inserted == 0 {
                    return Err(conflict());
                }
                Ok(1)
            }
            Some(version) => {
                let result = Sessions::update_many()
                    .col_expr(SessionCol::Basket, Expr::value(json))
                    .col_expr(SessionCol::Version, Expr::value(version + 1))
                    .col_expr(SessionCol::UpdatedAt, Expr::value(now))
                    .filter(SessionCol::Id.eq(id))
                    .filter(SessionCol::Version.eq(version))
                    .exec(&self.orm)
                    .await?;
                if result.rows_affected == 0 {
                    return Err(conflict());
                }
                Ok(version + 1)
            }
        }
    }
}

/// Process-local store, used by tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, StoredBasket>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> AppResult<Option<StoredBasket>> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }

    async fn save(&self, id: Uuid, basket: &Basket, expected: Option<i64>) -> AppResult<i64> {
        let mut sessions = self.sessions.lock().await;
        let current = sessions.get(&id).map(|stored| stored.version);
        if current != expected {
            return Err(conflict());
        }
        let version = expected.unwrap_or(0) + 1;
        sessions.insert(
            id,
            StoredBasket {
                basket: basket.clone(),
                version,
            },
        );
        Ok(version)
    }
}

/// Session id taken from the request cookie, if a valid one was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookie(pub Option<Uuid>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());
        Ok(SessionCookie(id))
    }
}

/// The basket of one request, with the bookkeeping needed to write it back.
#[derive(Debug)]
pub struct BasketSession {
    id: Uuid,
    basket: Basket,
    version: Option<i64>,
    modified: bool,
    issued: bool,
}

impl BasketSession {
    /// Load the basket for `cookie`, starting a fresh session when the cookie
    /// is missing or unknown.
    pub async fn load(store: &dyn SessionStore, cookie: SessionCookie) -> AppResult<Self> {
        if let Some(id) = cookie.0 {
            if let Some(stored) = store.load(id).await? {
                return Ok(Self {
                    id,
                    basket: stored.basket,
                    version: Some(stored.version),
                    modified: false,
                    issued: false,
                });
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            basket: Basket::new(),
            version: None,
            modified: false,
            issued: true,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    /// Mutable access marks the session as modified.
    pub fn basket_mut(&mut self) -> &mut Basket {
        self.modified = true;
        &mut self.basket
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Write the basket back if it was touched.
    pub async fn persist(&mut self, store: &dyn SessionStore) -> AppResult<()> {
        if !self.modified {
            return Ok(());
        }
        let version = store.save(self.id, &self.basket, self.version).await?;
        self.version = Some(version);
        self.modified = false;
        tracing::debug!(session_id = %self.id, version, lines = self.basket.len(), "basket saved");
        Ok(())
    }

    /// `Set-Cookie` for sessions created by this request.
    pub fn cookie_headers(&self) -> AppResult<AppendHeaders<Vec<(HeaderName, HeaderValue)>>> {
        if !self.issued {
            return Ok(AppendHeaders(Vec::new()));
        }
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}",
            self.id
        );
        let value = HeaderValue::from_str(&cookie).map_err(anyhow::Error::from)?;
        Ok(AppendHeaders(vec![(header::SET_COOKIE, value)]))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::basket::BasketKey;

    #[tokio::test]
    async fn memory_store_rejects_stale_versions() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, None));

        assert_eq!(store.save(id, &basket, None).await.unwrap(), 1);
        assert_eq!(store.save(id, &basket, Some(1)).await.unwrap(), 2);
        assert!(matches!(
            store.save(id, &basket, Some(1)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            store.save(id, &basket, None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn untouched_session_is_not_written() {
        let store = MemorySessionStore::new();
        let mut session = BasketSession::load(&store, SessionCookie(None)).await.unwrap();

        session.persist(&store).await.unwrap();

        assert!(store.load(session.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn racing_requests_on_one_session_conflict() {
        let store = MemorySessionStore::new();
        let mut first = BasketSession::load(&store, SessionCookie(None)).await.unwrap();
        first.basket_mut().add(BasketKey::new(1, None, None));
        first.persist(&store).await.unwrap();
        let cookie = SessionCookie(Some(first.id()));

        let mut a = BasketSession::load(&store, cookie).await.unwrap();
        let mut b = BasketSession::load(&store, cookie).await.unwrap();
        a.basket_mut().add(BasketKey::new(2, None, None));
        b.basket_mut().clear();

        a.persist(&store).await.unwrap();
        assert!(matches!(b.persist(&store).await, Err(AppError::Conflict(_))));
        let stored = store.load(first.id()).await.unwrap().unwrap();
        assert_eq!(stored.basket.len(), 2);
    }

    #[tokio::test]
    async fn cookie_is_read_from_header() {
        let id = Uuid::new_v4();
        let (mut parts, _) = Request::builder()
            .header(header::COOKIE, format!("theme=dark; {SESSION_COOKIE}={id}"))
            .body(())
            .unwrap()
            .into_parts();

        let cookie = SessionCookie::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(cookie, SessionCookie(Some(id)));
    }

    #[tokio::test]
    async fn new_session_issues_cookie() {
        let store = MemorySessionStore::new();
        let session = BasketSession::load(&store, SessionCookie(Some(Uuid::new_v4())))
            .await
            .unwrap();

        let AppendHeaders(headers) = session.cookie_headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert!(
            headers[0]
                .1
                .to_str()
                .unwrap()
                .starts_with(&format!("{SESSION_COOKIE}={}", session.id()))
        );
    }
}
