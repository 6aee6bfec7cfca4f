use crate::models::{Session, SessionStage};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("session is {actual:?}, expected {expected:?}")]
    WrongStage {
        expected: SessionStage,
        actual: SessionStage,
    },
}

/// 校验会话当前阶段
pub fn expect_stage(session: &Session, expected: SessionStage) -> Result<(), SessionError> {
    if session.stage == expected {
        Ok(())
    } else {
        Err(SessionError::WrongStage {
            expected,
            actual: session.stage,
        })
    }
}

/// 会话存储 (由传输层持有并注入)
pub trait SessionStore: Send + Sync {
    fn create(&self) -> Session;

    /// 返回会话快照, 已过期的会话视为不存在
    fn get(&self, id: Uuid) -> Option<Session>;

    /// 在锁内修改会话; `f` 返回错误时不保存修改
    fn update(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut Session) -> Result<(), SessionError>,
    ) -> Result<Session, SessionError>;

    fn remove(&self, id: Uuid) -> bool;

    /// 清理过期会话, 返回清理数量
    fn evict_expired(&self) -> usize;
}

/// 内存会话存储, 按空闲时间过期
pub struct MemorySessionStore {
    sessions: DashMap<Uuid, Session>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, session: &Session) -> bool {
        Utc::now() - session.touched_at > self.ttl
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> Session {
        let session = Session::new();
        self.sessions.insert(session.id, session.clone());
        tracing::info!("Session {} created", session.id);
        session
    }

    fn get(&self, id: Uuid) -> Option<Session> {
        let session = self.sessions.get(&id).map(|s| s.clone())?;
        if self.is_expired(&session) {
            self.sessions.remove(&id);
            return None;
        }
        Some(session)
    }

    fn update(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut Session) -> Result<(), SessionError>,
    ) -> Result<Session, SessionError> {
        let expired = match self.sessions.get_mut(&id) {
            None => return Err(SessionError::NotFound(id)),
            Some(mut entry) => {
                if self.is_expired(&entry) {
                    true
                } else {
                    let mut draft = entry.clone();
                    f(&mut draft)?;
                    draft.touch();
                    *entry = draft.clone();
                    return Ok(draft);
                }
            }
        };
        if expired {
            self.sessions.remove(&id);
        }
        Err(SessionError::NotFound(id))
    }

    fn remove(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    fn evict_expired(&self) -> usize {
        let before = self.sessions.len();
        let now = Utc::now();
        self.sessions.retain(|_, s| now - s.touched_at <= self.ttl);
        before.saturating_sub(self.sessions.len())
    }
}

/// 处理中的会话守卫: 未 disarm 就被丢弃时 (请求取消或处理失败) 把会话重置到初始阶段
pub struct ProcessingGuard {
    store: Arc<dyn SessionStore>,
    id: Uuid,
    armed: bool,
}

impl ProcessingGuard {
    pub fn new(store: Arc<dyn SessionStore>, id: Uuid) -> Self {
        Self {
            store,
            id,
            armed: true,
        }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // 会话可能已过期, 忽略 NotFound
        let reset = self.store.update(self.id, &mut |s| {
            expect_stage(s, SessionStage::Processing)?;
            s.reset();
            Ok(())
        });
        if reset.is_ok() {
            tracing::warn!("Session {} reset after interrupted processing", self.id);
        }
    }
}

/// 后台定期清理过期会话
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired();
            if evicted > 0 {
                tracing::info!("Evicted {} expired sessions", evicted);
            }
        }
    })
}
