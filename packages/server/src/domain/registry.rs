//! Connection Registry
//!
//! ブロードキャスト・プローブの配信対象となる接続の集合です。
//! 集合の変更（add / remove）と、配信を伴う走査（for_each / for_each_except）は
//! すべて単一の排他ロックの下で実行されます。
//!
//! ## 既知の制約
//!
//! 走査中はロックを保持したまま各接続への書き込みを await します。
//! そのため、応答の遅い接続が 1 つあると、その書き込みが完了するか失敗するまで
//! 他の接続への配信・新規接続の登録・切断処理がすべて待たされます。
//! 接続ごとの送信キューに分割すれば解消できますが、低速な接続がいる場合の
//! 観測可能な挙動が変わるため、この単純なロック設計を維持しています。
//!
//! ## 所有権
//!
//! エントリを取り除いた側（`remove` で `Some` を受け取った側、または走査中に
//! `Visit::Evict` を返した走査）だけが接続を close します。エントリは一度しか
//! 取り除けないので、close と登録解除はどの経路でもちょうど一度だけ実行されます。

use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::Mutex;

use super::{Connection, ConnectionId};

/// Outcome of visiting one member during a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    /// Remove the member from the registry and close it.
    Evict,
}

/// The authoritative set of connections eligible for broadcast and probe traffic.
#[derive(Default)]
pub struct ConnectionRegistry {
    members: Mutex<HashMap<ConnectionId, Arc<dyn Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// Returns `false` and leaves the registry untouched when a connection with
    /// the same id is already registered.
    pub async fn add(&self, connection: Arc<dyn Connection>) -> bool {
        let id = connection.id();
        let mut members = self.members.lock().await;
        if members.contains_key(&id) {
            tracing::debug!("Connection '{}' is already registered", id);
            return false;
        }
        members.insert(id, connection);
        tracing::debug!("Connection '{}' registered ({} total)", id, members.len());
        true
    }

    /// Deregister a connection.
    ///
    /// The caller receiving `Some` owns the returned handle and is responsible
    /// for closing it.
    pub async fn remove(&self, id: &ConnectionId) -> Option<Arc<dyn Connection>> {
        let mut members = self.members.lock().await;
        let removed = members.remove(id);
        if removed.is_some() {
            tracing::debug!("Connection '{}' deregistered ({} left)", id, members.len());
        }
        removed
    }

    /// Visit every registered connection under the lock.
    ///
    /// Returns the ids of the connections evicted during this traversal.
    pub async fn for_each<F, Fut>(&self, visit: F) -> Vec<ConnectionId>
    where
        F: FnMut(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = Visit>,
    {
        self.traverse(None, visit).await
    }

    /// Visit every registered connection except `excluded` under the lock.
    ///
    /// Returns the ids of the connections evicted during this traversal.
    pub async fn for_each_except<F, Fut>(
        &self,
        excluded: &ConnectionId,
        visit: F,
    ) -> Vec<ConnectionId>
    where
        F: FnMut(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = Visit>,
    {
        self.traverse(Some(*excluded), visit).await
    }

    async fn traverse<F, Fut>(
        &self,
        excluded: Option<ConnectionId>,
        mut visit: F,
    ) -> Vec<ConnectionId>
    where
        F: FnMut(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = Visit>,
    {
        let mut members = self.members.lock().await;

        // Snapshot the targets so members can be removed while iterating.
        let targets: Vec<(ConnectionId, Arc<dyn Connection>)> = members
            .iter()
            .filter(|(id, _)| Some(**id) != excluded)
            .map(|(id, connection)| (*id, connection.clone()))
            .collect();

        let mut evicted = Vec::new();
        for (id, connection) in targets {
            if visit(connection).await == Visit::Evict
                && let Some(connection) = members.remove(&id)
            {
                connection.close().await;
                evicted.push(id);
            }
        }
        evicted
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.members.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    /// Ids of all registered connections, sorted.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        let members = self.members.lock().await;
        let mut ids: Vec<ConnectionId> = members.keys().copied().collect();
        ids.sort();
        ids
    }
}
