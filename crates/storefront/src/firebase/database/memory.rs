//! In-process realtime database for development and tests.
//!
//! The whole tree sits in a `tokio::sync::watch` channel. Every write
//! replaces the tree inside `send_modify`, so a multi-path update is applied
//! under one lock and subscribers never observe half of it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_stream::stream;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::instrument;

use moon_bling_core::PushKey;

use super::{DatabaseError, DbPath, RealtimeDatabase, ValueStream, generate_push_key, tree};

/// In-memory [`RealtimeDatabase`].
#[derive(Clone)]
pub struct MemoryDatabase {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    tree: watch::Sender<Value>,
    unavailable: AtomicBool,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tree(Value::Null)
    }

    /// Create a database holding `tree`.
    #[must_use]
    pub fn with_tree(tree: Value) -> Self {
        let (sender, _) = watch::channel(tree::normalize(tree));
        Self {
            inner: Arc::new(MemoryInner {
                tree: sender,
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Copy of the whole tree.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.tree.borrow().clone()
    }

    /// Make every subsequent operation fail with
    /// [`DatabaseError::Unavailable`] (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(DatabaseError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RealtimeDatabase for MemoryDatabase {
    async fn get(&self, path: &DbPath) -> Result<Value, DatabaseError> {
        self.check_available()?;
        Ok(tree::value_at(&self.inner.tree.borrow(), path.segments()))
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn push(&self, path: &DbPath, value: Value) -> Result<PushKey, DatabaseError> {
        self.check_available()?;
        let key = generate_push_key();
        let target = path.child(key.as_str())?;
        self.inner
            .tree
            .send_modify(|root| tree::set_at(root, target.segments(), value));
        Ok(key)
    }

    #[instrument(skip(self, fields), fields(path = %path))]
    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<(), DatabaseError> {
        self.check_available()?;
        self.inner
            .tree
            .send_modify(|root| tree::merge_at(root, path.segments(), fields));
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn remove(&self, path: &DbPath) -> Result<(), DatabaseError> {
        self.check_available()?;
        self.inner
            .tree
            .send_modify(|root| tree::set_at(root, path.segments(), Value::Null));
        Ok(())
    }

    #[instrument(skip(self, writes), fields(count = writes.len()))]
    async fn update_many(&self, writes: Vec<(DbPath, Value)>) -> Result<(), DatabaseError> {
        self.check_available()?;
        self.inner.tree.send_modify(|root| {
            for (path, value) in writes {
                tree::set_at(root, path.segments(), value);
            }
        });
        Ok(())
    }

    fn subscribe(&self, path: &DbPath) -> ValueStream {
        let mut receiver = self.inner.tree.subscribe();
        let inner = Arc::clone(&self.inner);
        let segments = path.segments().to_vec();

        Box::pin(stream! {
            let mut last: Option<Value> = None;
            loop {
                if inner.unavailable.load(Ordering::SeqCst) {
                    yield Err(DatabaseError::Unavailable);
                    break;
                }

                let current = tree::value_at(&receiver.borrow_and_update(), &segments);
                if last.as_ref() != Some(&current) {
                    last = Some(current.clone());
                    yield Ok(current);
                }

                if receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    fn path(p: &str) -> DbPath {
        DbPath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn test_push_and_get() {
        let db = MemoryDatabase::new();
        let key = db
            .push(&path("carts/u1"), json!({ "name": "Ring", "quantity": 1 }))
            .await
            .unwrap();

        let cart = db.get(&path("carts/u1")).await.unwrap();
        assert_eq!(cart, json!({ key.as_str(): { "name": "Ring", "quantity": 1 } }));
    }

    #[tokio::test]
    async fn test_push_keys_are_ordered() {
        let db = MemoryDatabase::new();
        let first = db.push(&path("carts/u1"), json!({ "n": 1 })).await.unwrap();
        let second = db.push(&path("carts/u1"), json!({ "n": 2 })).await.unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let db = MemoryDatabase::with_tree(json!({
            "carts": { "u1": { "-Na": { "name": "Ring", "quantity": 1 } } }
        }));
        let Value::Object(fields) = json!({ "quantity": 4 }) else {
            unreachable!()
        };
        db.update(&path("carts/u1/-Na"), fields).await.unwrap();
        assert_eq!(
            db.get(&path("carts/u1/-Na")).await.unwrap(),
            json!({ "name": "Ring", "quantity": 4 })
        );
    }

    #[tokio::test]
    async fn test_remove_prunes() {
        let db = MemoryDatabase::with_tree(json!({
            "carts": { "u1": { "-Na": { "name": "Ring" } } }
        }));
        db.remove(&path("carts/u1/-Na")).await.unwrap();
        assert_eq!(db.snapshot(), Value::Null);
    }

    #[tokio::test]
    async fn test_update_many_is_applied_together() {
        let db = MemoryDatabase::with_tree(json!({
            "carts": { "u1": { "-Na": { "name": "Ring" } } }
        }));
        let mut stream = db.subscribe(&DbPath::root());
        let initial = stream.next().await.unwrap().unwrap();
        assert!(initial.get("carts").is_some());

        db.update_many(vec![
            (path("orders/-Nz"), json!({ "status": "Pending" })),
            (path("carts/u1"), Value::Null),
        ])
        .await
        .unwrap();

        // the next observed tree has both writes, never only one
        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next, json!({ "orders": { "-Nz": { "status": "Pending" } } }));
    }

    #[tokio::test]
    async fn test_unavailable_fails_without_writing() {
        let db = MemoryDatabase::new();
        db.set_unavailable(true);
        assert!(matches!(
            db.push(&path("carts/u1"), json!({})).await,
            Err(DatabaseError::Unavailable)
        ));
        assert!(matches!(
            db.update_many(vec![(path("orders/-Nz"), json!(1))]).await,
            Err(DatabaseError::Unavailable)
        ));
        db.set_unavailable(false);
        assert_eq!(db.snapshot(), Value::Null);
    }

    #[tokio::test]
    async fn test_subscribe_yields_current_then_changes() {
        let db = MemoryDatabase::new();
        let mut stream = db.subscribe(&path("carts/u1"));
        assert_eq!(stream.next().await.unwrap().unwrap(), Value::Null);

        let key = db
            .push(&path("carts/u1"), json!({ "name": "Ring" }))
            .await
            .unwrap();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            json!({ key.as_str(): { "name": "Ring" } })
        );

        // writes elsewhere in the tree do not produce an item
        db.push(&path("carts/u2"), json!({ "name": "Chain" }))
            .await
            .unwrap();
        db.remove(&DbPath::cart_item(
            &moon_bling_core::UserId::parse("u1").unwrap(),
            &key,
        ))
        .await
        .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_subscribe_ends_with_error_when_unavailable() {
        let db = MemoryDatabase::new();
        db.set_unavailable(true);
        let mut stream = db.subscribe(&path("carts/u1"));
        assert!(matches!(
            stream.next().await,
            Some(Err(DatabaseError::Unavailable))
        ));
        assert!(stream.next().await.is_none());
    }
}
