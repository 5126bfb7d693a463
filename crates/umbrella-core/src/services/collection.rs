//! Cached CRUD service shared by every collection
//!
//! Each service owns a local copy of its collection and is the only writer
//! of it. The cache changes only after the backend confirms an operation;
//! a failed call leaves it exactly as it was.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::api::Backend;
use crate::error::{Error, Operation, Result};
use crate::transform::{decode_item, decode_list, ids_match, FromPayload};

/// A remote collection the service layer can synchronize
pub trait Resource: FromPayload + Clone + Send + Sync + 'static {
    /// Collection path relative to the API base, e.g. `/plannings`
    const PATH: &'static str;
    /// Tag used in log lines
    const LOG_TAG: &'static str;
    /// French complement for one record in user messages ("du planning")
    const OF_ONE: &'static str;
    /// French complement for the collection ("des plannings")
    const OF_MANY: &'static str;
    /// Newly created records go first instead of last
    const PREPEND_ON_CREATE: bool = false;

    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    fn id_key(&self) -> String;

    fn update_method() -> Method {
        Method::PUT
    }
}

/// Result of a list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The collection was replaced with this many records
    Loaded(usize),
    /// Another fetch was already running; nothing was done
    Skipped,
}

#[derive(Debug)]
struct CollectionState<R> {
    items: Vec<R>,
    selected: Option<R>,
    last_error: Option<String>,
}

impl<R> Default for CollectionState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            last_error: None,
        }
    }
}

/// Resets the in-flight flag when the fetch finishes or is dropped
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct CollectionService<R: Resource> {
    backend: Arc<dyn Backend>,
    state: RwLock<CollectionState<R>>,
    loading: AtomicBool,
}

impl<R: Resource> CollectionService<R> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: RwLock::new(CollectionState::default()),
            loading: AtomicBool::new(false),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    fn item_path(id: &str) -> String {
        format!("{}/{}", R::PATH, id)
    }

    /// Generic notification text for a failed operation
    fn fallback_message(operation: Operation) -> String {
        let complement = match operation {
            Operation::List => R::OF_MANY,
            _ => R::OF_ONE,
        };
        format!("Erreur lors de {} {}", operation.verb(), complement)
    }

    /// Record and log a failure, returning the error to surface
    pub(crate) async fn fail(&self, operation: Operation, source: Error) -> Error {
        let err = Error::operation(operation, Self::fallback_message(operation), source);
        log::error!(
            "[{}] {} failed: {}",
            R::LOG_TAG,
            operation,
            match &err {
                Error::Operation { source, .. } => source.to_string(),
                other => other.to_string(),
            }
        );
        self.state.write().await.last_error = Some(err.user_message());
        err
    }

    /// Replace the cached collection with the server's list.
    ///
    /// A call made while another fetch is in flight is skipped, not queued.
    pub async fn fetch_all(&self) -> Result<FetchOutcome> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("[{}] fetch already in progress, skipping", R::LOG_TAG);
            return Ok(FetchOutcome::Skipped);
        }
        let _guard = LoadingGuard(&self.loading);

        match self.backend.get(R::PATH).await {
            Ok(body) => {
                let items: Vec<R> = decode_list(body);
                let count = items.len();
                let mut state = self.state.write().await;
                state.items = items;
                state.last_error = None;
                log::debug!("[{}] loaded {} record(s)", R::LOG_TAG, count);
                Ok(FetchOutcome::Loaded(count))
            }
            Err(e) => Err(self.fail(Operation::List, e).await),
        }
    }

    /// Fetch one record and make it the selected one
    pub async fn fetch_one(&self, id: impl fmt::Display) -> Result<R> {
        let id = id.to_string();
        let fetched = match self.backend.get(&Self::item_path(&id)).await {
            Ok(body) => decode_item::<R>(body),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(item) => {
                self.state.write().await.selected = Some(item.clone());
                Ok(item)
            }
            Err(e) => Err(self.fail(Operation::Get, e).await),
        }
    }

    /// Create a record; the server's version is added to the cache
    pub async fn create(&self, payload: &R::Create) -> Result<R> {
        let created = match serde_json::to_value(payload) {
            Ok(body) => match self.backend.post(R::PATH, body).await {
                Ok(response) => decode_item::<R>(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e.into()),
        };

        match created {
            Ok(item) => {
                let mut state = self.state.write().await;
                if R::PREPEND_ON_CREATE {
                    state.items.insert(0, item.clone());
                } else {
                    state.items.push(item.clone());
                }
                log::info!("[{}] created #{}", R::LOG_TAG, item.id_key());
                Ok(item)
            }
            Err(e) => Err(self.fail(Operation::Create, e).await),
        }
    }

    /// Apply a patch; the cached entry (and selection) take the server's version
    pub async fn update(&self, id: impl fmt::Display, patch: &R::Update) -> Result<R> {
        let id = id.to_string();
        let updated = match serde_json::to_value(patch) {
            Ok(body) => match self
                .backend
                .send(R::update_method(), &Self::item_path(&id), Some(body))
                .await
            {
                Ok(response) => decode_item::<R>(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e.into()),
        };

        match updated {
            Ok(item) => {
                self.replace_cached(&id, item.clone()).await;
                log::info!("[{}] updated #{}", R::LOG_TAG, id);
                Ok(item)
            }
            Err(e) => Err(self.fail(Operation::Update, e).await),
        }
    }

    /// Delete a record; it leaves the cache and the selection
    pub async fn delete(&self, id: impl fmt::Display) -> Result<()> {
        let id = id.to_string();
        if let Err(e) = self.backend.delete(&Self::item_path(&id)).await {
            return Err(self.fail(Operation::Delete, e).await);
        }

        let mut state = self.state.write().await;
        state.items.retain(|item| !ids_match(&item.id_key(), &id));
        if state
            .selected
            .as_ref()
            .is_some_and(|s| ids_match(&s.id_key(), &id))
        {
            state.selected = None;
        }
        log::info!("[{}] deleted #{}", R::LOG_TAG, id);
        Ok(())
    }

    /// Swap the cached entry with `id` for `item`, keeping a single entry per id
    pub(crate) async fn replace_cached(&self, id: &str, item: R) {
        let mut state = self.state.write().await;
        let mut replaced = false;
        state.items.retain_mut(|existing| {
            if !ids_match(&existing.id_key(), id) {
                return true;
            }
            if replaced {
                return false;
            }
            *existing = item.clone();
            replaced = true;
            true
        });
        if state
            .selected
            .as_ref()
            .is_some_and(|s| ids_match(&s.id_key(), id))
        {
            state.selected = Some(item);
        }
    }

    /// Run a request that does not touch the cache, decoding a list response
    pub(crate) async fn query_list<T: FromPayload>(&self, path: &str) -> Result<Vec<T>> {
        match self.backend.get(path).await {
            Ok(body) => Ok(decode_list(body)),
            Err(e) => Err(self.fail(Operation::List, e).await),
        }
    }

    /// Run a request that does not touch the cache, returning the raw body
    pub(crate) async fn query_raw(&self, path: &str) -> Result<Value> {
        match self.backend.get(path).await {
            Ok(body) => Ok(crate::transform::unwrap_item(body)),
            Err(e) => Err(self.fail(Operation::Get, e).await),
        }
    }

    pub async fn items(&self) -> Vec<R> {
        self.state.read().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    pub async fn find(&self, id: impl fmt::Display) -> Option<R> {
        let id = id.to_string();
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|item| ids_match(&item.id_key(), &id))
            .cloned()
    }

    pub async fn selected(&self) -> Option<R> {
        self.state.read().await.selected.clone()
    }

    pub async fn select(&self, item: Option<R>) {
        self.state.write().await.selected = item;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Message of the last failed operation, for display
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    /// Drop all cached state (logout)
    pub async fn reset(&self) {
        *self.state.write().await = CollectionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Planning, UpdatePlanning};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Replays canned responses in order and records every request
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<Value>>>,
        requests: Mutex<Vec<(Method, String, Option<Value>)>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedBackend {
        fn with(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((method, path.to_string(), body));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    fn planning_json(id: i64, date: &str) -> Value {
        json!({
            "id": id,
            "site_id": 3,
            "date": date,
            "shifts": { "MORNING": { "agents": [ { "agent_id": 1, "status": "WORKED" } ] } },
            "created_by": 1
        })
    }

    fn network_error() -> Error {
        Error::Api {
            status: 503,
            message: None,
        }
    }

    async fn loaded(responses: Vec<Result<Value>>) -> (CollectionService<Planning>, Arc<ScriptedBackend>) {
        let mut all = vec![Ok(json!({ "data": [
            planning_json(1, "2026-10-17"),
            planning_json(5, "2026-10-18")
        ]}))];
        all.extend(responses);
        let backend = Arc::new(ScriptedBackend::with(all));
        let service = CollectionService::<Planning>::new(backend.clone());
        assert_eq!(service.fetch_all().await.unwrap(), FetchOutcome::Loaded(2));
        (service, backend)
    }

    #[tokio::test]
    async fn test_list_accepts_envelope_and_bare_array() {
        let backend = Arc::new(ScriptedBackend::with(vec![
            Ok(json!({ "data": [planning_json(1, "2026-10-18")] })),
            Ok(json!([planning_json(1, "2026-10-18")])),
        ]));
        let service = CollectionService::<Planning>::new(backend);

        service.fetch_all().await.unwrap();
        let from_envelope = service.items().await;
        service.fetch_all().await.unwrap();
        let from_array = service.items().await;

        assert_eq!(from_envelope.len(), 1);
        assert_eq!(from_envelope[0].id, 1);
        assert_eq!(from_envelope, from_array);
    }

    #[tokio::test]
    async fn test_non_array_list_yields_empty_collection() {
        let backend = Arc::new(ScriptedBackend::with(vec![Ok(json!({ "message": "ok" }))]));
        let service = CollectionService::<Planning>::new(backend);
        assert_eq!(service.fetch_all().await.unwrap(), FetchOutcome::Loaded(0));
        assert!(service.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_fetch_is_skipped() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            responses: Mutex::new(vec![Ok(json!([planning_json(1, "2026-10-18")]))].into()),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let service = Arc::new(CollectionService::<Planning>::new(backend.clone()));

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.fetch_all().await })
        };
        while !service.is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(service.fetch_all().await.unwrap(), FetchOutcome::Skipped);
        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Loaded(1));
        assert_eq!(backend.request_count(), 1);
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn test_create_appends_server_record() {
        let (service, backend) = loaded(vec![Ok(json!({ "data": planning_json(9, "2026-10-19") }))]).await;
        let draft = crate::models::CreatePlanning {
            site_id: 3,
            date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            shifts: Default::default(),
            created_by: 1,
        };

        let created = service.create(&draft).await.unwrap();
        assert_eq!(created.id, 9);
        let ids: Vec<i64> = service.items().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 5, 9]);

        let requests = backend.requests.lock().unwrap();
        let (method, path, body) = requests.last().unwrap();
        assert_eq!(*method, Method::POST);
        assert_eq!(path, "/plannings");
        assert_eq!(body.as_ref().unwrap()["date"], "2026-10-19");
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cache_and_reports() {
        let (service, _) = loaded(vec![Err(network_error())]).await;
        let before = service.items().await;
        let draft = crate::models::CreatePlanning {
            site_id: 3,
            date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            shifts: Default::default(),
            created_by: 1,
        };

        let err = service.create(&draft).await.unwrap_err();
        assert_eq!(err.user_message(), "Erreur lors de la création du planning");
        assert_eq!(service.items().await, before);
        assert_eq!(
            service.last_error().await.as_deref(),
            Some("Erreur lors de la création du planning")
        );

        service.clear_error().await;
        assert!(service.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_sequential_updates_keep_only_successful_one() {
        let (service, backend) = loaded(vec![
            Ok(planning_json(5, "2026-11-01")),
            Err(network_error()),
        ])
        .await;
        service.select(service.find(5).await).await;

        let first = UpdatePlanning {
            date: chrono::NaiveDate::from_ymd_opt(2026, 11, 1),
            ..Default::default()
        };
        service.update(5, &first).await.unwrap();
        let after_first = service.items().await;

        let second = UpdatePlanning {
            date: chrono::NaiveDate::from_ymd_opt(2026, 12, 25),
            ..Default::default()
        };
        let err = service.update("5", &second).await.unwrap_err();
        assert_eq!(err.user_message(), "Erreur lors de la mise à jour du planning");

        let items = service.items().await;
        assert_eq!(items, after_first);
        assert_eq!(items.iter().filter(|p| p.id == 5).count(), 1);
        assert_eq!(service.find(5).await.unwrap().date.to_string(), "2026-11-01");
        assert_eq!(service.selected().await.unwrap().date.to_string(), "2026-11-01");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[1].0, Method::PUT);
        assert_eq!(requests[1].1, "/plannings/5");
    }

    #[tokio::test]
    async fn test_server_message_wins_over_generic_text() {
        let (service, _) = loaded(vec![Err(Error::Api {
            status: 422,
            message: Some("Ce planning existe déjà".to_string()),
        })])
        .await;
        let err = service
            .update(1, &UpdatePlanning::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Ce planning existe déjà");
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_selection() {
        let (service, _) = loaded(vec![Ok(Value::Null)]).await;
        service.select(service.find("5").await).await;

        service.delete(5).await.unwrap();
        assert!(service.find(5).await.is_none());
        assert_eq!(service.len().await, 1);
        assert!(service.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_entry() {
        let (service, _) = loaded(vec![Err(network_error())]).await;
        let err = service.delete(1).await.unwrap_err();
        assert_eq!(err.user_message(), "Erreur lors de la suppression du planning");
        assert_eq!(service.len().await, 2);
    }

    #[tokio::test]
    async fn test_fetch_one_selects_record() {
        let (service, _) = loaded(vec![Ok(json!({ "data": planning_json(5, "2026-10-18") }))]).await;
        let planning = service.fetch_one(5).await.unwrap();
        assert_eq!(service.selected().await, Some(planning));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (service, _) = loaded(vec![]).await;
        service.reset().await;
        assert!(service.is_empty().await);
        assert!(service.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_visible_through_wrapper() {
        let (service, _) = loaded(vec![Err(Error::Unauthorized("expired".to_string()))]).await;
        let err = service.fetch_all().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(service.len().await, 2);
    }
}
