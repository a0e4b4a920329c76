//! Shared test doubles for the core integration tests
//!
//! `FakeDrive` is an in-memory remote storage that understands the subset of
//! the query language the use cases emit (name equality, parent membership,
//! folder/non-folder mime filters), pages its results, and records every call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Barrier;

use driveops_core::domain::{ContentKey, RemoteId, ResourceMetadata, StoreRef};
use driveops_core::ports::{
    ByteStream, IContentProvider, IContentSource, IRemoteStorage, ISyncObserver, ListPage,
    ListRequest, Media, RemoteError, RemoteItem, SyncEvent, FOLDER_MIME_TYPE,
};

/// Identifier listings report for the storage root
pub const ROOT_ID: &str = "0AROOTFOLDER";

pub fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

// ============================================================================
// FakeDrive
// ============================================================================

/// A remote call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { query: String, page_token: Option<String> },
    Create { name: String, parents: Vec<String> },
    Update { id: String, sent_parents: bool },
    Delete { id: String },
}

#[derive(Debug, Clone)]
struct StoredItem {
    item: RemoteItem,
    content: Bytes,
}

#[derive(Default)]
struct DriveState {
    items: Vec<StoredItem>,
    next_id: usize,
    calls: Vec<Call>,
    delete_errors: HashMap<String, (u16, String)>,
}

#[derive(Default)]
pub struct FakeDrive {
    state: Mutex<DriveState>,
    upload_gate: Mutex<Option<Arc<Barrier>>>,
}

impl FakeDrive {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every create or update carrying media wait on `barrier`
    pub fn gate_uploads(&self, barrier: Arc<Barrier>) {
        *self.upload_gate.lock().unwrap() = Some(barrier);
    }

    /// Answer deletes of `id` with an API error
    pub fn fail_delete(&self, id: &str, status: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .delete_errors
            .insert(id.to_string(), (status, message.to_string()));
    }

    pub fn seed_folder(&self, name: &str, parent: Option<&str>) -> RemoteId {
        self.seed(name, Some(FOLDER_MIME_TYPE), parent, Bytes::new())
    }

    pub fn seed_file(&self, name: &str, parent: &str, content: &str) -> RemoteId {
        self.seed(
            name,
            Some("text/plain"),
            Some(parent),
            Bytes::from(content.to_string()),
        )
    }

    fn seed(
        &self,
        name: &str,
        mime_type: Option<&str>,
        parent: Option<&str>,
        content: Bytes,
    ) -> RemoteId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let item_id = id(&format!("seed-{}", state.next_id));
        state.items.push(StoredItem {
            item: RemoteItem {
                id: item_id.clone(),
                name: name.to_string(),
                mime_type: mime_type.map(str::to_string),
                parents: vec![id(parent.unwrap_or(ROOT_ID))],
                extra: Default::default(),
            },
            content,
        });
        item_id
    }

    /// Drop an item (and nothing else) behind the engine's back
    pub fn remove(&self, item_id: &RemoteId) {
        self.state
            .lock()
            .unwrap()
            .items
            .retain(|stored| &stored.item.id != item_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    pub fn creates(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { name, parents } => Some((name, parents)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Items named `name` whose parents contain `parent`
    pub fn children_named(&self, parent: &RemoteId, name: &str) -> Vec<RemoteItem> {
        let parent = real_id(parent.as_str());
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|s| s.item.name == name)
            .filter(|s| s.item.parents.iter().any(|p| p.as_str() == parent))
            .map(|s| s.item.clone())
            .collect()
    }

    pub fn item(&self, item_id: &RemoteId) -> Option<RemoteItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|s| &s.item.id == item_id)
            .map(|s| s.item.clone())
    }

    pub fn content(&self, item_id: &RemoteId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|s| &s.item.id == item_id)
            .map(|s| String::from_utf8_lossy(&s.content).into_owned())
    }

    async fn wait_gate(&self, has_media: bool) {
        let gate = self.upload_gate.lock().unwrap().clone();
        if let (Some(gate), true) = (gate, has_media) {
            gate.wait().await;
        }
    }
}

fn real_id(id: &str) -> &str {
    if id == RemoteId::ROOT_ALIAS {
        ROOT_ID
    } else {
        id
    }
}

/// Read the quoted literal starting at `s[0] == '\''`
fn read_literal(s: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = s.strip_prefix('\'')?.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '\'' => return Some(out),
            c => out.push(c),
        }
    }
    None
}

#[derive(Debug, Default)]
struct Filter {
    name: Option<String>,
    parents: Vec<String>,
    folders_only: bool,
    files_only: bool,
}

impl Filter {
    fn parse(query: &str) -> Self {
        let mut filter = Filter {
            folders_only: query.contains(&format!("mimeType='{FOLDER_MIME_TYPE}'")),
            files_only: query.contains(&format!("mimeType != '{FOLDER_MIME_TYPE}'")),
            ..Filter::default()
        };
        if let Some(pos) = query.find("name = ") {
            filter.name = read_literal(&query[pos + "name = ".len()..]);
        }
        let mut rest = query;
        while let Some(pos) = rest.find(" in parents") {
            let head = &rest[..pos];
            if let Some(open) = head[..head.len().saturating_sub(1)].rfind('\'') {
                if let Some(parent) = read_literal(&head[open..]) {
                    filter.parents.push(real_id(&parent).to_string());
                }
            }
            rest = &rest[pos + " in parents".len()..];
        }
        filter
    }

    fn matches(&self, item: &RemoteItem) -> bool {
        if self.folders_only && !item.is_folder() {
            return false;
        }
        if self.files_only && item.is_folder() {
            return false;
        }
        if let Some(name) = &self.name {
            if &item.name != name {
                return false;
            }
        }
        self.parents.is_empty()
            || item
                .parents
                .iter()
                .any(|p| self.parents.iter().any(|q| q == p.as_str()))
    }
}

#[async_trait]
impl IRemoteStorage for FakeDrive {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            query: request.query.clone(),
            page_token: request.page_token.clone(),
        });

        let filter = Filter::parse(&request.query);
        let matching: Vec<RemoteItem> = state
            .items
            .iter()
            .filter(|s| filter.matches(&s.item))
            .map(|s| s.item.clone())
            .collect();

        let offset: usize = request
            .page_token
            .as_deref()
            .and_then(|t| t.strip_prefix("off:"))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let size = request.page_size.max(1) as usize;
        let items: Vec<RemoteItem> = matching.iter().skip(offset).take(size).cloned().collect();
        let next_page_token =
            (offset + size < matching.len()).then(|| format!("off:{}", offset + size));

        Ok(ListPage {
            items,
            next_page_token,
        })
    }

    async fn create(
        &self,
        resource: ResourceMetadata,
        media: Option<Media>,
        _fields: &str,
    ) -> Result<RemoteItem, RemoteError> {
        let parents: Vec<String> = resource
            .parents()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        let name = resource.name().unwrap_or_default().to_string();
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Create {
                name: name.clone(),
                parents: parents.clone(),
            });
        }

        self.wait_gate(media.is_some()).await;
        let (mime_type, content) = match media {
            Some(media) => {
                let mime = media.mime_type.clone();
                let bytes = media
                    .into_bytes()
                    .await
                    .map_err(|e| RemoteError::Transport(Box::new(e)))?;
                (mime, Bytes::from(bytes))
            }
            None => (None, Bytes::new()),
        };

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let item = RemoteItem {
            id: id(&format!("new-{}", state.next_id)),
            name,
            mime_type: resource.mime_type().map(str::to_string).or(mime_type),
            parents: if parents.is_empty() {
                vec![id(ROOT_ID)]
            } else {
                parents.iter().map(|p| id(real_id(p))).collect()
            },
            extra: Default::default(),
        };
        state.items.push(StoredItem {
            item: item.clone(),
            content,
        });
        Ok(item)
    }

    async fn update(
        &self,
        item_id: &RemoteId,
        resource: ResourceMetadata,
        media: Option<Media>,
        _fields: &str,
    ) -> Result<RemoteItem, RemoteError> {
        self.state.lock().unwrap().calls.push(Call::Update {
            id: item_id.to_string(),
            sent_parents: resource.get("parents").is_some(),
        });

        self.wait_gate(media.is_some()).await;
        let content = match media {
            Some(media) => Some(Bytes::from(
                media
                    .into_bytes()
                    .await
                    .map_err(|e| RemoteError::Transport(Box::new(e)))?,
            )),
            None => None,
        };

        let mut state = self.state.lock().unwrap();
        let stored = state
            .items
            .iter_mut()
            .find(|s| &s.item.id == item_id)
            .ok_or_else(|| RemoteError::api(404, format!("File not found: {item_id}.")))?;
        if let Some(name) = resource.name() {
            stored.item.name = name.to_string();
        }
        if let Some(content) = content {
            stored.content = content;
        }
        Ok(stored.item.clone())
    }

    async fn delete(&self, item_id: &RemoteId) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete {
            id: item_id.to_string(),
        });
        if let Some((status, message)) = state.delete_errors.get(item_id.as_str()) {
            return Err(RemoteError::api(*status, message.clone()));
        }

        let before = state.items.len();
        let mut doomed = vec![item_id.clone()];
        while let Some(current) = doomed.pop() {
            let children: Vec<RemoteId> = state
                .items
                .iter()
                .filter(|s| s.item.parents.contains(&current))
                .map(|s| s.item.id.clone())
                .collect();
            doomed.extend(children);
            state.items.retain(|s| s.item.id != current);
        }
        if state.items.len() == before {
            return Err(RemoteError::api(404, format!("File not found: {item_id}.")));
        }
        Ok(())
    }
}

// ============================================================================
// FakeContent
// ============================================================================

/// In-memory keyed blob stores: store id -> key -> (file name, bytes)
#[derive(Default)]
pub struct FakeContent {
    stores: HashMap<String, HashMap<String, (String, String)>>,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, store: &str, key: &str, file_name: &str, body: &str) -> Self {
        self.stores
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), (file_name.to_string(), body.to_string()));
        self
    }

    pub fn with_store(mut self, store: &str) -> Self {
        self.stores.entry(store.to_string()).or_default();
        self
    }
}

struct FakeStore {
    entries: HashMap<String, (String, String)>,
}

#[async_trait]
impl IContentProvider for FakeStore {
    async fn byte_stream(&self, key: &ContentKey) -> anyhow::Result<ByteStream> {
        let (_, body) = self
            .entries
            .get(key.as_str())
            .ok_or_else(|| anyhow::anyhow!("key '{key}' not found"))?;
        Ok(Media::from_bytes(None, body.clone()).body)
    }

    fn display_name(&self, key: &ContentKey) -> String {
        self.entries
            .get(key.as_str())
            .map_or_else(|| key.to_string(), |(name, _)| name.clone())
    }
}

#[async_trait]
impl IContentSource for FakeContent {
    async fn open(&self, store: &StoreRef) -> anyhow::Result<Arc<dyn IContentProvider>> {
        let entries = self
            .stores
            .get(&store.id)
            .ok_or_else(|| anyhow::anyhow!("store '{}' does not exist", store.id))?;
        Ok(Arc::new(FakeStore {
            entries: entries.clone(),
        }))
    }
}

// ============================================================================
// Recorder
// ============================================================================

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<SyncEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ISyncObserver for Recorder {
    fn notify(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
