//! Gallery store: ordered list of saved results, newest first.
//!
//! Every mutation is a whole-list read-modify-write: the new list is built, handed to the
//! backend, and only committed in memory once the backend accepted it. The persisted list
//! and [`GalleryStore::items`] are therefore identical after every call, successful or not.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::GalleryError;
use crate::types::{AspectRatio, GalleryItem};

/// Storage key of the serialized gallery list.
pub const GALLERY_KEY: &str = "studio_gallery";

/// Key-value persistence for the whole gallery collection.
pub trait GalleryBackend: Send {
    /// Missing key loads as an empty list.
    fn load(&self) -> Result<Vec<GalleryItem>, GalleryError>;
    fn save(&self, items: &[GalleryItem]) -> Result<(), GalleryError>;
    /// Drops the persisted key entirely.
    fn remove(&self) -> Result<(), GalleryError>;
}

/// In-process storage holding the serialized list, like a browser storage slot.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw persisted JSON, `None` when the key is absent.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl GalleryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<GalleryItem>, GalleryError> {
        let slot = self.slot.lock().map_err(|_| GalleryError::Poisoned)?;
        match slot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, items: &[GalleryItem]) -> Result<(), GalleryError> {
        let json = serde_json::to_string(items)?;
        *self.slot.lock().map_err(|_| GalleryError::Poisoned)? = Some(json);
        Ok(())
    }

    fn remove(&self) -> Result<(), GalleryError> {
        *self.slot.lock().map_err(|_| GalleryError::Poisoned)? = None;
        Ok(())
    }
}

/// One JSON file per storage key. Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/studio_gallery.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", GALLERY_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GalleryBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<GalleryItem>, GalleryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, items: &[GalleryItem]) -> Result<(), GalleryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), GalleryError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Sled-backed storage: the list lives under [`GALLERY_KEY`] in the default tree.
/// Clones share the same database handle.
#[derive(Clone)]
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GalleryError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl GalleryBackend for SledBackend {
    fn load(&self) -> Result<Vec<GalleryItem>, GalleryError> {
        match self.db.get(GALLERY_KEY.as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, items: &[GalleryItem]) -> Result<(), GalleryError> {
        let bytes = serde_json::to_vec(items)?;
        self.db.insert(GALLERY_KEY.as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self) -> Result<(), GalleryError> {
        self.db.remove(GALLERY_KEY.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

pub struct GalleryStore {
    backend: Box<dyn GalleryBackend>,
    items: Vec<GalleryItem>,
    last_id: i64,
}

impl GalleryStore {
    /// Loads the persisted list from `backend`.
    pub fn open(backend: impl GalleryBackend + 'static) -> Result<Self, GalleryError> {
        let items = backend.load()?;
        let last_id = items
            .iter()
            .filter_map(|i| i.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        tracing::debug!(items = items.len(), "gallery: loaded");
        Ok(Self {
            backend: Box::new(backend),
            items,
            last_id,
        })
    }

    /// Newest first.
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GalleryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Millisecond timestamp, bumped past the last issued id when the clock has not moved.
    pub fn next_id(&mut self) -> String {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    /// Builds an item with a fresh id; it is not stored until [`GalleryStore::append`].
    pub fn new_item(
        &mut self,
        image_url: &str,
        style: &str,
        aspect_ratio: AspectRatio,
        concept: &str,
        created_at: DateTime<Utc>,
    ) -> GalleryItem {
        GalleryItem {
            id: self.next_id(),
            image_url: image_url.to_string(),
            style: style.to_string(),
            aspect_ratio,
            concept: concept.to_string(),
            created_at,
        }
    }

    pub fn append(&mut self, item: GalleryItem) -> Result<(), GalleryError> {
        if self.get(&item.id).is_some() {
            return Err(GalleryError::DuplicateId(item.id));
        }
        if let Ok(n) = item.id.parse::<i64>() {
            self.last_id = self.last_id.max(n);
        }
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(item);
        next.extend(self.items.iter().cloned());
        self.commit(next)
    }

    /// Returns whether an item was removed. The list is persisted either way.
    pub fn remove_by_id(&mut self, id: &str) -> Result<bool, GalleryError> {
        let next: Vec<GalleryItem> = self.items.iter().filter(|i| i.id != id).cloned().collect();
        let removed = next.len() != self.items.len();
        self.commit(next)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), GalleryError> {
        self.backend.remove()?;
        self.items.clear();
        tracing::info!("gallery: cleared");
        Ok(())
    }

    fn commit(&mut self, next: Vec<GalleryItem>) -> Result<(), GalleryError> {
        self.backend.save(&next)?;
        self.items = next;
        Ok(())
    }
}
