//! Object storage for candidate photos and supporting documents.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::entities::{AccessResult, ValidationError};
use crate::store::StoreError;

pub const CANDIDATE_IMAGE_FOLDER: &str = "candidates";
pub const DEFAULT_DOCUMENT_FOLDER: &str = "documents";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectHandle {
    pub bucket: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectHandle, StoreError>;

    async fn download_url(&self, handle: &ObjectHandle) -> Result<String, StoreError>;
}

/// Bucket held in process memory; download URLs use the `memory://` scheme.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    bucket: String,
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectHandle, StoreError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))?;
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(ObjectHandle {
            bucket: self.bucket.clone(),
            path: path.to_string(),
        })
    }

    async fn download_url(&self, handle: &ObjectHandle) -> Result<String, StoreError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| StoreError::Unavailable("object store lock poisoned".to_string()))?;
        if handle.bucket != self.bucket || !objects.contains_key(&handle.path) {
            return Err(StoreError::MissingObject(handle.path.clone()));
        }
        Ok(format!("memory://{}/{}", handle.bucket, handle.path))
    }
}

/// Writes uploads under timestamped paths and hands back their download URLs.
pub struct Uploader<O> {
    store: Arc<O>,
}

impl<O> Clone for Uploader<O> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// Final path segment of a client-supplied file name.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

impl<O: ObjectStore> Uploader<O> {
    pub fn new(store: Arc<O>) -> Self {
        Self { store }
    }

    /// Store a profile photo under `candidates/<millis>_<name>`.
    pub async fn upload_candidate_image(&self, file_name: &str, bytes: Vec<u8>) -> AccessResult<String> {
        self.upload_into(CANDIDATE_IMAGE_FOLDER, file_name, bytes).await
    }

    /// Store a supporting document under `<folder>/<millis>_<name>`; a blank folder
    /// means `documents`.
    pub async fn upload_document(
        &self,
        folder: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AccessResult<String> {
        let folder = folder
            .map(|folder| folder.trim().trim_matches('/'))
            .filter(|folder| !folder.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_FOLDER);
        self.upload_into(folder, file_name, bytes).await
    }

    async fn upload_into(&self, folder: &str, file_name: &str, bytes: Vec<u8>) -> AccessResult<String> {
        let name = base_name(file_name);
        if name.is_empty() {
            return Err(ValidationError::MissingField("fileName").into());
        }
        if bytes.is_empty() {
            return Err(ValidationError::MissingField("file").into());
        }

        let path = format!("{folder}/{}_{name}", Utc::now().timestamp_millis());
        let content_type = mime_guess::from_path(name).first_or_octet_stream();
        let size = bytes.len();
        let handle = self
            .store
            .upload(&path, bytes, content_type.essence_str())
            .await?;
        let url = self.store.download_url(&handle).await?;
        info!(path = %handle.path, size, "object uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AccessError;

    #[tokio::test]
    async fn candidate_images_land_under_a_timestamped_path() {
        let store = Arc::new(InMemoryObjectStore::new("nagrik-neeti-dev.appspot.com"));
        let uploader = Uploader::new(Arc::clone(&store));

        let url = uploader
            .upload_candidate_image("photos/asha.png", vec![0x89, 0x50, 0x4e, 0x47])
            .await
            .expect("upload succeeds");

        let path = url
            .strip_prefix("memory://nagrik-neeti-dev.appspot.com/")
            .expect("memory url");
        assert!(path.starts_with("candidates/"));
        assert!(path.ends_with("_asha.png"));
        let stored = store.object(path).expect("object stored");
        assert_eq!(stored.content_type, "image/png");
    }

    #[tokio::test]
    async fn documents_default_to_documents_folder() {
        let store = Arc::new(InMemoryObjectStore::new("bucket"));
        let uploader = Uploader::new(store);

        let url = uploader
            .upload_document(Some("  "), "affidavit.pdf", b"%PDF".to_vec())
            .await
            .expect("upload succeeds");
        assert!(url.starts_with("memory://bucket/documents/"));

        let url = uploader
            .upload_document(Some("reports"), "affidavit.pdf", b"%PDF".to_vec())
            .await
            .expect("upload succeeds");
        assert!(url.starts_with("memory://bucket/reports/"));
    }

    #[tokio::test]
    async fn empty_uploads_are_rejected() {
        let uploader = Uploader::new(Arc::new(InMemoryObjectStore::new("bucket")));

        let err = uploader
            .upload_candidate_image("asha.png", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Validation(ValidationError::MissingField("file"))
        ));

        let err = uploader
            .upload_document(None, "   ", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Validation(ValidationError::MissingField("fileName"))
        ));
    }
}
