use super::{encode_key, public_url, PutRequest, StorageService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A stored object as seen by [`MockStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Empty when the storage does not retain bodies.
    pub data: Vec<u8>,
    pub size: u64,
    pub content_type: String,
}

#[derive(Clone)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
    requests: Arc<Mutex<Vec<PutRequest>>>,
    fail_on_call: Option<usize>,
    location_override: Option<String>,
    retain_data: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_on_call: None,
            location_override: None,
            retain_data: true,
        }
    }

    /// Storage for dry runs: records object sizes without reading bodies.
    pub fn dry_run() -> Self {
        Self {
            retain_data: false,
            ..Self::new()
        }
    }

    /// Fail the n-th put (1-based) as the backend would.
    pub fn with_failure_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Return this exact location for every put.
    pub fn with_location(mut self, location: String) -> Self {
        self.location_override = Some(location);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<PutRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn put_object(&self, request: &PutRequest) -> Result<String> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(Error::S3(format!(
                "failed to upload file, mock backend rejected {}",
                request.key
            )));
        }

        let (data, size) = if self.retain_data {
            let data = tokio::fs::read(&request.source_path).await?;
            let size = data.len() as u64;
            (data, size)
        } else {
            let size = tokio::fs::metadata(&request.source_path).await?.len();
            (Vec::new(), size)
        };
        self.objects.lock().unwrap().insert(
            (request.bucket.clone(), request.key.clone()),
            StoredObject {
                data,
                size,
                content_type: request.content_type.clone(),
            },
        );

        Ok(self
            .location_override
            .clone()
            .unwrap_or_else(|| public_url(&request.bucket, &encode_key(&request.key))))
    }
}
