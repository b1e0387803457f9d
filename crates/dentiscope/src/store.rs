//! The document-store collaborator and background uploads.
//!
//! The session never talks to a storage backend directly; it is handed a
//! [`DocumentStore`] and only uses it to list a patient's stored models and
//! to persist newly loaded ones. Uploads run on a worker thread and report
//! back through a channel, so a slow or failing store never blocks a frame.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::{DentiscopeError, Result};

/// A stored model as listed by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
    pub url: String,
}

/// Remote persistence for patient models.
pub trait DocumentStore: Send + Sync {
    /// Lists the models stored for a patient.
    fn list_models_for_patient(&self, patient_id: &str) -> Result<Vec<ModelRef>>;

    /// Persists a model file and returns its URL.
    fn upload_model(&self, patient_id: &str, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// An in-memory [`DocumentStore`] whose uploads can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    models: Mutex<HashMap<String, Vec<(ModelRef, usize)>>>,
    fail_uploads: AtomicBool,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following upload fail (or succeed again).
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Size in bytes of a stored model, looked up by URL.
    #[must_use]
    pub fn stored_size(&self, url: &str) -> Option<usize> {
        let models = self.models.lock().ok()?;
        models
            .values()
            .flatten()
            .find(|(model, _)| model.url == url)
            .map(|(_, size)| *size)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list_models_for_patient(&self, patient_id: &str) -> Result<Vec<ModelRef>> {
        let models = self
            .models
            .lock()
            .map_err(|_| DentiscopeError::UploadFailure("store lock poisoned".to_string()))?;
        Ok(models
            .get(patient_id)
            .map(|list| list.iter().map(|(model, _)| model.clone()).collect())
            .unwrap_or_default())
    }

    fn upload_model(&self, patient_id: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(DentiscopeError::UploadFailure(format!(
                "store rejected {file_name}"
            )));
        }
        let mut models = self
            .models
            .lock()
            .map_err(|_| DentiscopeError::UploadFailure("store lock poisoned".to_string()))?;
        let list = models.entry(patient_id.to_string()).or_default();
        let url = format!("memory://{patient_id}/{}/{file_name}", list.len());
        list.push((
            ModelRef {
                name: file_name.to_string(),
                url: url.clone(),
            },
            bytes.len(),
        ));
        Ok(url)
    }
}

/// Outcome of a background upload.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Load generation of the model that was uploaded.
    pub generation: u64,
    pub file_name: String,
    pub result: Result<String>,
}

/// Runs uploads on worker threads and collects their outcomes.
#[derive(Debug)]
pub struct Uploader {
    sender: Sender<UploadOutcome>,
    receiver: Receiver<UploadOutcome>,
    in_flight: usize,
}

impl Default for Uploader {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }
}

impl Uploader {
    /// Starts an upload in the background.
    pub fn start(
        &mut self,
        store: Arc<dyn DocumentStore>,
        patient_id: String,
        file_name: String,
        bytes: Arc<Vec<u8>>,
        generation: u64,
    ) {
        let sender = self.sender.clone();
        let name = file_name.clone();
        let spawned = thread::Builder::new()
            .name(format!("dentiscope-upload-{generation}"))
            .spawn(move || {
                let result = store.upload_model(&patient_id, &file_name, &bytes);
                let _ = sender.send(UploadOutcome {
                    generation,
                    file_name,
                    result,
                });
            });
        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => {
                let _ = self.sender.send(UploadOutcome {
                    generation,
                    file_name: name,
                    result: Err(DentiscopeError::UploadFailure(format!(
                        "could not start upload worker: {e}"
                    ))),
                });
                self.in_flight += 1;
            }
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collects every finished upload without blocking.
    pub fn poll(&mut self) -> Vec<UploadOutcome> {
        let done: Vec<UploadOutcome> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Blocks until one upload finishes or the timeout passes.
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<UploadOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.receiver.recv_timeout(timeout).ok()?;
        self.in_flight -= 1;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_memory_store_lists_uploads() {
        let store = MemoryDocumentStore::new();
        let url = store
            .upload_model("p-1", "upper.stl", &[1, 2, 3])
            .expect("upload accepted");
        assert_eq!(store.stored_size(&url), Some(3));
        let listed = store.list_models_for_patient("p-1").expect("listable");
        assert_eq!(listed, vec![ModelRef { name: "upper.stl".into(), url }]);
        assert!(store.list_models_for_patient("p-2").expect("listable").is_empty());
    }

    #[test]
    fn test_failing_store() {
        let store = MemoryDocumentStore::new();
        store.set_fail_uploads(true);
        assert!(matches!(
            store.upload_model("p-1", "a.ply", &[]),
            Err(DentiscopeError::UploadFailure(_))
        ));
    }

    #[test]
    fn test_background_upload() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut uploader = Uploader::default();
        uploader.start(store.clone(), "p-9".into(), "jaw.obj".into(), Arc::new(vec![0; 10]), 4);
        let outcome = uploader.wait(Duration::from_secs(5)).expect("finishes");
        assert_eq!(outcome.generation, 4);
        let url = outcome.result.expect("uploaded");
        assert_eq!(store.stored_size(&url), Some(10));
        assert_eq!(uploader.in_flight(), 0);
    }
}
