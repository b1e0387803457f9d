//! Background model loading.
//!
//! Each request gets a generation number and is parsed on its own worker
//! thread. Only the result of the newest request is ever accepted: a second
//! request supersedes the first instead of queueing behind it, and late
//! results of superseded requests are dropped when they arrive.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dentiscope_mesh::{LoadResult, MeshFormat, NormalizedMesh};

/// A finished load.
#[derive(Debug)]
pub struct CompletedLoad {
    pub generation: u64,
    pub name: String,
    pub format: MeshFormat,
    /// The source bytes, kept for the background upload.
    pub bytes: Arc<Vec<u8>>,
    pub result: LoadResult<NormalizedMesh>,
}

/// Spawns load workers and hands back the newest completed result.
#[derive(Debug)]
pub struct ModelLoader {
    sender: Sender<CompletedLoad>,
    receiver: Receiver<CompletedLoad>,
    latest: u64,
    pending: bool,
}

impl Default for ModelLoader {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            latest: 0,
            pending: false,
        }
    }
}

impl ModelLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while the newest request has not completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Generation number of the newest request.
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Starts parsing `bytes` in the background and returns the request's
    /// generation. Any earlier request still in flight is superseded.
    pub fn request(
        &mut self,
        name: impl Into<String>,
        format: MeshFormat,
        bytes: Arc<Vec<u8>>,
    ) -> std::io::Result<u64> {
        let generation = self.latest + 1;
        let name = name.into();
        let sender = self.sender.clone();
        thread::Builder::new()
            .name(format!("dentiscope-load-{generation}"))
            .spawn(move || {
                let result = dentiscope_mesh::load(&bytes, format);
                let _ = sender.send(CompletedLoad {
                    generation,
                    name,
                    format,
                    bytes,
                    result,
                });
            })?;
        if self.pending {
            log::info!("load {generation} supersedes load {}", self.latest);
        }
        self.latest = generation;
        self.pending = true;
        Ok(generation)
    }

    fn accept(&mut self, load: CompletedLoad) -> Option<CompletedLoad> {
        if load.generation == self.latest {
            self.pending = false;
            Some(load)
        } else {
            log::info!(
                "discarding superseded load of '{}' (generation {}, newest {})",
                load.name,
                load.generation,
                self.latest
            );
            None
        }
    }

    /// Returns the newest request's result if it has arrived. Never blocks.
    pub fn poll(&mut self) -> Option<CompletedLoad> {
        let mut newest = None;
        while let Ok(load) = self.receiver.try_recv() {
            if let Some(load) = self.accept(load) {
                newest = Some(load);
            }
        }
        newest
    }

    /// Blocks until the newest request completes or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<CompletedLoad> {
        let deadline = Instant::now() + timeout;
        while self.pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(load) => {
                    if let Some(load) = self.accept(load) {
                        return Some(load);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_load_completes() {
        let mut loader = ModelLoader::new();
        let generation = loader
            .request("tri.obj", MeshFormat::Obj, Arc::new(TRIANGLE.as_bytes().to_vec()))
            .expect("worker spawned");
        assert!(loader.is_loading());
        let done = loader.wait(Duration::from_secs(5)).expect("finishes");
        assert_eq!(done.generation, generation);
        assert!(done.result.is_ok());
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_second_request_supersedes_first() {
        let mut loader = ModelLoader::new();
        loader
            .request("first.obj", MeshFormat::Obj, Arc::new(TRIANGLE.as_bytes().to_vec()))
            .expect("worker spawned");
        let second = loader
            .request("second.obj", MeshFormat::Obj, Arc::new(TRIANGLE.as_bytes().to_vec()))
            .expect("worker spawned");
        let done = loader.wait(Duration::from_secs(5)).expect("finishes");
        assert_eq!(done.generation, second);
        assert_eq!(done.name, "second.obj");

        // Whatever arrives later belongs to the superseded request.
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let mut loader = ModelLoader::new();
        loader
            .request("bad.stl", MeshFormat::Stl, Arc::new(b"garbage".to_vec()))
            .expect("worker spawned");
        let done = loader.wait(Duration::from_secs(5)).expect("finishes");
        assert!(done.result.is_err());
    }
}
