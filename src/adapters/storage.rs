use crate::domain::ports::Storage;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let full_path = self.full_path(path);
        tracing::debug!("Reading {}", full_path.display());
        tokio::fs::read(full_path).await
    }

    fn read_file_blocking(&self, path: &str) -> io::Result<Vec<u8>> {
        let full_path = self.full_path(path);
        tracing::debug!("Reading {} (blocking)", full_path.display());
        fs::read(full_path)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await
    }
}

/// In-memory storage with fault injection and an in-flight read gauge.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failures: HashSet<String>,
    latency: Option<Duration>,
    gauge: Arc<ReadGauge>,
}

#[derive(Debug, Default)]
struct ReadGauge {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    reads: AtomicUsize,
}

struct InFlight<'a>(&'a ReadGauge);

impl ReadGauge {
    fn enter(&self) -> InFlight<'_> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), data.into());
        }
        self
    }

    /// Every read of `path` fails, even if the file exists.
    pub fn with_failure(mut self, path: &str) -> Self {
        self.failures.insert(path.to_string());
        self
    }

    /// Each read takes at least `latency` before completing.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(path).cloned()
    }

    /// Highest number of reads observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.gauge.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.gauge.reads.load(Ordering::SeqCst)
    }

    fn lookup(&self, path: &str) -> io::Result<Vec<u8>> {
        if self.failures.contains(path) {
            return Err(io::Error::other(format!("Injected read failure: {}", path)));
        }

        let files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("Storage lock poisoned"))?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("File not found: {}", path))
        })
    }
}

impl Storage for MemoryStorage {
    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let _in_flight = self.gauge.enter();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.lookup(path)
    }

    fn read_file_blocking(&self, path: &str) -> io::Result<Vec<u8>> {
        let _in_flight = self.gauge.enter();
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        self.lookup(path)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("Storage lock poisoned"))?;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}
