use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use super::{ArtworkError, ArtworkRequest, ArtworkRequestId, ArtworkResult};
use crate::host::ArtworkFetcher;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Downloads artwork on a helper thread into `cache_dir` and reports the
/// result over a channel drained by the runtime loop.
pub struct HttpArtworkFetcher {
    cache_dir: PathBuf,
    done: Sender<ArtworkResult>,
    /// Generations still downloading, flagged `true` once cancelled.
    in_flight: Arc<Mutex<HashMap<u64, bool>>>,
}

impl HttpArtworkFetcher {
    pub fn new(cache_dir: PathBuf, done: Sender<ArtworkResult>) -> Self {
        Self {
            cache_dir,
            done,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[cfg(test)]
    pub(super) fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|map| map.len()).unwrap_or(0)
    }
}

impl ArtworkFetcher for HttpArtworkFetcher {
    fn fetch(&self, request: ArtworkRequest) {
        let target = self.cache_dir.join(request.id.key());
        let done = self.done.clone();
        let in_flight = self.in_flight.clone();
        let generation = request.id.generation();
        if let Ok(mut map) = in_flight.lock() {
            map.insert(generation, false);
        }

        std::thread::spawn(move || {
            let outcome = download(&request.url, &target);
            let was_cancelled = in_flight
                .lock()
                .ok()
                .and_then(|mut map| map.remove(&generation))
                .unwrap_or(false);
            if was_cancelled {
                debug!(id = %request.id, "artwork request cancelled, dropping result");
                return;
            }
            if done
                .send(ArtworkResult {
                    id: request.id,
                    outcome,
                })
                .is_err()
            {
                warn!(id = %request.id, "runtime gone, artwork result dropped");
            }
        });
    }

    fn cancel(&self, id: ArtworkRequestId) {
        // Finished requests are no longer tracked.
        if let Ok(mut map) = self.in_flight.lock() {
            if let Some(cancelled) = map.get_mut(&id.generation()) {
                *cancelled = true;
            }
        }
    }
}

fn download(url: &str, target: &Path) -> Result<PathBuf, ArtworkError> {
    if let Some(path) = local_path(url) {
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ArtworkError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )))
        };
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ArtworkError::UnsupportedUrl(url.to_string()));
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ArtworkError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }
    let bytes = response.bytes()?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, &bytes)?;
    debug!(url, path = %target.display(), size = bytes.len(), "artwork downloaded");
    Ok(target.to_path_buf())
}

/// Path for `file://` URLs.
pub(super) fn local_path(url: &str) -> Option<PathBuf> {
    url.strip_prefix("file://").map(PathBuf::from)
}
