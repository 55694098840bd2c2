//! On-disk records and the save queue in front of them.

use std::path::{Path, PathBuf};

use tokio::{
    fs,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::errors::{Error, HyperError, Result, log};
use crate::store::Bundle;
use crate::HYPERKEY_DIR_NAME;

/// Record holding the editor bundle.
pub const BUNDLE_RECORD: &str = "bundle";
/// Safety copy written right before an import.
pub const BACKUP_RECORD: &str = "bundle.backup";

/// JSON records keyed by id, one file each.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The xdg data directory for `hyperkey`.
    pub fn default_location() -> Result<Self> {
        let base = xdg::BaseDirectories::with_prefix(HYPERKEY_DIR_NAME);
        let path = base.place_data_file(format!("{BUNDLE_RECORD}.json"))?;
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// `None` when the record was never written.
    pub async fn read(&self, id: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(id)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces a record through a temporary file, so readers never see half a write.
    pub async fn write(&self, id: &str, contents: &str) -> Error {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(id);
        let tmp = self.dir.join(format!("{id}.json.tmp"));
        fs::write(&tmp, contents).await?;
        if let Err(err) = fs::rename(&tmp, &path).await {
            log!(fs::remove_file(&tmp).await);
            return Err(err.into());
        }
        tracing::debug!("wrote record {}", path.display());
        Ok(())
    }

    pub async fn load_bundle(&self) -> Result<Option<Bundle>> {
        match self.read(BUNDLE_RECORD).await? {
            Some(text) => Ok(Some(Bundle::from_json(&text)?)),
            None => Ok(None),
        }
    }

    pub async fn backup(&self, bundle: &Bundle) -> Error {
        self.write(BACKUP_RECORD, &bundle.to_json()?).await
    }

    pub async fn load_backup(&self) -> Result<Option<Bundle>> {
        match self.read(BACKUP_RECORD).await? {
            Some(text) => Ok(Some(Bundle::from_json(&text)?)),
            None => Ok(None),
        }
    }
}

struct SaveRequest {
    id: String,
    contents: String,
    done: oneshot::Sender<Error>,
}

/// Completion of one queued save.
#[must_use]
pub struct PendingSave(oneshot::Receiver<Error>);

impl PendingSave {
    pub async fn wait(self) -> Error {
        self.0.await.map_err(|_| HyperError::QueueClosed)?
    }
}

/// Writes records one at a time, in the order they were queued.
///
/// A single background task owns the record store, so a slow write can never be overtaken by a
/// newer one.
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveRequest>,
    task: JoinHandle<()>,
}

impl SaveQueue {
    pub fn new(store: RecordStore) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let result = store.write(&request.id, &request.contents).await;
                if let Err(Err(err)) = request.done.send(result) {
                    tracing::error!("Unable to save {}: {}", request.id, err);
                }
            }
        });
        Self { tx, task }
    }

    /// Queues the bundle as it is right now.
    pub fn save(&self, bundle: &Bundle) -> Result<PendingSave> {
        self.save_record(BUNDLE_RECORD, bundle.to_json()?)
    }

    pub fn save_record(&self, id: &str, contents: String) -> Result<PendingSave> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(SaveRequest {
                id: id.to_owned(),
                contents,
                done,
            })
            .map_err(|_| HyperError::QueueClosed)?;
        Ok(PendingSave(rx))
    }

    /// Waits for every queued save, then stops the writer task.
    pub async fn close(self) -> Error {
        drop(self.tx);
        self.task.await?;
        Ok(())
    }
}
