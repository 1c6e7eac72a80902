use async_trait::async_trait;
use log::{ debug, warn };
use serde::Serializer as _;
use serde_json::ser::{ PrettyFormatter, Serializer };
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::sync::Mutex;

use super::{ ConversationId, ConversationLog, ConversationStore, StoreError };

/// Entries whose key is not a canonical integer id, such as the `"null"`
/// key older writers produced. They are never served but survive rewrites.
type ForeignEntries = BTreeMap<String, Vec<String>>;

/// Keeps every conversation in one pretty-printed JSON document.
///
/// Nothing is cached: each call reads the file and each write replaces it
/// whole. `guard` serializes the read-modify-write cycles of this handle.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        PathBuf::from(tmp_name)
    }

    async fn read_document(&self) -> Result<(ConversationLog, ForeignEntries), StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok((ConversationLog::new(), ForeignEntries::new()));
            }
            Err(e) => {
                return Err(self.io_error(e));
            }
        };

        let document: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw).map_err(|source| {
            warn!("Conversation log {} could not be parsed: {}", self.path.display(), source);
            StoreError::Corrupt { path: self.path.clone(), source }
        })?;

        let mut log = ConversationLog::new();
        let mut foreign = ForeignEntries::new();
        for (key, turns) in document {
            match key.parse::<ConversationId>() {
                Ok(id) if id.to_string() == key => {
                    log.insert(id, turns);
                }
                _ => {
                    warn!(
                        "Skipping entry {:?} in {}: key is not a conversation id",
                        key,
                        self.path.display()
                    );
                    foreign.insert(key, turns);
                }
            }
        }
        Ok((log, foreign))
    }

    async fn read_log(&self) -> Result<ConversationLog, StoreError> {
        Ok(self.read_document().await?.0)
    }

    async fn write_log(
        &self,
        log: &ConversationLog,
        foreign: &ForeignEntries
    ) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        (&mut ser).collect_map(
            log
                .iter()
                .map(|(id, turns)| (id.to_string(), turns))
                .chain(foreign.iter().map(|(key, turns)| (key.clone(), turns)))
        )?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &buf).await.map_err(|e| self.io_error(e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(self.io_error(e));
        }

        debug!("Wrote {} conversations to {}", log.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn load(&self) -> Result<ConversationLog, StoreError> {
        let _held = self.guard.lock().await;
        self.read_log().await
    }

    async fn save(&self, log: &ConversationLog) -> Result<(), StoreError> {
        let _held = self.guard.lock().await;
        // A corrupt file is being replaced wholesale; there is nothing to carry over.
        let foreign = match self.read_document().await {
            Ok((_, foreign)) => foreign,
            Err(StoreError::Corrupt { .. }) => ForeignEntries::new(),
            Err(e) => {
                return Err(e);
            }
        };
        self.write_log(log, &foreign).await
    }

    async fn append(
        &self,
        conversation_id: ConversationId,
        turns: Vec<String>
    ) -> Result<Vec<String>, StoreError> {
        let _held = self.guard.lock().await;
        let (mut log, foreign) = self.read_document().await?;
        let entry = log.entry(conversation_id).or_default();
        entry.extend(turns);
        let updated = entry.clone();
        self.write_log(&log, &foreign).await?;
        Ok(updated)
    }
}
