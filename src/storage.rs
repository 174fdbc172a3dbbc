use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::ApiError;

const STAGING_PREFIX: &str = "staging-";

/// Extension used when an upload carries no usable extension, so a committed
/// asset is always named `<id>.<ext>`.
const FALLBACK_EXT: &str = "bin";

/// One directory of audio files, at most one per song id, named `<id>.<ext>`.
///
/// Writes go through a staged temp file; the rename in [`BlobStore::commit`]
/// is the only operation that makes a file visible under its song id. The
/// database row and the file cannot be updated atomically together — the
/// ordering rules live in `lifecycle`, this type only guarantees the
/// one-file-per-id invariant and collision-free staging names.
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

/// An upload written to a uniquely named temp location, not yet bound to a
/// song id. Must end in [`BlobStore::commit`] or [`StagedBlob::discard`];
/// anything left behind (a dropped connection mid-upload) is reclaimed by
/// [`BlobStore::sweep_stale`].
pub struct StagedBlob {
    path: PathBuf,
    ext: String,
    file: fs::File,
}

impl StagedBlob {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await
    }

    /// Removes the staged temp file. Best-effort: a leftover is picked up by
    /// the stale sweep.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(err) = fs::remove_file(&self.path).await {
            log::warn!("failed to remove staged file {}: {err}", self.path.display());
        }
    }
}

impl BlobStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(BlobStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens a staged temp file for an incoming upload. The name is
    /// timestamp + random so concurrent uploads never collide, and the
    /// `staging-` prefix keeps it invisible to id lookups.
    pub async fn stage(&self, original_filename: &str) -> Result<StagedBlob, ApiError> {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(FALLBACK_EXT)
            .to_string();

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let path = self
            .root
            .join(format!("{STAGING_PREFIX}{millis}-{}", Uuid::new_v4()));

        let file = fs::File::create(&path).await?;
        Ok(StagedBlob { path, ext, file })
    }

    /// Renames a staged file to `<song_id>.<ext>`. If the song already has an
    /// asset under a different extension it is removed first, so at most one
    /// file per id survives. Once the rename returns the asset is durably
    /// associated with the song.
    pub async fn commit(&self, staged: StagedBlob, song_id: i32) -> Result<(), ApiError> {
        let StagedBlob { path, ext, file } = staged;
        file.sync_all().await?;
        drop(file);

        self.remove_matching(song_id, Some(&ext)).await?;

        let target = self.root.join(format!("{song_id}.{ext}"));
        fs::rename(&path, &target).await?;
        Ok(())
    }

    /// Finds the committed asset for a song id and infers its content type
    /// from the extension. Matching is exact on the `<id>.` prefix.
    pub async fn resolve(&self, song_id: i32) -> Result<(PathBuf, &'static str), ApiError> {
        let prefix = format!("{song_id}.");
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                let path = entry.path();
                let content_type = content_type_for(&path);
                return Ok((path, content_type));
            }
        }
        Err(ApiError::NotFound("audio file"))
    }

    /// Removes every committed asset for a song id. Idempotent: succeeds when
    /// nothing matches. The match requires the `.` delimiter, so id `1` never
    /// touches `12.mp3`.
    pub async fn delete(&self, song_id: i32) -> std::io::Result<()> {
        self.remove_matching(song_id, None).await
    }

    /// Removes stale staged files left behind by aborted uploads. Returns how
    /// many were removed.
    pub async fn sweep_stale(&self, max_age: Duration) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(STAGING_PREFIX) {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);
            if age >= max_age {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes committed files for `song_id`; with `keep_ext` set, the file
    /// carrying exactly that extension is left alone (commit renames over it).
    async fn remove_matching(&self, song_id: i32, keep_ext: Option<&str>) -> std::io::Result<()> {
        let prefix = format!("{song_id}.");
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) {
                continue;
            }
            if let Some(keep) = keep_ext {
                if name == format!("{song_id}.{keep}") {
                    continue;
                }
            }
            fs::remove_file(entry.path()).await?;
        }
        Ok(())
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
