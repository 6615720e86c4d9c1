use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use cid::Cid;

use crate::{Datastore, DatastoreError, Result};

/// Local-filesystem block store: one file per block under a root directory,
/// named by the block's CID string form.
///
/// Writes go through a `.tmp` sibling and are published with a rename, so a
/// crashed write never leaves a partial block under a valid CID. Because the
/// store is content-addressed, concurrent writers racing on the same block
/// write identical bytes and the last rename wins harmlessly.
#[derive(Debug, Clone)]
pub struct FsDatastore {
    root: PathBuf,
}

impl FsDatastore {
    /// Open (creating if needed) a block store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!(root = %root.display(), "opened fs datastore");
        Ok(Self { root })
    }

    fn block_path(&self, cid: &Cid) -> PathBuf {
        self.root.join(cid.to_string())
    }
}

#[async_trait::async_trait]
impl Datastore for FsDatastore {
    async fn put(&self, cid: Cid, data: Bytes) -> Result<Cid> {
        let path = self.block_path(&cid);
        if tokio::fs::try_exists(&path).await? {
            // Content-addressed: an existing block already holds these bytes.
            return Ok(cid);
        }

        let tmp = self.root.join(format!("{cid}.tmp"));
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(%cid, len = data.len(), "stored block");
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes> {
        match tokio::fs::read(self.block_path(cid)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(DatastoreError::NotFound(*cid))
            }
            Err(err) => Err(err.into()),
        }
    }
}
