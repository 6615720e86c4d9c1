use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cid::Cid;
use serde::{Deserialize, Serialize};

use store::Datastore;

use crate::blocks::{BlockStore, BlockStoreError};
use crate::crypto::{KeyError, MasterKey, Secret, SecretError};
use crate::forest::{ForestError, MergeStrategy, PrivateForest, PrivateRef};
use crate::linked_data::{BlockEncoded, CodecError};

use super::node::{
    FileContent, Metadata, NodeLink, PrivateDirectory, PrivateFile, PrivateNode,
};
use super::path::{display_path, parse_path};
use super::stream;

/// Default plaintext chunk size for streamed content.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Engine configuration, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Plaintext bytes per content chunk on the streaming path.
    pub chunk_size: usize,
    /// Content up to this size is stored inline in the file node.
    pub inline_threshold: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            inline_threshold: CHUNK_SIZE,
        }
    }
}

/// The result of a committed mutation: the new root CID plus the root's
/// updated ref. Holding either a snapshot or (master key + root CID) is
/// enough to get back to this exact state later.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub root_cid: Cid,
    pub private_ref: PrivateRef,
}

/// One `ls` row. Serializes to the documented listing transport, a JSON
/// array of `{name, creation, modification}` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub creation: DateTime<Utc>,
    pub modification: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("could not find {0}")]
    NotFound(String),
    #[error("structural error: {0}")]
    Structural(String),
    #[error("key derivation error: {0}")]
    KeyDerivation(#[from] KeyError),
    #[error("forest error: {0}")]
    Forest(#[from] ForestError),
    #[error("block store error: {0}")]
    Blocks(#[from] BlockStoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("listing encode error: {0}")]
    ListingEncode(#[from] serde_json::Error),
}

/// One visited directory during a path walk: its ref, its decrypted form,
/// and whether it was created by this walk (fresh dirs use their ref as-is
/// on commit instead of advancing it).
struct ChainEntry {
    private_ref: PrivateRef,
    dir: PrivateDirectory,
    fresh: bool,
}

/// A loaded private filesystem.
///
/// Every mutating operation runs against the drive's current (forest, root
/// ref) state and commits a complete new state: modified nodes are
/// re-sealed bottom-up, each advanced one revision, and a fresh forest
/// block is written whose CID is returned in the [`Snapshot`]. On error the
/// drive is rolled back to its pre-call state, so there is no observable
/// intermediate root.
///
/// Concurrency is the caller's concern: two drives mutating from the same
/// root CID race, and whichever snapshot the caller records last wins
/// unless the forests are merged (see [`Drive::merge_from`]).
#[derive(Debug)]
pub struct Drive {
    blocks: BlockStore,
    config: DriveConfig,
    forest: PrivateForest,
    root_ref: PrivateRef,
}

impl Drive {
    /// Create an empty forest holding a fresh root directory derived from
    /// the master key.
    pub async fn init(
        store: Arc<dyn Datastore>,
        master: &MasterKey,
        config: DriveConfig,
    ) -> Result<(Self, Snapshot), DriveError> {
        let blocks = BlockStore::new(store);
        let mut forest = PrivateForest::new();
        let root_ref = PrivateRef::root(master);

        let root = PrivateNode::Dir(PrivateDirectory::new());
        forest.put(&root_ref, &root.encode()?, &blocks).await?;
        let root_cid = forest.store(&blocks).await?;
        tracing::debug!(%root_cid, "initialized drive");

        let drive = Self {
            blocks,
            config,
            forest,
            root_ref: root_ref.clone(),
        };
        Ok((
            drive,
            Snapshot {
                root_cid,
                private_ref: root_ref,
            },
        ))
    }

    /// Reload an existing filesystem from only the master key and its
    /// latest root CID.
    ///
    /// Re-derives the root's revision-zero ref and follows the ratchet to
    /// the newest revision present in the forest. A pure function of its
    /// inputs: the same (key, CID) pair always lands on the same root.
    pub async fn load_with_key(
        store: Arc<dyn Datastore>,
        master: &MasterKey,
        root_cid: &Cid,
        config: DriveConfig,
    ) -> Result<Self, DriveError> {
        let blocks = BlockStore::new(store);
        let forest = PrivateForest::load(root_cid, &blocks).await?;

        let seed = PrivateRef::root(master);
        let root_ref = forest
            .seek_latest(&seed.name_hash, seed.revision_key)
            .ok_or_else(|| {
                DriveError::NotFound("a root directory for this key".to_string())
            })?;

        let drive = Self {
            blocks,
            config,
            forest,
            root_ref,
        };
        // Decrypting the root proves the key actually matches this forest.
        drive.root_dir().await?;
        Ok(drive)
    }

    /// Resume from a root CID with a held root ref.
    pub async fn open(
        store: Arc<dyn Datastore>,
        root_cid: &Cid,
        private_ref: PrivateRef,
        config: DriveConfig,
    ) -> Result<Self, DriveError> {
        let blocks = BlockStore::new(store);
        let forest = PrivateForest::load(root_cid, &blocks).await?;
        let drive = Self {
            blocks,
            config,
            forest,
            root_ref: private_ref,
        };
        drive.root_dir().await?;
        Ok(drive)
    }

    /// The current root ref. After `load_with_key` this is the recomputed
    /// capability callers would otherwise have had to persist.
    pub fn root_ref(&self) -> &PrivateRef {
        &self.root_ref
    }

    pub fn forest(&self) -> &PrivateForest {
        &self.forest
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Create a directory, including missing intermediates.
    ///
    /// A no-op (returning the unchanged root) if a directory already exists
    /// at `path`; fails with a structural error if a file occupies any
    /// component.
    pub async fn mkdir(&mut self, path: &str) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.mkdir_inner(path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn mkdir_inner(&mut self, path: &str) -> Result<Snapshot, DriveError> {
        let segments = parse_path(path);
        let mut chain = self.walk_or_create(&segments).await?;

        let first_fresh = chain.iter().position(|entry| entry.fresh);
        let Some(first_fresh) = first_fresh else {
            // Everything on the path already exists as a directory.
            return self.current_snapshot().await;
        };
        if first_fresh > 0 {
            chain[first_fresh - 1].dir.metadata.touch();
        }
        self.commit(chain, &segments).await
    }

    /// List the immediate children of a directory with their timestamps.
    ///
    /// Fails with NotFound if `path` does not resolve to a directory.
    pub async fn ls(&self, path: &str) -> Result<Vec<Listing>, DriveError> {
        let segments = parse_path(path);
        let chain = self.walk_dirs(&segments).await?;
        let dir = &chain
            .last()
            .expect("walk always yields the root entry")
            .dir;

        let mut listings = Vec::with_capacity(dir.len());
        for (name, link) in dir.links() {
            let node = self.load_node(link.private_ref()).await?;
            let metadata = node.metadata();
            listings.push(Listing {
                name: name.clone(),
                creation: metadata.created,
                modification: metadata.modified,
            });
        }
        Ok(listings)
    }

    /// `ls` rendered as the documented transport format: a JSON array of
    /// `{name, creation, modification}` records.
    pub async fn ls_json(&self, path: &str) -> Result<String, DriveError> {
        Ok(serde_json::to_string(&self.ls(path).await?)?)
    }

    /// Create or overwrite a file with the given content.
    ///
    /// Intermediate directories are not created; the parent must already
    /// exist (the root is always present). Content above the inline
    /// threshold is chunked exactly as on the streaming path.
    pub async fn write_file(&mut self, path: &str, content: &[u8]) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.write_file_inner(path, content).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn write_file_inner(
        &mut self,
        path: &str,
        content: &[u8],
    ) -> Result<Snapshot, DriveError> {
        let segments = parse_path(path);
        let (dir_segments, file_name) = split_file_path(&segments)
            .ok_or_else(|| DriveError::Structural("cannot write to the root directory".into()))?;
        let chain = self.walk_dirs(dir_segments).await?;

        let file_content = if content.len() <= self.config.inline_threshold {
            FileContent::Inline(content.to_vec())
        } else {
            let key = Secret::generate();
            let (size, chunks) = stream::store_chunks(
                &mut std::io::Cursor::new(content),
                &key,
                self.config.chunk_size,
                &self.blocks,
            )
            .await?;
            FileContent::Chunked {
                size,
                chunk_size: self.config.chunk_size as u32,
                key,
                chunks,
            }
        };

        self.insert_file(chain, dir_segments, file_name, file_content)
            .await
    }

    /// Create or overwrite a file from an external byte source, one chunk
    /// at a time. Peak memory is O(chunk_size) regardless of source size.
    pub async fn write_file_from<R: Read>(
        &mut self,
        path: &str,
        reader: &mut R,
    ) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.write_file_from_inner(path, reader).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn write_file_from_inner<R: Read>(
        &mut self,
        path: &str,
        reader: &mut R,
    ) -> Result<Snapshot, DriveError> {
        let segments = parse_path(path);
        let (dir_segments, file_name) = split_file_path(&segments)
            .ok_or_else(|| DriveError::Structural("cannot write to the root directory".into()))?;
        // Resolve the parent before consuming the source.
        let chain = self.walk_dirs(dir_segments).await?;

        let key = Secret::generate();
        let (size, chunks) =
            stream::store_chunks(reader, &key, self.config.chunk_size, &self.blocks).await?;
        let content = FileContent::Chunked {
            size,
            chunk_size: self.config.chunk_size as u32,
            key,
            chunks,
        };

        self.insert_file(chain, dir_segments, file_name, content)
            .await
    }

    /// Stream a local file's content into the drive.
    pub async fn write_file_from_path(
        &mut self,
        path: &str,
        source: &Path,
    ) -> Result<Snapshot, DriveError> {
        let mut file = std::fs::File::open(source)?;
        self.write_file_from(path, &mut file).await
    }

    /// Read a file's entire content into memory.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, DriveError> {
        let mut out = Vec::new();
        self.read_file_to(path, &mut out).await?;
        Ok(out)
    }

    /// Stream a file's content into a writer, chunk by chunk for chunked
    /// content. Returns the number of bytes written.
    pub async fn read_file_to<W: Write>(
        &self,
        path: &str,
        writer: &mut W,
    ) -> Result<u64, DriveError> {
        let file = self.resolve_file(path).await?;
        match file.content {
            FileContent::Inline(bytes) => {
                writer.write_all(&bytes)?;
                Ok(bytes.len() as u64)
            }
            FileContent::Chunked { key, chunks, .. } => {
                stream::load_chunks(writer, &key, &chunks, &self.blocks).await
            }
        }
    }

    /// Stream a file's content into a local file.
    pub async fn read_file_to_path(&self, path: &str, dest: &Path) -> Result<u64, DriveError> {
        let mut file = std::fs::File::create(dest)?;
        let written = self.read_file_to(path, &mut file).await?;
        file.flush()?;
        Ok(written)
    }

    /// Remove a child entry from its parent directory.
    ///
    /// Fails with NotFound if nothing exists at `path`. The underlying
    /// blocks are not reclaimed; the store is append-only.
    pub async fn rm(&mut self, path: &str) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.rm_inner(path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn rm_inner(&mut self, path: &str) -> Result<Snapshot, DriveError> {
        let segments = parse_path(path);
        let (dir_segments, name) = split_file_path(&segments)
            .ok_or_else(|| DriveError::Structural("cannot remove the root directory".into()))?;
        let mut chain = self.walk_dirs(dir_segments).await?;

        let parent = chain
            .last_mut()
            .expect("walk always yields the root entry");
        if parent.dir.remove(name).is_none() {
            return Err(DriveError::NotFound(format!(
                "path {}",
                display_path(&segments)
            )));
        }
        parent.dir.metadata.touch();
        self.commit(chain, dir_segments).await
    }

    /// Move an entry. The destination's parent must already exist; an
    /// existing destination entry is overwritten (last write wins at the
    /// mutated node).
    pub async fn mv(&mut self, from: &str, to: &str) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.mv_inner(from, to).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn mv_inner(&mut self, from: &str, to: &str) -> Result<Snapshot, DriveError> {
        let from_segments = parse_path(from);
        let (from_parents, from_name) = split_file_path(&from_segments)
            .ok_or_else(|| DriveError::Structural("cannot move the root directory".into()))?;
        let to_segments = parse_path(to);
        let (to_parents, to_name) = split_file_path(&to_segments)
            .ok_or_else(|| DriveError::Structural("cannot move onto the root directory".into()))?;

        // Detach the source first. Moving a directory beneath itself then
        // fails naturally: its subtree is unreachable when the destination
        // parent is resolved below.
        let mut chain = self.walk_dirs(from_parents).await?;
        let parent = chain
            .last_mut()
            .expect("walk always yields the root entry");
        let link = parent.dir.remove(from_name).ok_or_else(|| {
            DriveError::NotFound(format!("path {}", display_path(&from_segments)))
        })?;
        parent.dir.metadata.touch();
        self.commit(chain, from_parents).await?;

        self.attach(to_parents, to_name, link, &to_segments).await
    }

    /// Copy an entry. The destination's parent must already exist.
    ///
    /// The copied node is re-keyed under a fresh ref, so later mutations of
    /// either side never show through the other. Chunked file content is
    /// shared, not re-encrypted: chunk keys ride inside the (re-keyed) node
    /// and chunk blocks are immutable.
    pub async fn cp(&mut self, from: &str, to: &str) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        match self.cp_inner(from, to).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    async fn cp_inner(&mut self, from: &str, to: &str) -> Result<Snapshot, DriveError> {
        let from_segments = parse_path(from);
        let (from_parents, from_name) = split_file_path(&from_segments)
            .ok_or_else(|| DriveError::Structural("cannot copy the root directory".into()))?;
        let to_segments = parse_path(to);
        let (to_parents, to_name) = split_file_path(&to_segments)
            .ok_or_else(|| DriveError::Structural("cannot copy onto the root directory".into()))?;

        let chain = self.walk_dirs(from_parents).await?;
        let link = chain
            .last()
            .expect("walk always yields the root entry")
            .dir
            .get_link(from_name)
            .cloned()
            .ok_or_else(|| {
                DriveError::NotFound(format!("path {}", display_path(&from_segments)))
            })?;

        let node = self.load_node(link.private_ref()).await?;
        let copy_ref = PrivateRef::generate();
        self.forest
            .put(&copy_ref, &node.encode()?, &self.blocks)
            .await?;

        self.attach(to_parents, to_name, link.with_ref(copy_ref), &to_segments)
            .await
    }

    /// Merge another root's forest into this drive's forest.
    ///
    /// With [`UnionMerge`](crate::forest::UnionMerge) this is the
    /// last-write-wins escape hatch: concurrent revisions coexist and reads
    /// settle deterministically.
    pub async fn merge_from(
        &mut self,
        other_root: &Cid,
        strategy: &impl MergeStrategy,
    ) -> Result<Snapshot, DriveError> {
        let checkpoint = self.checkpoint();
        let result = async {
            let other = PrivateForest::load(other_root, &self.blocks).await?;
            self.forest = self.forest.merge(&other, strategy);
            self.current_snapshot().await
        }
        .await;
        if result.is_err() {
            self.restore(checkpoint);
        }
        result
    }

    fn checkpoint(&self) -> (PrivateForest, PrivateRef) {
        (self.forest.clone(), self.root_ref.clone())
    }

    fn restore(&mut self, checkpoint: (PrivateForest, PrivateRef)) {
        self.forest = checkpoint.0;
        self.root_ref = checkpoint.1;
    }

    async fn current_snapshot(&self) -> Result<Snapshot, DriveError> {
        Ok(Snapshot {
            root_cid: self.forest.store(&self.blocks).await?,
            private_ref: self.root_ref.clone(),
        })
    }

    async fn load_node(&self, private_ref: &PrivateRef) -> Result<PrivateNode, DriveError> {
        let plaintext = self.forest.get(private_ref, &self.blocks).await?;
        Ok(PrivateNode::decode(&plaintext)?)
    }

    async fn root_dir(&self) -> Result<PrivateDirectory, DriveError> {
        self.load_node(&self.root_ref)
            .await?
            .into_dir()
            .ok_or_else(|| DriveError::Structural("root node is not a directory".into()))
    }

    /// Walk from the root to the directory at `segments`, returning every
    /// visited directory (root first). Fails with NotFound as soon as a
    /// component is absent or is not a directory.
    async fn walk_dirs(&self, segments: &[String]) -> Result<Vec<ChainEntry>, DriveError> {
        let mut chain = vec![ChainEntry {
            private_ref: self.root_ref.clone(),
            dir: self.root_dir().await?,
            fresh: false,
        }];

        for (depth, name) in segments.iter().enumerate() {
            let not_found =
                || DriveError::NotFound(format!("path {}", display_path(&segments[..=depth])));
            let link = chain[depth]
                .dir
                .get_link(name)
                .cloned()
                .ok_or_else(not_found)?;
            let NodeLink::Dir(child_ref) = link else {
                return Err(not_found());
            };
            let dir = self
                .load_node(&child_ref)
                .await?
                .into_dir()
                .ok_or_else(|| {
                    DriveError::Structural(format!(
                        "link and node disagree at {}",
                        display_path(&segments[..=depth])
                    ))
                })?;
            chain.push(ChainEntry {
                private_ref: child_ref,
                dir,
                fresh: false,
            });
        }
        Ok(chain)
    }

    /// Like [`Self::walk_dirs`], but missing components become fresh empty
    /// directories. A file on the path is a structural error.
    async fn walk_or_create(&self, segments: &[String]) -> Result<Vec<ChainEntry>, DriveError> {
        let mut chain = vec![ChainEntry {
            private_ref: self.root_ref.clone(),
            dir: self.root_dir().await?,
            fresh: false,
        }];

        for (depth, name) in segments.iter().enumerate() {
            let entry = match chain[depth].dir.get_link(name).cloned() {
                Some(NodeLink::Dir(child_ref)) => {
                    let dir = self
                        .load_node(&child_ref)
                        .await?
                        .into_dir()
                        .ok_or_else(|| {
                            DriveError::Structural(format!(
                                "link and node disagree at {}",
                                display_path(&segments[..=depth])
                            ))
                        })?;
                    ChainEntry {
                        private_ref: child_ref,
                        dir,
                        fresh: false,
                    }
                }
                Some(NodeLink::File(_)) => {
                    return Err(DriveError::Structural(format!(
                        "a file occupies {}",
                        display_path(&segments[..=depth])
                    )));
                }
                None => ChainEntry {
                    private_ref: PrivateRef::generate(),
                    dir: PrivateDirectory::new(),
                    fresh: true,
                },
            };
            chain.push(entry);
        }
        Ok(chain)
    }

    /// Seal and store a file node, link it into its parent, and commit.
    async fn insert_file(
        &mut self,
        mut chain: Vec<ChainEntry>,
        dir_segments: &[String],
        file_name: &str,
        content: FileContent,
    ) -> Result<Snapshot, DriveError> {
        let existing = chain
            .last()
            .expect("walk always yields the root entry")
            .dir
            .get_link(file_name)
            .cloned();

        let (file_ref, metadata) = match existing {
            Some(NodeLink::Dir(_)) => {
                return Err(DriveError::Structural(format!(
                    "a directory occupies {}/{}",
                    display_path(dir_segments),
                    file_name
                )));
            }
            Some(NodeLink::File(old_ref)) => {
                // Overwrite: keep the node's identity and creation time,
                // advance its revision.
                let created = self.load_node(&old_ref).await?.metadata().created;
                (old_ref.advance(), Metadata::with_created(created))
            }
            None => (PrivateRef::generate(), Metadata::now()),
        };

        let file = PrivateNode::File(PrivateFile { metadata, content });
        self.forest
            .put(&file_ref, &file.encode()?, &self.blocks)
            .await?;

        let parent = chain
            .last_mut()
            .expect("walk always yields the root entry");
        parent
            .dir
            .insert(file_name.to_string(), NodeLink::File(file_ref));
        parent.dir.metadata.touch();

        self.commit(chain, dir_segments).await
    }

    /// Insert a link at `to_parents/to_name` and commit. The destination
    /// parent must exist; its absence is a structural error, not NotFound.
    async fn attach(
        &mut self,
        to_parents: &[String],
        to_name: &str,
        link: NodeLink,
        to_segments: &[String],
    ) -> Result<Snapshot, DriveError> {
        let mut chain = self.walk_dirs(to_parents).await.map_err(|err| match err {
            DriveError::NotFound(what) => DriveError::Structural(format!(
                "destination parent does not exist: {what}"
            )),
            err => err,
        })?;

        let parent = chain
            .last_mut()
            .expect("walk always yields the root entry");
        if matches!(parent.dir.get_link(to_name), Some(NodeLink::Dir(_))) && link.is_file() {
            return Err(DriveError::Structural(format!(
                "a directory occupies {}",
                display_path(to_segments)
            )));
        }
        parent.dir.insert(to_name.to_string(), link);
        parent.dir.metadata.touch();
        self.commit(chain, to_parents).await
    }

    /// Re-seal every directory on the chain bottom-up, advancing each one
    /// revision and rewiring its parent's link, then persist the forest.
    ///
    /// The cascade is what keeps the root's ratchet in step: every
    /// committed mutation advances the root by exactly one revision, which
    /// is what `load_with_key`'s ratchet walk relies on.
    async fn commit(
        &mut self,
        mut chain: Vec<ChainEntry>,
        segments: &[String],
    ) -> Result<Snapshot, DriveError> {
        debug_assert_eq!(chain.len(), segments.len() + 1);

        let mut rewire: Option<(String, PrivateRef)> = None;
        let mut depth = chain.len();
        while let Some(mut entry) = chain.pop() {
            depth -= 1;
            if let Some((name, new_ref)) = rewire.take() {
                entry.dir.insert(name, NodeLink::Dir(new_ref));
            }

            let next_ref = if entry.fresh {
                entry.private_ref
            } else {
                entry.private_ref.advance()
            };
            self.forest
                .put(&next_ref, &PrivateNode::Dir(entry.dir).encode()?, &self.blocks)
                .await?;

            if depth == 0 {
                self.root_ref = next_ref;
            } else {
                rewire = Some((segments[depth - 1].clone(), next_ref));
            }
        }

        let root_cid = self.forest.store(&self.blocks).await?;
        tracing::debug!(%root_cid, "committed mutation");
        Ok(Snapshot {
            root_cid,
            private_ref: self.root_ref.clone(),
        })
    }

    async fn resolve_file(&self, path: &str) -> Result<PrivateFile, DriveError> {
        let segments = parse_path(path);
        let (dir_segments, name) = split_file_path(&segments)
            .ok_or_else(|| DriveError::NotFound("file at the root path".to_string()))?;
        let chain = self.walk_dirs(dir_segments).await?;

        let not_found =
            || DriveError::NotFound(format!("file at {}", display_path(&segments)));
        let link = chain
            .last()
            .expect("walk always yields the root entry")
            .dir
            .get_link(name)
            .ok_or_else(not_found)?;
        let NodeLink::File(file_ref) = link else {
            return Err(not_found());
        };
        self.load_node(file_ref)
            .await?
            .into_file()
            .ok_or_else(|| {
                DriveError::Structural(format!(
                    "link and node disagree at {}",
                    display_path(&segments)
                ))
            })
    }
}

/// Split a parsed path into (parent segments, final name). `None` for the
/// empty path, i.e. the root itself.
fn split_file_path(segments: &[String]) -> Option<(&[String], &str)> {
    segments
        .split_last()
        .map(|(name, parents)| (parents, name.as_str()))
}
