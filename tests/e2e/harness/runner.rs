use super::assertions::Assertion;
use super::clock::MockClock;
use super::steps::{Expect, ScenarioStep};
use super::workspace::TestWorkspace;
use anyhow::{bail, Context, Result};
use folio_core::{
    AccessGate, AllowList, Asset, AssetStore, ContentHash, ContentStore, Document,
    DocumentFields, DocumentRepository, Editor, FolioError, FsStore, Identity, MemoryStore,
    RetryPolicy,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Backing store a scenario runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Disk,
}

/// Executes scenario steps against a real repository
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    store: Arc<dyn ContentStore>,
    memory: Option<Arc<MemoryStore>>,
    clock: MockClock,
    gate: Arc<dyn AccessGate>,
    identity: Identity,
    /// alias -> document path
    paths: HashMap<String, String>,
    /// alias -> last version of the document the scenario saw
    docs: HashMap<String, Document>,
    /// name -> saved version token
    hashes: HashMap<String, ContentHash>,
    last_upload: Option<Asset>,
    current_step: usize,
}

impl ScenarioRunner {
    pub fn new(workspace: TestWorkspace, backend: Backend, allowed: &[String]) -> Self {
        let (store, memory) = match backend {
            Backend::Memory => {
                let memory = Arc::new(MemoryStore::new());
                let store: Arc<dyn ContentStore> = memory.clone();
                (store, Some(memory))
            }
            Backend::Disk => {
                let store: Arc<dyn ContentStore> = Arc::new(FsStore::new(workspace.path()));
                (store, None)
            }
        };

        Self {
            workspace,
            store,
            memory,
            clock: MockClock::new(),
            gate: Arc::new(AllowList::new(allowed.iter().cloned())),
            identity: Identity::new(super::scenario::EDITOR),
            paths: HashMap::new(),
            docs: HashMap::new(),
            hashes: HashMap::new(),
            last_upload: None,
            current_step: 0,
        }
    }

    /// Places a blob before the first step, bypassing every check
    pub fn seed(&mut self, store_path: &str, content: &[u8]) -> Result<()> {
        match &self.memory {
            Some(memory) => {
                memory.put_unchecked(store_path, content);
                Ok(())
            }
            None => self.workspace.write_file(store_path, content),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn workspace(&self) -> &TestWorkspace {
        &self.workspace
    }

    pub fn clock(&self) -> &MockClock {
        &self.clock
    }

    /// Version token saved under `name`
    pub fn hash(&self, name: &str) -> Option<&ContentHash> {
        self.hashes.get(name)
    }

    /// Document path remembered for `alias`
    pub fn path(&self, alias: &str) -> Option<&str> {
        self.paths.get(alias).map(String::as_str)
    }

    /// An editor for the current identity, retrying without sleeping
    pub fn editor(&self) -> Editor {
        let retry = RetryPolicy::immediate(2);
        let documents = DocumentRepository::new(self.store.clone())
            .with_retry_policy(retry.clone())
            .with_time_provider(self.clock.as_provider());
        let assets = AssetStore::new(self.store.clone())
            .with_retry_policy(retry)
            .with_time_provider(self.clock.as_provider());
        Editor::new(documents, assets, self.gate.clone(), self.identity.clone())
    }

    /// Execute all steps
    pub async fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .await
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        self.current_step = steps.len();
        Ok(())
    }

    async fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::Create {
                alias,
                fields,
                expect,
            } => {
                let outcome = self.editor().create_document(fields.clone()).await;
                if let Some(created) = settle(outcome, expect)? {
                    self.paths.insert(alias.clone(), created.path);
                    self.docs.insert(alias.clone(), created.document);
                }
            }

            ScenarioStep::Get {
                alias,
                save_hash_as,
                expect,
            } => {
                let path = self.path_of(alias)?;
                let outcome = self.editor().get_document(&path).await;
                if let Some(read) = settle(outcome, expect)? {
                    self.hashes.insert(save_hash_as.clone(), read.hash);
                    self.docs.insert(alias.clone(), read.document);
                }
            }

            ScenarioStep::GetPath { path, expect } => {
                let outcome = self.editor().get_document(path).await;
                settle(outcome, expect)?;
            }

            ScenarioStep::Open {
                alias,
                path,
                save_hash_as,
                expect,
            } => {
                let outcome = self.editor().get_document(path).await;
                if let Some(read) = settle(outcome, expect)? {
                    self.paths.insert(alias.clone(), read.path);
                    self.hashes.insert(save_hash_as.clone(), read.hash);
                    self.docs.insert(alias.clone(), read.document);
                }
            }

            ScenarioStep::Update {
                alias,
                edit,
                with_hash,
                save_hash_as,
                expect,
            } => {
                let path = self.path_of(alias)?;
                let fields = self.edited_fields(alias, edit)?;
                let expected = self.hash_named(with_hash)?;
                let outcome = self
                    .editor()
                    .update_document(&path, fields, &expected)
                    .await;
                if let Some(updated) = settle(outcome, expect)? {
                    self.hashes.insert(save_hash_as.clone(), updated.hash);
                    self.docs.insert(alias.clone(), updated.document);
                }
            }

            ScenarioStep::Rename {
                alias,
                edit,
                with_hash,
                save_hash_as,
                expect,
            } => {
                let path = self.path_of(alias)?;
                let fields = self.edited_fields(alias, edit)?;
                let expected = self.hash_named(with_hash)?;
                let outcome = self
                    .editor()
                    .rename_document(&path, fields, &expected)
                    .await;
                if let Some(renamed) = settle(outcome, expect)? {
                    self.paths.insert(alias.clone(), renamed.path);
                    self.hashes.insert(save_hash_as.clone(), renamed.hash);
                    self.docs.insert(alias.clone(), renamed.document);
                }
            }

            ScenarioStep::Delete {
                alias,
                with_hash,
                expect,
            } => {
                let path = self.path_of(alias)?;
                let expected = self.hash_named(with_hash)?;
                let outcome = self.editor().delete_document(&path, &expected).await;
                settle(outcome, expect)?;
            }

            ScenarioStep::ExternalEdit { alias, content } => {
                let store_path = self.store_path_of(alias)?;
                let current = self.store.read(&store_path).await?;
                self.store
                    .write(&store_path, content, Some(&current.hash))
                    .await?;
            }

            ScenarioStep::Upload {
                name,
                bytes,
                expect,
            } => {
                let outcome = self.editor().upload_asset(name, bytes).await;
                if let Some(asset) = settle(outcome, expect)? {
                    self.last_upload = Some(asset);
                }
            }

            ScenarioStep::ActAs { identity } => {
                self.identity = Identity::new(identity.as_str());
            }

            ScenarioStep::Advance { duration } => {
                self.clock.advance(*duration);
            }

            ScenarioStep::FailNextStoreCalls { count } => {
                let Some(memory) = &self.memory else {
                    bail!("failure injection needs the in-memory store");
                };
                memory.fail_next(*count);
            }

            ScenarioStep::Assert { assertion } => {
                self.check_assertion(assertion).await?;
            }
        }
        Ok(())
    }

    fn path_of(&self, alias: &str) -> Result<String> {
        self.paths
            .get(alias)
            .cloned()
            .with_context(|| format!("No document created as '{}'", alias))
    }

    fn store_path_of(&self, alias: &str) -> Result<String> {
        let path = self.path_of(alias)?;
        Ok(self.editor().documents().store_path(&path))
    }

    fn hash_named(&self, name: &str) -> Result<ContentHash> {
        self.hashes
            .get(name)
            .cloned()
            .with_context(|| format!("No version saved as '{}'", name))
    }

    fn edited_fields(&self, alias: &str, edit: &super::steps::Edit) -> Result<DocumentFields> {
        let doc = self
            .docs
            .get(alias)
            .with_context(|| format!("Document '{}' was never read", alias))?;
        let mut fields = DocumentFields::from_document(doc);
        edit.apply(&mut fields);
        Ok(fields)
    }

    async fn check_assertion(&self, assertion: &Assertion) -> Result<()> {
        let editor = self.editor();
        match assertion {
            Assertion::DocumentPath { alias, path } => {
                let actual = self.path_of(alias)?;
                if &actual != path {
                    bail!("Expected '{}' at {}, found {}", alias, path, actual);
                }
            }

            Assertion::DocumentExists { alias } => {
                editor.get_document(&self.path_of(alias)?).await?;
            }

            Assertion::DocumentMissing { alias } => {
                match editor.get_document(&self.path_of(alias)?).await {
                    Err(FolioError::NotFound(_)) => {}
                    Ok(_) => bail!("Expected '{}' to be gone, but it still exists", alias),
                    Err(e) => bail!("Expected NotFound for '{}', got {}", alias, e),
                }
            }

            Assertion::BodyEquals { alias, body } => {
                let read = editor.get_document(&self.path_of(alias)?).await?;
                if &read.document.body != body {
                    bail!("Expected body {:?}, got {:?}", body, read.document.body);
                }
            }

            Assertion::TagsEqual { alias, tags } => {
                let read = editor.get_document(&self.path_of(alias)?).await?;
                if &read.document.meta.tags != tags {
                    bail!("Expected tags {:?}, got {:?}", tags, read.document.meta.tags);
                }
            }

            Assertion::CurrentHashIs { alias, hash } => {
                let read = editor.get_document(&self.path_of(alias)?).await?;
                let expected = self.hash_named(hash)?;
                if read.hash != expected {
                    bail!("Expected '{}' at version {}, found {}", alias, hash, read.hash);
                }
            }

            Assertion::HashesDiffer { a, b } => {
                if self.hash_named(a)? == self.hash_named(b)? {
                    bail!("Expected versions {} and {} to differ", a, b);
                }
            }

            Assertion::RawContains { store_path, text } => {
                let raw = self.raw_text(store_path).await?;
                if !raw.contains(text.as_str()) {
                    bail!("Expected {} to contain {:?}, got:\n{}", store_path, text, raw);
                }
            }

            Assertion::RawLacks { store_path, text } => {
                let raw = self.raw_text(store_path).await?;
                if raw.contains(text.as_str()) {
                    bail!("Expected {} not to contain {:?}", store_path, text);
                }
            }

            Assertion::BlobMissing { store_path } => match self.store.read(store_path).await {
                Err(FolioError::NotFound(_)) => {}
                Ok(_) => bail!("Expected no blob at {}", store_path),
                Err(e) => bail!("Expected NotFound at {}, got {}", store_path, e),
            },

            Assertion::ListingOrder(expected) => {
                let actual: Vec<String> = editor
                    .list_documents()
                    .await?
                    .into_iter()
                    .map(|s| s.path)
                    .collect();
                if &actual != expected {
                    bail!("Expected listing {:?}, got {:?}", expected, actual);
                }
            }

            Assertion::ListingLen(expected) => {
                let actual = editor.list_documents().await?.len();
                if actual != *expected {
                    bail!("Expected {} listed documents, got {}", expected, actual);
                }
            }

            Assertion::ListedAsMalformed { path } => {
                let listing = editor.list_documents().await?;
                let summary = listing
                    .iter()
                    .find(|s| &s.path == path)
                    .with_context(|| format!("{} is not listed", path))?;
                if !summary.is_malformed() || summary.parse_error.is_none() {
                    bail!("Expected {} to be listed as malformed", path);
                }
            }

            Assertion::DraftCount(expected) => {
                let actual = editor
                    .list_documents()
                    .await?
                    .iter()
                    .filter(|s| !s.is_published())
                    .count();
                if actual != *expected {
                    bail!("Expected {} drafts, got {}", expected, actual);
                }
            }

            Assertion::TagsExactly(expected) => {
                let index = editor.build_index().await?;
                let actual: Vec<&str> = index.tags().collect();
                if actual != *expected {
                    bail!("Expected tags {:?}, got {:?}", expected, actual);
                }
            }

            Assertion::AuthorsExactly(expected) => {
                let index = editor.build_index().await?;
                let actual: Vec<&str> = index.authors().collect();
                if actual != *expected {
                    bail!("Expected authors {:?}, got {:?}", expected, actual);
                }
            }

            Assertion::PathsForTag { tag, paths } => {
                let index = editor.build_index().await?;
                let actual = index.paths_for_tag(tag);
                if actual != *paths {
                    bail!("Expected {:?} tagged {}, got {:?}", paths, tag, actual);
                }
            }

            Assertion::AssetNames(expected) => {
                let actual: Vec<String> = editor
                    .list_assets()
                    .await?
                    .into_iter()
                    .map(|a| a.name)
                    .collect();
                if &actual != expected {
                    bail!("Expected assets {:?}, got {:?}", expected, actual);
                }
            }

            Assertion::LastUploadUrl(expected) => {
                let asset = self.last_upload.as_ref().context("Nothing was uploaded")?;
                if &asset.url != expected {
                    bail!("Expected upload at {}, got {}", expected, asset.url);
                }
            }

            Assertion::StoreCalls(expected) => {
                let memory = self
                    .memory
                    .as_ref()
                    .context("Call counting needs the in-memory store")?;
                if memory.calls() != *expected {
                    bail!("Expected {} store calls, got {}", expected, memory.calls());
                }
            }
        }
        Ok(())
    }

    async fn raw_text(&self, store_path: &str) -> Result<String> {
        let blob = self
            .store
            .read(store_path)
            .await
            .with_context(|| format!("Failed to read {}", store_path))?;
        Ok(String::from_utf8_lossy(&blob.bytes).into_owned())
    }
}

/// Checks an operation's outcome against what the step expected
fn settle<T>(outcome: folio_core::Result<T>, expect: &Expect) -> Result<Option<T>> {
    match (outcome, expect) {
        (Ok(value), Expect::Ok) => Ok(Some(value)),
        (Err(e), Expect::Ok) => Err(e.into()),
        (Err(e), Expect::Err(kind)) if kind.matches(&e) => Ok(None),
        (Err(e), Expect::Err(kind)) => bail!("Expected {:?}, got {}", kind, e),
        (Ok(_), Expect::Err(kind)) => bail!("Expected {:?}, but the operation succeeded", kind),
    }
}
