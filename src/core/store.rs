//! The document store.
//!
//! Owns the in-memory universe of source documents the editor is interacting
//! with, plus every transitive source file those documents import — directly
//! by path, by package name through a build descriptor, or through a
//! translated `@cImport` block. Downstream queries (completion, hover,
//! goto-definition) read from the store; they depend on it exposing a
//! consistent dependency graph at all times.
//!
//! The store assumes exclusive mutation by a single driver. There is no
//! internal locking; sub-process invocations (build runner, C translator)
//! block the calling thread.

use crate::analysis::{self, DocumentScope, NodeIndex};
use crate::config::Config;
use crate::core::build_file::{self, BuildConfig, BuildFile};
use crate::core::document::{CimportEntry, Handle};
use crate::core::hash::ContentHash;
use crate::core::walker::{AncestorBuildFiles, BUILD_FILE_NAME};
use crate::traits::{CTranslator, Translation};
use crate::uri;
use anyhow::{anyhow, Result};
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use indexmap::IndexMap;
use lsp_types::{CompletionItem, Uri};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Cached outcome of translating one `@cImport` block, keyed by the content
/// hash of the rendered C source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CimportResult {
    /// The translated Zig source lives at this URI.
    Success { uri: Uri },
    /// Translation failed. Cached so retries stay cheap until the source
    /// changes; carries no payload but owns its (future) diagnostics.
    Failure,
}

/// The document graph and its caches.
#[derive(Debug)]
pub struct DocumentStore {
    /// uri -> handle, insertion order preserved.
    handles: IndexMap<Uri, Handle>,
    /// uri -> build descriptor, for every build file ever probed.
    build_files: HashMap<Uri, BuildFile>,
    /// content hash -> translation outcome, shared across all handles.
    cimports: HashMap<ContentHash, CimportResult>,
    config: Arc<Config>,
    translator: Arc<dyn CTranslator>,
    /// URIs mid-construction. The build-membership probe materializes
    /// documents; this set keeps it from re-entering one that is currently
    /// being built further up the call stack.
    loading: HashSet<Uri>,
}

impl DocumentStore {
    pub fn new(config: Arc<Config>, translator: Arc<dyn CTranslator>) -> Self {
        Self {
            handles: IndexMap::new(),
            build_files: HashMap::new(),
            cimports: HashMap::new(),
            config,
            translator,
            loading: HashSet::new(),
        }
    }

    // ── Query surface ─────────────────────────────────────────────────

    /// Non-owning lookup. A miss is logged: callers hold URIs the driver
    /// gave them, so a miss usually means a protocol-level mixup.
    pub fn get_handle(&self, uri: &Uri) -> Option<&Handle> {
        let handle = self.handles.get(uri);
        if handle.is_none() {
            warn!(uri = uri.as_str(), "no handle for document");
        }
        handle
    }

    pub fn handles(&self) -> impl Iterator<Item = (&Uri, &Handle)> {
        self.handles.iter()
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    pub fn build_file(&self, uri: &Uri) -> Option<&BuildFile> {
        self.build_files.get(uri)
    }

    /// Number of entries in the cimport cache (success and failure).
    pub fn cimport_cache_len(&self) -> usize {
        self.cimports.len()
    }

    /// Open a document with the text the editor supplied. If a handle
    /// already exists (it was materialized as a dependency earlier), it is
    /// marked open and returned as-is; the editor's text is authoritative
    /// only via a subsequent refresh.
    pub fn open_document(&mut self, uri: &Uri, text: &str) -> Result<&Handle> {
        if let Some(handle) = self.handles.get_mut(uri) {
            if handle.open {
                warn!(uri = uri.as_str(), "document already open");
            }
            handle.open = true;
        } else {
            let handle = self.create_document(uri.clone(), text.to_owned(), true)?;
            self.handles.insert(uri.clone(), handle);
            self.ensure_dependencies_processed(uri);
        }
        self.handles
            .get(uri)
            .ok_or_else(|| anyhow!("document disappeared during open: {}", uri.as_str()))
    }

    /// Clear the open flag and collect everything no longer reachable.
    pub fn close_document(&mut self, uri: &Uri) {
        match self.handles.get_mut(uri) {
            Some(handle) => {
                if !handle.open {
                    warn!(uri = uri.as_str(), "closing a document that is not open");
                }
                handle.open = false;
            }
            None => {
                warn!(uri = uri.as_str(), "closing unknown document");
                return;
            }
        }
        self.garbage_collection();
    }

    /// Replace a document's text wholesale and rebuild the derived state.
    ///
    /// Imports are re-resolved and newly appearing dependencies are
    /// materialized before this returns.
    pub fn refresh_document(&mut self, uri: &Uri, text: String) -> Result<()> {
        if !self.handles.contains_key(uri) {
            warn!(uri = uri.as_str(), "refresh for unknown document");
            return Ok(());
        }

        let tree = analysis::parse(&text)?;
        let document_scope = DocumentScope::build(&tree);
        let cimports = collect_cimports(&tree, &text);
        let associated = self
            .handles
            .get(uri)
            .and_then(|handle| handle.associated_build_file.clone());
        let import_uris = self.resolve_import_uris(uri, &tree, associated.as_ref());

        if let Some(handle) = self.handles.get_mut(uri) {
            handle.text = text;
            handle.tree = tree;
            handle.document_scope = document_scope;
            handle.import_uris = import_uris;
            handle.cimports = cimports;
        }

        self.ensure_cimports_processed(uri);
        self.ensure_dependencies_processed(uri);
        Ok(())
    }

    /// For build files, re-run the build runner and replace the descriptor.
    /// On failure the previous descriptor is kept.
    pub fn apply_save(&mut self, uri: &Uri) {
        let Some(handle) = self.handles.get(uri) else {
            warn!(uri = uri.as_str(), "save for unknown document");
            return;
        };
        if !handle.is_build_file {
            return;
        }
        let Some(path) = uri::to_file_path(uri) else {
            return;
        };
        let build_options = self
            .build_files
            .get(uri)
            .and_then(|bf| bf.associated_config.as_ref())
            .and_then(|cfg| cfg.build_options.clone())
            .unwrap_or_default();

        match build_file::load_build_config(&self.config, &path, &build_options) {
            Ok(config) => {
                if let Some(build_file) = self.build_files.get_mut(uri) {
                    build_file.config = config;
                }
            }
            Err(err) => {
                error!(
                    uri = uri.as_str(),
                    error = %err,
                    "build runner failed on save, keeping previous configuration"
                );
            }
        }
    }

    /// Resolve the `@cImport` directive at `node` to its translated URI.
    pub fn resolve_c_import(&self, handle: &Handle, node: NodeIndex) -> Option<Uri> {
        let entry = handle.cimports.iter().find(|entry| entry.node == node)?;
        match self.cimports.get(&entry.hash)? {
            CimportResult::Success { uri } => Some(uri.clone()),
            CimportResult::Failure => None,
        }
    }

    /// Error-tag completions for `handle`, aggregated over its direct
    /// imports and successful cimport targets. The buffer is allocated from
    /// the caller's arena; duplicates by label are collapsed.
    pub fn error_completion_items<'s, 'b>(
        &'s self,
        arena: &'b Bump,
        handle: &'s Handle,
    ) -> BumpVec<'b, &'s CompletionItem> {
        self.aggregate_completions(arena, handle, |scope| scope.error_completions.as_slice())
    }

    /// Enum-tag completions, same aggregation as error tags.
    pub fn enum_completion_items<'s, 'b>(
        &'s self,
        arena: &'b Bump,
        handle: &'s Handle,
    ) -> BumpVec<'b, &'s CompletionItem> {
        self.aggregate_completions(arena, handle, |scope| scope.enum_completions.as_slice())
    }

    fn aggregate_completions<'s, 'b>(
        &'s self,
        arena: &'b Bump,
        handle: &'s Handle,
        select: impl Fn(&'s DocumentScope) -> &'s [CompletionItem],
    ) -> BumpVec<'b, &'s CompletionItem> {
        let mut items = BumpVec::new_in(arena);
        let mut seen: HashSet<&str> = HashSet::new();

        for item in select(&handle.document_scope) {
            if seen.insert(&item.label) {
                items.push(item);
            }
        }
        for import_uri in &handle.import_uris {
            if let Some(dep) = self.handles.get(import_uri) {
                for item in select(&dep.document_scope) {
                    if seen.insert(&item.label) {
                        items.push(item);
                    }
                }
            }
        }
        for entry in &handle.cimports {
            if let Some(CimportResult::Success { uri }) = self.cimports.get(&entry.hash) {
                if let Some(dep) = self.handles.get(uri) {
                    for item in select(&dep.document_scope) {
                        if seen.insert(&item.label) {
                            items.push(item);
                        }
                    }
                }
            }
        }
        items
    }

    /// Append fresh copies of `handle`'s dependency URIs to `sink`:
    /// resolved imports, successful cimport targets, then the packages of
    /// the associated build file.
    pub fn collect_dependencies(&self, handle: &Handle, sink: &mut Vec<Uri>) {
        sink.extend(handle.import_uris.iter().cloned());
        for entry in &handle.cimports {
            if let Some(CimportResult::Success { uri }) = self.cimports.get(&entry.hash) {
                sink.push(uri.clone());
            }
        }
        if let Some(build_uri) = &handle.associated_build_file {
            if let Some(build_file) = self.build_files.get(build_uri) {
                for package in &build_file.config.packages {
                    if let Some(package_uri) = uri::from_path(&package.path) {
                        sink.push(package_uri);
                    }
                }
            }
        }
    }

    // ── Import resolution ─────────────────────────────────────────────

    /// Resolve an import string against a handle, per the resolution policy:
    /// `"std"` from the configured library path, `"builtin"` from the build
    /// file override or the configured fallback, bare identifiers as named
    /// packages, and `.zig` paths relative to the importing document.
    pub fn uri_from_import_str(&self, handle: &Handle, import_str: &str) -> Option<Uri> {
        self.resolve_import(
            &handle.uri,
            handle.associated_build_file.as_ref(),
            import_str,
        )
    }

    fn resolve_import(
        &self,
        document_uri: &Uri,
        associated_build_file: Option<&Uri>,
        import_str: &str,
    ) -> Option<Uri> {
        match import_str {
            "std" => {
                let lib_path = self.config.zig_lib_path.as_ref()?;
                let resolved = uri::from_path(&lib_path.join("std").join("std.zig"))?;
                self.finalize_resolution(resolved)
            }
            "builtin" => {
                if let Some(build_uri) = associated_build_file {
                    if let Some(builtin_uri) = self
                        .build_files
                        .get(build_uri)
                        .and_then(|bf| bf.builtin_uri.clone())
                    {
                        return self.finalize_resolution(builtin_uri);
                    }
                }
                let fallback = self.config.builtin_path.as_ref()?;
                let resolved = uri::from_path(fallback)?;
                self.finalize_resolution(resolved)
            }
            name if !name.ends_with(".zig") => {
                let build_uri = associated_build_file?;
                let build_file = self.build_files.get(build_uri)?;
                let package = build_file
                    .config
                    .packages
                    .iter()
                    .find(|package| package.name == name)?;
                let resolved = uri::from_path(&package.path)?;
                self.finalize_resolution(resolved)
            }
            relative => {
                let resolved = uri::resolve_relative(document_uri, relative)?;
                self.finalize_resolution(resolved)
            }
        }
    }

    /// An import only resolves if its target can actually be materialized:
    /// it already has a handle, or its file is accessible. Unresolvable
    /// imports are dropped at collection time.
    fn finalize_resolution(&self, resolved: Uri) -> Option<Uri> {
        if self.handles.contains_key(&resolved) {
            return Some(resolved);
        }
        let path = uri::to_file_path(&resolved)?;
        if std::fs::metadata(&path).is_ok() {
            Some(resolved)
        } else {
            None
        }
    }

    fn resolve_import_uris(
        &self,
        document_uri: &Uri,
        tree: &analysis::Tree,
        associated_build_file: Option<&Uri>,
    ) -> Vec<Uri> {
        tree.import_names()
            .filter_map(|name| self.resolve_import(document_uri, associated_build_file, name))
            .collect()
    }

    // ── Document factory ──────────────────────────────────────────────

    /// Parse `text` and assemble a handle. Takes ownership of both; on a
    /// parse error the caller's copies are simply dropped.
    fn create_document(&mut self, uri: Uri, text: String, open: bool) -> Result<Handle> {
        self.loading.insert(uri.clone());
        let result = self.create_document_inner(uri.clone(), text, open);
        self.loading.remove(&uri);
        result
    }

    fn create_document_inner(&mut self, uri: Uri, text: String, open: bool) -> Result<Handle> {
        let tree = analysis::parse(&text)?;
        let document_scope = DocumentScope::build(&tree);
        let cimports = collect_cimports(&tree, &text);

        let mut is_build_file = false;
        let mut associated_build_file = None;
        if self.config.build_discovery_enabled() && !uri::has_path_segment(&uri, "std") {
            if uri::file_name_is(&uri, BUILD_FILE_NAME) {
                self.ensure_build_file(&uri);
                is_build_file = true;
            } else {
                associated_build_file = self.associate_with_build_file(&uri);
            }
        }

        let import_uris = self.resolve_import_uris(&uri, &tree, associated_build_file.as_ref());

        Ok(Handle {
            uri,
            text,
            tree,
            document_scope,
            open,
            import_uris,
            cimports,
            associated_build_file,
            is_build_file,
        })
    }

    /// Read the document's file and construct a handle for it.
    fn create_document_from_uri(&mut self, uri: &Uri, open: bool) -> Result<Handle> {
        let path = uri::to_file_path(uri)
            .ok_or_else(|| anyhow!("not a file URI: {}", uri.as_str()))?;
        let text = std::fs::read_to_string(&path)?;
        self.create_document(uri.clone(), text, open)
    }

    // ── Build-file association ────────────────────────────────────────

    fn ensure_build_file(&mut self, uri: &Uri) {
        if self.build_files.contains_key(uri) {
            return;
        }
        let build_file = self.create_build_file(uri);
        self.build_files.insert(uri.clone(), build_file);
    }

    fn create_build_file(&self, uri: &Uri) -> BuildFile {
        let Some(path) = uri::to_file_path(uri) else {
            return BuildFile::empty(uri.clone());
        };
        let build_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));

        let associated_config = build_file::load_side_config(&build_dir);
        let builtin_uri = associated_config
            .as_ref()
            .and_then(|cfg| cfg.relative_builtin_path.as_ref())
            .and_then(|relative| uri::from_path(&build_dir.join(relative)));
        let build_options = associated_config
            .as_ref()
            .and_then(|cfg| cfg.build_options.clone())
            .unwrap_or_default();

        let config = match build_file::load_build_config(&self.config, &path, &build_options) {
            Ok(config) => config,
            Err(err) => {
                error!(uri = uri.as_str(), error = %err, "failed to load build configuration");
                BuildConfig::default()
            }
        };

        BuildFile {
            uri: uri.clone(),
            config,
            builtin_uri,
            associated_config,
        }
    }

    /// Walk ancestor build files and pick the one governing `uri`: the
    /// nearest whose package graph provably reaches the document, else the
    /// nearest ancestor outright.
    fn associate_with_build_file(&mut self, uri: &Uri) -> Option<Uri> {
        let path = uri::to_file_path(uri)?;
        let path_str = path.to_str()?.to_owned();
        let ancestors: Vec<PathBuf> = AncestorBuildFiles::new(&path_str).collect();

        for build_path in ancestors.iter().rev() {
            let Some(build_uri) = uri::from_path(build_path) else {
                continue;
            };
            self.ensure_build_file(&build_uri);
            if self.uri_associated_with_build(&build_uri, uri) {
                return Some(build_uri);
            }
        }

        ancestors.last().and_then(|path| uri::from_path(path))
    }

    /// Membership probe: is `uri` one of the build file's package roots, or
    /// transitively imported from one?
    fn uri_associated_with_build(&mut self, build_uri: &Uri, uri: &Uri) -> bool {
        let package_uris: Vec<Uri> = self
            .build_files
            .get(build_uri)
            .map(|build_file| {
                build_file
                    .config
                    .packages
                    .iter()
                    .filter_map(|package| uri::from_path(&package.path))
                    .collect()
            })
            .unwrap_or_default();

        let mut visited = HashSet::new();
        for package_uri in package_uris {
            if package_uri == *uri {
                return true;
            }
            if self.uri_in_imports(&mut visited, &package_uri, uri) {
                return true;
            }
        }
        false
    }

    fn uri_in_imports(
        &mut self,
        visited: &mut HashSet<Uri>,
        source_uri: &Uri,
        target: &Uri,
    ) -> bool {
        if !visited.insert(source_uri.clone()) {
            return false;
        }
        if !self.handles.contains_key(source_uri) {
            if self.loading.contains(source_uri) {
                return false;
            }
            match self.create_document_from_uri(source_uri, false) {
                Ok(handle) => {
                    self.handles.insert(source_uri.clone(), handle);
                }
                Err(err) => {
                    debug!(
                        uri = source_uri.as_str(),
                        error = %err,
                        "could not load document for membership probe"
                    );
                    return false;
                }
            }
        }

        let imports: Vec<Uri> = self
            .handles
            .get(source_uri)
            .map(|handle| handle.import_uris.clone())
            .unwrap_or_default();
        for import_uri in imports {
            if import_uri == *target {
                return true;
            }
            if self.uri_in_imports(visited, &import_uri, target) {
                return true;
            }
        }
        false
    }

    // ── Graph maintenance ─────────────────────────────────────────────

    /// Transitively materialize everything `uri` depends on. Dependencies
    /// that fail to load are logged and skipped; the graph stays best-effort.
    fn ensure_dependencies_processed(&mut self, uri: &Uri) {
        let mut queue: VecDeque<Uri> = VecDeque::new();
        if let Some(handle) = self.handles.get(uri) {
            let mut seed = Vec::new();
            self.collect_dependencies(handle, &mut seed);
            queue.extend(seed);
        }

        while let Some(dep_uri) = queue.pop_front() {
            if self.handles.contains_key(&dep_uri) {
                continue;
            }
            let handle = match self.create_document_from_uri(&dep_uri, false) {
                Ok(handle) => handle,
                Err(err) => {
                    debug!(uri = dep_uri.as_str(), error = %err, "failed to load dependency");
                    continue;
                }
            };
            self.handles.insert(dep_uri.clone(), handle);
            self.ensure_cimports_processed(&dep_uri);

            if let Some(handle) = self.handles.get(&dep_uri) {
                let mut next = Vec::new();
                self.collect_dependencies(handle, &mut next);
                queue.extend(next);
            }
        }

        self.ensure_cimports_processed(uri);
    }

    /// Translate every cimport of `uri` that is not already cached. A
    /// successful translation also materializes a handle for its output.
    fn ensure_cimports_processed(&mut self, uri: &Uri) {
        let Some(handle) = self.handles.get(uri) else {
            return;
        };
        let include_dirs: Vec<PathBuf> = handle
            .associated_build_file
            .as_ref()
            .and_then(|build_uri| self.build_files.get(build_uri))
            .map(|build_file| {
                build_file
                    .config
                    .include_dirs
                    .iter()
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();
        let pending: Vec<(ContentHash, String)> = handle
            .cimports
            .iter()
            .filter(|entry| !self.cimports.contains_key(&entry.hash))
            .map(|entry| (entry.hash, entry.source.clone()))
            .collect();

        for (hash, source) in pending {
            if self.cimports.contains_key(&hash) {
                continue;
            }
            match self.translator.translate(&source, &include_dirs) {
                Some(Translation::Success(translated_uri)) => {
                    self.cimports.insert(
                        hash,
                        CimportResult::Success {
                            uri: translated_uri.clone(),
                        },
                    );
                    if !self.handles.contains_key(&translated_uri) {
                        match self.create_document_from_uri(&translated_uri, false) {
                            Ok(handle) => {
                                self.handles.insert(translated_uri.clone(), handle);
                            }
                            Err(err) => {
                                debug!(
                                    uri = translated_uri.as_str(),
                                    error = %err,
                                    "failed to load translated cimport output"
                                );
                            }
                        }
                    }
                }
                Some(Translation::Failure) => {
                    self.cimports.insert(hash, CimportResult::Failure);
                }
                None => {
                    debug!(uri = uri.as_str(), "transient cimport translation failure");
                }
            }
        }
    }

    /// Mark-and-sweep over the dependency digraph rooted at open handles.
    /// Everything unreachable is removed; the cimport cache is swept after.
    pub fn garbage_collection(&mut self) {
        let mut reachable: HashSet<Uri> = HashSet::new();
        let mut queue: Vec<Uri> = Vec::new();

        for (handle_uri, handle) in &self.handles {
            if handle.open {
                reachable.insert(handle_uri.clone());
                self.collect_dependencies(handle, &mut queue);
            }
        }

        while let Some(dep_uri) = queue.pop() {
            if !reachable.insert(dep_uri.clone()) {
                continue;
            }
            if let Some(handle) = self.handles.get(&dep_uri) {
                self.collect_dependencies(handle, &mut queue);
            }
        }

        let before = self.handles.len();
        self.handles.retain(|handle_uri, _| reachable.contains(handle_uri));
        let swept = before - self.handles.len();
        if swept > 0 {
            debug!(swept, remaining = self.handles.len(), "collected documents");
        }

        self.garbage_collection_cimports();
    }

    /// Drop every cimport cache entry whose hash no live handle references.
    fn garbage_collection_cimports(&mut self) {
        let live: HashSet<ContentHash> = self
            .handles
            .values()
            .flat_map(|handle| handle.cimports.iter().map(|entry| entry.hash))
            .collect();
        self.cimports.retain(|hash, _| live.contains(hash));
    }
}

fn collect_cimports(tree: &analysis::Tree, text: &str) -> Vec<CimportEntry> {
    let mut entries = Vec::new();
    for node in tree.cimport_nodes() {
        match analysis::convert_c_include(tree, text, node) {
            Ok(source) => {
                let hash = ContentHash::of(source.as_bytes());
                entries.push(CimportEntry { node, hash, source });
            }
            // Blocks with untranslatable constructs are dropped.
            Err(_) => {}
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTranslator;
    use std::str::FromStr;

    fn store() -> DocumentStore {
        DocumentStore::new(
            Arc::new(Config::default()),
            Arc::new(MockTranslator::default()),
        )
    }

    fn test_uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    #[test]
    fn test_open_document_inserts_open_handle() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        let handle = store.open_document(&uri, "const x = 1;").unwrap();
        assert!(handle.open);
        assert_eq!(handle.uri, uri);
        assert_eq!(store.handle_count(), 1);
    }

    #[test]
    fn test_handle_key_matches_uri_field() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store.open_document(&uri, "const x = 1;").unwrap();
        for (key, handle) in store.handles() {
            assert_eq!(*key, handle.uri);
        }
    }

    #[test]
    fn test_open_close_leaves_store_empty() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store.open_document(&uri, "const x = 1;").unwrap();
        store.close_document(&uri);
        assert_eq!(store.handle_count(), 0);
        assert_eq!(store.cimport_cache_len(), 0);
    }

    #[test]
    fn test_reopen_existing_handle_sets_flag() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store.open_document(&uri, "const x = 1;").unwrap();
        // Second open of the same URI keeps the handle and just re-flags it.
        let handle = store.open_document(&uri, "ignored").unwrap();
        assert!(handle.open);
        assert_eq!(handle.text, "const x = 1;");
        assert_eq!(store.handle_count(), 1);
    }

    #[test]
    fn test_open_propagates_parse_errors() {
        let mut store = store();
        let uri = test_uri("file:///broken.zig");
        let result = store.open_document(&uri, "const s = \"unterminated\nconst t = 1;");
        assert!(result.is_err());
        assert_eq!(store.handle_count(), 0);
    }

    #[test]
    fn test_get_handle_miss_returns_none() {
        let store = store();
        assert!(store.get_handle(&test_uri("file:///missing.zig")).is_none());
    }

    #[test]
    fn test_close_unknown_document_is_noop() {
        let mut store = store();
        store.close_document(&test_uri("file:///missing.zig"));
        assert_eq!(store.handle_count(), 0);
    }

    #[test]
    fn test_unresolved_import_dropped() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        let handle = store
            .open_document(&uri, "const missing = @import(\"nonexistent.zig\");")
            .unwrap();
        assert!(handle.import_uris.is_empty());
        assert_eq!(store.handle_count(), 1);
    }

    #[test]
    fn test_std_import_unresolved_without_lib_path() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        let handle = store
            .open_document(&uri, "const std = @import(\"std\");")
            .unwrap();
        assert!(handle.import_uris.is_empty());
    }

    #[test]
    fn test_builtin_falls_back_to_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = dir.path().join("builtin.zig");
        std::fs::write(&builtin, "pub const os = .linux;").unwrap();

        let config = Config {
            builtin_path: Some(builtin.clone()),
            ..Config::default()
        };
        let mut store = DocumentStore::new(
            Arc::new(config),
            Arc::new(MockTranslator::default()),
        );
        let uri = test_uri("file:///a.zig");
        let handle = store
            .open_document(&uri, "const builtin = @import(\"builtin\");")
            .unwrap();
        assert_eq!(handle.import_uris, vec![crate::uri::from_path(&builtin).unwrap()]);
    }

    #[test]
    fn test_refresh_replaces_derived_state() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store
            .open_document(&uri, "const E = error{ One };")
            .unwrap();
        store
            .refresh_document(&uri, "const E = error{ Two, Three };".to_owned())
            .unwrap();
        let handle = store.get_handle(&uri).unwrap();
        assert_eq!(handle.document_scope.error_completions.len(), 2);
        assert_eq!(handle.text, "const E = error{ Two, Three };");
    }

    #[test]
    fn test_refresh_is_deterministic() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store.open_document(&uri, "const x = 1;").unwrap();

        let text = "const E = error{ A };\nconst c = @cImport({ @cInclude(\"a.h\"); });";
        store.refresh_document(&uri, text.to_owned()).unwrap();
        let first: Vec<ContentHash> = store
            .get_handle(&uri)
            .unwrap()
            .cimports
            .iter()
            .map(|entry| entry.hash)
            .collect();
        let first_imports = store.get_handle(&uri).unwrap().import_uris.clone();

        store.refresh_document(&uri, text.to_owned()).unwrap();
        let handle = store.get_handle(&uri).unwrap();
        let second: Vec<ContentHash> =
            handle.cimports.iter().map(|entry| entry.hash).collect();
        assert_eq!(first, second);
        assert_eq!(first_imports, handle.import_uris);
    }

    #[test]
    fn test_collect_dependencies_idempotent() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store
            .open_document(&uri, "const c = @cImport({ @cInclude(\"a.h\"); });")
            .unwrap();
        let handle = store.get_handle(&uri).unwrap();
        let mut first = Vec::new();
        store.collect_dependencies(handle, &mut first);
        let mut second = Vec::new();
        store.collect_dependencies(handle, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cimport_failure_cached() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        // MockTranslator treats sources containing "fail.h" as untranslatable.
        store
            .open_document(&uri, "const c = @cImport({ @cInclude(\"fail.h\"); });")
            .unwrap();
        assert_eq!(store.cimport_cache_len(), 1);
        let handle = store.get_handle(&uri).unwrap();
        let node = handle.cimports[0].node;
        assert!(store.resolve_c_import(handle, node).is_none());
    }

    #[test]
    fn test_error_completions_deduplicate_by_label() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store
            .open_document(&uri, "const A = error{ Dup };\nconst B = error{ Dup, Other };")
            .unwrap();
        let handle = store.get_handle(&uri).unwrap();
        let arena = Bump::new();
        let items = store.error_completion_items(&arena, handle);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["Dup", "Other"]);
    }

    #[test]
    fn test_enum_completions_from_own_scope() {
        let mut store = store();
        let uri = test_uri("file:///a.zig");
        store
            .open_document(&uri, "const Color = enum { red, green };")
            .unwrap();
        let handle = store.get_handle(&uri).unwrap();
        let arena = Bump::new();
        let items = store.enum_completion_items(&arena, handle);
        assert_eq!(items.len(), 2);
    }
}
