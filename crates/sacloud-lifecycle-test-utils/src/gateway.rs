//! In-memory gateway
//!
//! `FakeGateway` serves scripted resource snapshots and records every call so
//! tests can assert on fetch counts and attach side effects.

use sacloud_lifecycle_common::{
    GatewayError, Resource, ResourceGateway, ResourceId, ResourceKind, SearchResult,
};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Mutex, MutexGuard};

type Key = (ResourceKind, ResourceId);

/// One scripted answer to a read
#[derive(Debug, Clone)]
enum Step {
    Snapshot(Resource),
    Failure(String),
}

/// Sequence of answers; the last one repeats forever
#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
}

impl Script {
    fn next(&mut self) -> Option<Step> {
        if self.steps.len() > 1 {
            self.steps.pop_front()
        } else {
            self.steps.front().cloned()
        }
    }

    fn current(&self) -> Option<&Resource> {
        self.steps.iter().find_map(|s| match s {
            Step::Snapshot(r) => Some(r),
            Step::Failure(_) => None,
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    scripts: HashMap<Key, Script>,
    reads: Vec<Key>,
    searches: Vec<(ResourceKind, String, usize)>,
    attachments: Vec<(ResourceId, ResourceId)>,
    attach_failure: Option<String>,
    search_failure: Option<String>,
}

/// Scriptable in-memory `ResourceGateway`
#[derive(Debug, Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the state from other assertions
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a resource that always reads the same
    pub fn insert(&self, resource: Resource) -> &Self {
        let key = (resource.kind, resource.id);
        let mut script = Script::default();
        script.steps.push_back(Step::Snapshot(resource));
        self.lock().scripts.insert(key, script);
        self
    }

    /// Register a sequence of snapshots returned by successive reads.
    ///
    /// The final snapshot is repeated once the sequence is exhausted.
    pub fn script(&self, snapshots: impl IntoIterator<Item = Resource>) -> &Self {
        let mut inner = self.lock();
        for resource in snapshots {
            let key = (resource.kind, resource.id);
            inner
                .scripts
                .entry(key)
                .or_default()
                .steps
                .push_back(Step::Snapshot(resource));
        }
        self
    }

    /// Append a failing read to a resource's script
    pub fn push_read_failure(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        message: impl Into<String>,
    ) -> &Self {
        self.lock()
            .scripts
            .entry((kind, id))
            .or_default()
            .steps
            .push_back(Step::Failure(message.into()));
        self
    }

    /// Make every subsequent attach fail
    pub fn fail_attach(&self, message: impl Into<String>) -> &Self {
        self.lock().attach_failure = Some(message.into());
        self
    }

    /// Make every subsequent search fail
    pub fn fail_search(&self, message: impl Into<String>) -> &Self {
        self.lock().search_failure = Some(message.into());
        self
    }

    /// Number of reads issued for one resource
    pub fn read_count(&self, kind: ResourceKind, id: ResourceId) -> usize {
        self.lock().reads.iter().filter(|k| **k == (kind, id)).count()
    }

    /// Number of reads issued overall
    pub fn total_reads(&self) -> usize {
        self.lock().reads.len()
    }

    /// Ids read, in call order
    pub fn reads(&self) -> Vec<(ResourceKind, ResourceId)> {
        self.lock().reads.clone()
    }

    /// Searches issued, in call order
    pub fn searches(&self) -> Vec<(ResourceKind, String, usize)> {
        self.lock().searches.clone()
    }

    /// Successful attachments as `(target, reference)` pairs
    pub fn attachments(&self) -> Vec<(ResourceId, ResourceId)> {
        self.lock().attachments.clone()
    }
}

fn transport(message: &str) -> GatewayError {
    GatewayError::transport(
        message.to_string(),
        io::Error::new(io::ErrorKind::ConnectionReset, message.to_string()),
    )
}

impl ResourceGateway for FakeGateway {
    async fn read_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Resource, GatewayError> {
        let mut inner = self.lock();
        inner.reads.push((kind, id));
        match inner.scripts.get_mut(&(kind, id)).and_then(Script::next) {
            Some(Step::Snapshot(resource)) => Ok(resource),
            Some(Step::Failure(message)) => Err(transport(&message)),
            None => Err(GatewayError::NotFound { kind, id }),
        }
    }

    async fn search_by_name_prefix(
        &self,
        kind: ResourceKind,
        token: &str,
        limit: usize,
    ) -> Result<SearchResult, GatewayError> {
        let mut inner = self.lock();
        inner.searches.push((kind, token.to_string(), limit));
        if let Some(message) = &inner.search_failure {
            return Err(transport(message));
        }

        let mut matches: Vec<Resource> = inner
            .scripts
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .filter_map(|(_, script)| script.current())
            .filter(|r| r.name.starts_with(token))
            .cloned()
            .collect();
        matches.sort_by_key(|r| r.id);

        let total = matches.len() as u64;
        matches.truncate(limit);
        Ok(SearchResult {
            total,
            resources: matches,
        })
    }

    async fn attach_reference(
        &self,
        target: ResourceId,
        reference: ResourceId,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        if let Some(message) = &inner.attach_failure {
            return Err(GatewayError::Api {
                status: 409,
                message: message.clone(),
            });
        }
        if !inner.attachments.contains(&(target, reference)) {
            inner.attachments.push((target, reference));
        }
        Ok(())
    }
}
