//! Mock collaborators shared by the delivery integration tests.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use ahash::AHashMap;
use async_trait::async_trait;
use ulid::Ulid;

use driftmail_common::{
    address::RecipientAddress,
    identity::{Identity, OwnIdentity},
};
use driftmail_delivery::{
    BounceNotifier, ChannelError, Contact, IdentityResolver, KeylessInserter, MatchMethod,
    NetworkError, PendingMessage, PendingStore, ResolverError, SecureChannel,
};

pub fn test_owner() -> OwnIdentity {
    OwnIdentity {
        identity_id: "own-id".to_owned(),
        nickname: "me".to_owned(),
        address_hash: "ownhash".to_owned(),
    }
}

pub fn test_identity(name: &str) -> Identity {
    Identity {
        identity_id: format!("id-{name}"),
        nickname: name.to_owned(),
        address_hash: format!("{name}hash"),
    }
}

/// How a mock channel responds to `open`.
#[derive(Debug, Clone)]
pub enum OpenBehaviour {
    Accept,
    BadAddress,
    Fatal(String),
    Unavailable(String),
}

/// One scripted response to `Contact::send`.
#[derive(Debug, Clone, Copy)]
pub enum SendStep {
    Delivered,
    Failed,
    Terminated,
}

#[derive(Debug)]
pub struct MockChannel {
    open_behaviour: OpenBehaviour,
    script: Arc<Mutex<VecDeque<SendStep>>>,
    default_step: SendStep,
    opens: Arc<AtomicUsize>,
    sends: Arc<AtomicUsize>,
}

impl MockChannel {
    /// A channel that opens successfully and answers `send` with
    /// `default_step` once any scripted steps run out.
    pub fn accepting(default_step: SendStep) -> Self {
        Self {
            open_behaviour: OpenBehaviour::Accept,
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_step,
            opens: Arc::new(AtomicUsize::new(0)),
            sends: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A channel whose `open` always fails with the given behaviour.
    pub fn refusing(open_behaviour: OpenBehaviour) -> Self {
        Self {
            open_behaviour,
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_step: SendStep::Failed,
            opens: Arc::new(AtomicUsize::new(0)),
            sends: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn push_step(&self, step: SendStep) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

struct MockContact {
    script: Arc<Mutex<VecDeque<SendStep>>>,
    default_step: SendStep,
    sends: Arc<AtomicUsize>,
}

#[async_trait]
impl Contact for MockContact {
    async fn send(&self, _message: &[u8]) -> Result<bool, NetworkError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_step);
        match step {
            SendStep::Delivered => Ok(true),
            SendStep::Failed => Ok(false),
            SendStep::Terminated => Err(NetworkError::ConnectionTerminated),
        }
    }
}

#[async_trait]
impl SecureChannel for MockChannel {
    async fn open(
        &self,
        _account_dir: &Path,
        _address: &RecipientAddress,
    ) -> Result<Box<dyn Contact>, ChannelError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match &self.open_behaviour {
            OpenBehaviour::Accept => Ok(Box::new(MockContact {
                script: Arc::clone(&self.script),
                default_step: self.default_step,
                sends: Arc::clone(&self.sends),
            })),
            OpenBehaviour::BadAddress => Err(ChannelError::BadAddress),
            OpenBehaviour::Fatal(reason) => Err(ChannelError::FatalContact(reason.clone())),
            OpenBehaviour::Unavailable(reason) => Err(ChannelError::Unavailable(reason.clone())),
        }
    }
}

/// How a mock inserter responds to every `slot_insert`.
#[derive(Debug, Clone, Copy)]
pub enum InsertBehaviour {
    Index(i64),
    Terminated,
}

#[derive(Debug)]
pub struct MockInserter {
    behaviour: InsertBehaviour,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl MockInserter {
    pub fn new(behaviour: InsertBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys_seen(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeylessInserter for MockInserter {
    async fn slot_insert(
        &self,
        _payload: &[u8],
        key_prefix: &str,
        _slot_count: u32,
        _extra: &str,
    ) -> Result<i64, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key_prefix.to_owned());
        match self.behaviour {
            InsertBehaviour::Index(index) => Ok(index),
            InsertBehaviour::Terminated => Err(NetworkError::ConnectionTerminated),
        }
    }
}

#[derive(Debug)]
pub struct MockBouncer {
    accept: AtomicBool,
    calls: Mutex<Vec<(Vec<u8>, String, String)>>,
}

impl MockBouncer {
    pub fn new(accept: bool) -> Self {
        Self {
            accept: AtomicBool::new(accept),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Vec<u8>, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BounceNotifier for MockBouncer {
    async fn bounce(&self, message: &[u8], account_id: &str, reason: &str) -> bool {
        self.calls.lock().unwrap().push((
            message.to_vec(),
            account_id.to_owned(),
            reason.to_owned(),
        ));
        self.accept.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockResolver {
    matches: Mutex<AHashMap<String, Vec<Identity>>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn new(matches: AHashMap<String, Vec<Identity>>) -> Self {
        Self {
            matches: Mutex::new(matches),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        let resolver = Self::new(AHashMap::new());
        resolver.available.store(false, Ordering::SeqCst);
        resolver
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn match_identities(
        &self,
        addresses: &[String],
        _owner: &OwnIdentity,
        _methods: &[MatchMethod],
    ) -> Result<AHashMap<String, Vec<Identity>>, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(ResolverError::ServiceUnavailable(
                "identity service not loaded".to_owned(),
            ));
        }
        let known = self.matches.lock().unwrap();
        Ok(addresses
            .iter()
            .filter_map(|addr| known.get(addr).map(|ids| (addr.clone(), ids.clone())))
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MockPendingStore {
    records: Mutex<Vec<PendingMessage>>,
    deleted: Mutex<Vec<Ulid>>,
    updated: Mutex<Vec<(Ulid, Vec<String>)>>,
}

impl MockPendingStore {
    pub fn with_records(records: Vec<PendingMessage>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<Ulid> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(Ulid, Vec<String>)> {
        self.updated.lock().unwrap().clone()
    }
}

#[async_trait]
impl PendingStore for MockPendingStore {
    async fn list_pending(&self) -> anyhow::Result<Vec<PendingMessage>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn update_pending(&self, id: Ulid, remaining: &[String]) -> anyhow::Result<()> {
        self.updated.lock().unwrap().push((id, remaining.to_vec()));
        Ok(())
    }

    async fn delete(&self, id: Ulid) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}
