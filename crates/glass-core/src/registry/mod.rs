mod stop;
pub use stop::{StopHandle, StopSignal, stop_pair};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use glass_model::{CommandId, SessionId};
use tracing::{debug, trace};

use crate::error::CoreError;

/// Bookkeeping for one running invocation.
#[derive(Clone, Debug)]
pub struct CommandEntry {
    pub session: SessionId,
    pub command_line: String,
    pub started_at: SystemTime,
    pub stop: StopHandle,
}

impl CommandEntry {
    pub fn new(session: impl Into<SessionId>, command_line: impl Into<String>, stop: StopHandle) -> Self {
        Self {
            session: session.into(),
            command_line: command_line.into(),
            started_at: SystemTime::now(),
            stop,
        }
    }
}

/// Table of running invocations keyed by command id.
///
/// The registry never owns a process. It only routes stop requests, so any caller that knows
/// a command id can stop it, regardless of which connection started it.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    inner: Arc<Mutex<HashMap<CommandId, CommandEntry>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CommandId, CommandEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new invocation. A live entry with the same id is left untouched.
    pub fn insert(&self, id: CommandId, entry: CommandEntry) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if inner.contains_key(&id) {
            return Err(CoreError::DuplicateCommand(id));
        }
        trace!(target: "glass.core", command_id = %id, session = %entry.session, "command registered");
        inner.insert(id, entry);
        Ok(())
    }

    /// Drop an entry. Returns `true` only for the call that actually removed it.
    pub fn remove(&self, id: &CommandId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            trace!(target: "glass.core", command_id = %id, "command unregistered");
        }
        removed
    }

    /// Forward a stop request to the invocation's supervisor.
    ///
    /// Unknown ids and already-signalled invocations yield `false`.
    pub fn stop(&self, id: &CommandId) -> bool {
        let handle = self.lock().get(id).map(|e| e.stop.clone());
        let Some(handle) = handle else {
            debug!(target: "glass.core", command_id = %id, "stop requested for unknown command");
            return false;
        };
        let delivered = handle.signal();
        debug!(target: "glass.core", command_id = %id, delivered, "stop requested");
        delivered
    }

    pub fn contains(&self, id: &CommandId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn get(&self, id: &CommandId) -> Option<CommandEntry> {
        self.lock().get(id).cloned()
    }

    pub fn session_of(&self, id: &CommandId) -> Option<SessionId> {
        self.lock().get(id).map(|e| e.session.clone())
    }

    /// Ids of every running command started by `session`.
    pub fn by_session(&self, session: &str) -> Vec<CommandId> {
        self.lock()
            .iter()
            .filter(|(_, e)| e.session == session)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(session: &str) -> (CommandEntry, StopSignal) {
        let (handle, signal) = stop_pair();
        (CommandEntry::new(session, "ping -c 4 1.1.1.1", handle), signal)
    }

    #[test]
    fn insert_and_lookup() {
        let reg = CommandRegistry::new();
        let id = CommandId::from("ping-1.1.1.1-s1");
        let (e, _signal) = entry("s1");

        reg.insert(id.clone(), e).unwrap();
        assert!(reg.contains(&id));
        assert_eq!(reg.session_of(&id).as_deref(), Some("s1"));
        assert_eq!(reg.get(&id).unwrap().command_line, "ping -c 4 1.1.1.1");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_live_id_is_rejected() {
        let reg = CommandRegistry::new();
        let id = CommandId::from("dup");
        let (first, _s1) = entry("s1");
        let (second, _s2) = entry("s2");

        reg.insert(id.clone(), first).unwrap();
        assert!(matches!(
            reg.insert(id.clone(), second),
            Err(CoreError::DuplicateCommand(_))
        ));
        assert_eq!(reg.session_of(&id).as_deref(), Some("s1"));
    }

    #[test]
    fn remove_happens_exactly_once() {
        let reg = CommandRegistry::new();
        let id = CommandId::from("once");
        let (e, _signal) = entry("s1");

        reg.insert(id.clone(), e).unwrap();
        assert!(reg.remove(&id));
        assert!(!reg.remove(&id));
        assert!(reg.is_empty());
    }

    #[test]
    fn id_can_be_reused_after_removal() {
        let reg = CommandRegistry::new();
        let id = CommandId::from("again");
        let (a, _sa) = entry("s1");
        let (b, _sb) = entry("s1");

        reg.insert(id.clone(), a).unwrap();
        reg.remove(&id);
        assert!(reg.insert(id, b).is_ok());
    }

    #[test]
    fn stop_unknown_is_false() {
        let reg = CommandRegistry::new();
        assert!(!reg.stop(&CommandId::from("nope")));
        assert!(reg.is_empty());
    }

    #[test]
    fn stop_is_delivered_once() {
        let reg = CommandRegistry::new();
        let id = CommandId::from("stop-me");
        let (e, _signal) = entry("s1");
        reg.insert(id.clone(), e).unwrap();

        assert!(reg.stop(&id));
        assert!(!reg.stop(&id));
        assert!(reg.contains(&id), "stop does not unregister");
    }

    #[test]
    fn by_session_filters() {
        let reg = CommandRegistry::new();
        let (a, _sa) = entry("s1");
        let (b, _sb) = entry("s2");
        let (c, _sc) = entry("s1");
        reg.insert(CommandId::from("a"), a).unwrap();
        reg.insert(CommandId::from("b"), b).unwrap();
        reg.insert(CommandId::from("c"), c).unwrap();

        let mut ids = reg.by_session("s1");
        ids.sort();
        assert_eq!(ids, vec![CommandId::from("a"), CommandId::from("c")]);
        assert!(reg.by_session("s3").is_empty());
    }
}
