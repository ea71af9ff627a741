use std::{io, process::ExitStatus, sync::Arc};

use tokio::{
    process::Child,
    sync::mpsc,
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use glass_core::{CommandEntry, CommandRegistry, StopSignal, stop_pair};
use glass_dns::Resolve;
use glass_model::{CommandCatalog, CommandId, CommandTemplate, IpVersion, OutputEvent};

use crate::{
    error::ExecError,
    proc::{
        Invocation,
        stream::{Pipe, spawn_reader},
    },
    target::Target,
    util::{isolate, kill_tree},
};

/// Capacity of the per-command event channel. A slow consumer stalls the readers.
pub const EVENT_BUFFER: usize = 100;

/// A command accepted by [`Launcher::execute`].
#[derive(Debug)]
pub struct Execution {
    pub id: CommandId,
    pub events: mpsc::Receiver<OutputEvent>,
}

impl Execution {
    pub fn into_parts(self) -> (CommandId, mpsc::Receiver<OutputEvent>) {
        (self.id, self.events)
    }
}

/// Result of resolving a template and target into something runnable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedCommand {
    pub command_line: String,
    pub invocation: Invocation,
}

/// Starts catalog commands and tracks them until they finish.
#[derive(Clone)]
pub struct Launcher {
    catalog: Arc<CommandCatalog>,
    resolver: Arc<dyn Resolve>,
    registry: CommandRegistry,
}

impl Launcher {
    pub fn new(catalog: Arc<CommandCatalog>, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            catalog,
            resolver,
            registry: CommandRegistry::new(),
        }
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Request a stop of a running command. `false` if it is unknown or already stopping.
    pub fn stop(&self, id: &CommandId) -> bool {
        let stopped = self.registry.stop(id);
        debug!(target: "glass.exec", command_id = %id, stopped, "stop requested");
        stopped
    }

    /// Validate and resolve `target` and build the final command line for `name`.
    pub async fn prepare(
        &self,
        name: &str,
        target: &str,
        version: IpVersion,
    ) -> Result<PreparedCommand, ExecError> {
        let template = self
            .catalog
            .get(name)
            .ok_or_else(|| ExecError::CommandNotFound(name.to_string()))?;

        let target = if template.ignore_target {
            String::new()
        } else {
            self.resolve_target(target, version).await?
        };

        let command_line = command_line(template, &target);
        let invocation = Invocation::from_line(&command_line)?;
        Ok(PreparedCommand {
            command_line,
            invocation,
        })
    }

    async fn resolve_target(&self, raw: &str, version: IpVersion) -> Result<String, ExecError> {
        let target = Target::parse(raw)?;
        if let Some(ip) = target.ip() {
            return Ok(target.with_ip(ip));
        }

        let ips = self.resolver.resolve(target.host(), version).await?;
        let ip = ips
            .first()
            .copied()
            .ok_or_else(|| ExecError::NoAddresses(target.host().to_string()))?;
        debug!(target: "glass.exec", domain = target.host(), %ip, "target resolved");
        Ok(target.with_ip(ip))
    }

    /// Start `name` against `target` on behalf of `session`.
    ///
    /// Never fails directly: rejections arrive on the returned stream as an error event
    /// followed by an unsuccessful completion. Every stream ends with exactly one of
    /// `Complete` or `Stopped`.
    #[instrument(level = "debug", target = "glass.exec", skip_all, fields(command = name, session))]
    pub async fn execute(
        &self,
        name: &str,
        target: &str,
        session: &str,
        version: IpVersion,
    ) -> Execution {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let id_target = match self.catalog.get(name) {
            Some(t) if t.ignore_target => "",
            _ => target.trim(),
        };
        let id = CommandId::generate(name, id_target, session);

        if let Err(e) = self.start(&id, name, target, session, version, &tx).await {
            warn!(target: "glass.exec", command_id = %id, error = %e, "command rejected");
            let _ = tx.send(OutputEvent::error(e.to_string())).await;
            let _ = tx.send(OutputEvent::failure(None)).await;
        }

        Execution { id, events: rx }
    }

    async fn start(
        &self,
        id: &CommandId,
        name: &str,
        target: &str,
        session: &str,
        version: IpVersion,
        tx: &mpsc::Sender<OutputEvent>,
    ) -> Result<(), ExecError> {
        let prepared = self.prepare(name, target, version).await?;

        let (stop, signal) = stop_pair();
        self.registry
            .insert(id.clone(), CommandEntry::new(session, &prepared.command_line, stop))?;

        let mut cmd = prepared.invocation.command();
        isolate(&mut cmd);
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.registry.remove(id);
                return Err(ExecError::Spawn(e.to_string()));
            }
        };
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            // kill_on_drop takes care of the child
            self.registry.remove(id);
            return Err(ExecError::Spawn("stdio pipes unavailable".into()));
        };

        let pgid = child.id();
        info!(
            target: "glass.exec",
            command_id = %id,
            pid = pgid,
            command = %prepared.command_line,
            shell = prepared.invocation.is_shell(),
            "command started"
        );

        let abandon = CancellationToken::new();
        let mut readers = JoinSet::new();
        spawn_reader(&mut readers, stdout, Pipe::Stdout, tx.clone(), abandon.clone());
        spawn_reader(&mut readers, stderr, Pipe::Stderr, tx.clone(), abandon.clone());

        let supervisor = Supervisor {
            id: id.clone(),
            child,
            pgid,
            signal,
            abandon,
            readers,
            tx: tx.clone(),
            registry: self.registry.clone(),
        };
        tokio::spawn(supervisor.run());
        Ok(())
    }
}

/// The template alone when it ignores the target or the target is empty, otherwise
/// `"{template} {target}"`.
pub fn command_line(template: &CommandTemplate, target: &str) -> String {
    if template.ignore_target || target.is_empty() {
        template.template.clone()
    } else {
        format!("{} {}", template.template, target)
    }
}

/// Owns a running child until it exits or is stopped, then emits the terminal event.
struct Supervisor {
    id: CommandId,
    child: Child,
    /// Group led by the child, kept after the leader itself has been reaped.
    pgid: Option<u32>,
    signal: StopSignal,
    abandon: CancellationToken,
    readers: JoinSet<()>,
    tx: mpsc::Sender<OutputEvent>,
    registry: CommandRegistry,
}

enum Exit {
    Finished(io::Result<ExitStatus>),
    Stop,
}

impl Supervisor {
    async fn run(mut self) {
        let exit = tokio::select! {
            status = self.child.wait() => Exit::Finished(status),
            _ = self.signal.wait() => Exit::Stop,
        };

        // output already in the pipes is still delivered, but a stop can cut it short
        let exit = match exit {
            Exit::Finished(status) => {
                let drained = tokio::select! {
                    _ = join_all(&mut self.readers) => true,
                    _ = self.signal.wait() => false,
                };
                // refuse stops from here on, but honour one that already landed
                if drained && !self.signal.close() {
                    Exit::Finished(status)
                } else {
                    Exit::Stop
                }
            }
            Exit::Stop => Exit::Stop,
        };

        let terminal = match exit {
            Exit::Finished(status) => {
                let event = completion(status);
                info!(target: "glass.exec", command_id = %self.id, ?event, "command finished");
                event
            }
            Exit::Stop => {
                self.halt().await;
                info!(target: "glass.exec", command_id = %self.id, "command stopped");
                OutputEvent::Stopped
            }
        };

        self.registry.remove(&self.id);
        if self.tx.send(terminal).await.is_err() {
            debug!(target: "glass.exec", command_id = %self.id, "consumer gone before terminal event");
        }
    }

    async fn halt(&mut self) {
        kill_tree(&mut self.child, self.pgid).await;
        self.abandon.cancel();
        join_all(&mut self.readers).await;
    }
}

async fn join_all(readers: &mut JoinSet<()>) {
    while readers.join_next().await.is_some() {}
}

fn completion(status: io::Result<ExitStatus>) -> OutputEvent {
    let err = match status {
        Ok(status) if status.success() => return OutputEvent::success(),
        Ok(status) => match status.code() {
            Some(code) => ExecError::NonZeroExit { code },
            None => ExecError::KilledBySignal,
        },
        Err(e) => ExecError::from(e),
    };
    OutputEvent::failure(Some(err.to_string()))
}
