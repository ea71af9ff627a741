use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Piped stdout/stderr, no stdin, own process group, killed when dropped.
pub fn isolate(cmd: &mut Command) {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(target_family = "unix")]
    cmd.process_group(0);
}

/// SIGKILL the process group `pgid`, then kill and reap the child itself.
///
/// `pgid` must be captured at spawn time: once the leader is reaped `child.id()` is gone,
/// while background members of its group may still be alive.
#[cfg(target_family = "unix")]
pub async fn kill_tree(child: &mut Child, pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        // the child leads its own group, see `isolate`
        let rc = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
        if rc != 0 {
            debug!(target: "glass.exec", pgid, error = %std::io::Error::last_os_error(), "killpg failed");
        }
    }
    if let Err(e) = child.kill().await {
        debug!(target: "glass.exec", error = %e, "child kill failed");
    }
}

#[cfg(target_family = "windows")]
pub async fn kill_tree(child: &mut Child, _pgid: Option<u32>) {
    if let Err(e) = child.kill().await {
        debug!(target: "glass.exec", error = %e, "child kill failed");
    }
}
