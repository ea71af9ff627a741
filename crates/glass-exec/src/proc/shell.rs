use tokio::process::Command;

const OPERATORS: [&str; 7] = ["&&", "||", "|", "&", ">", "<", ";"];

/// Whether `line` uses any operator that only a shell understands.
pub fn needs_shell(line: &str) -> bool {
    OPERATORS.iter().any(|op| line.contains(op))
}

/// `sh -c <script>` or `cmd /C <script>`.
pub fn shell_command(script: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_family = "windows")] {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
        } else {
            let mut cmd = Command::new("/bin/sh");
            cmd.arg("-c").arg(script);
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_operators() {
        assert!(needs_shell("a | b"));
        assert!(needs_shell("a;b"));
        assert!(needs_shell("a 2>&1"));
        assert!(!needs_shell("ping -c 4 192.0.2.1"));
        assert!(!needs_shell("dig +short example.com AAAA"));
    }
}
