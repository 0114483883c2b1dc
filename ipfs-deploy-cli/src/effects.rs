//! Clipboard and browser effects for the desktop the CLI runs on.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use ipfs_deploy_core::error::{DeployError, Result};
use ipfs_deploy_core::traits::SideEffects;

/// How long a clipboard tool may take before it is abandoned.
const COPY_TIMEOUT: Duration = Duration::from_secs(5);

/// A program that copies its stdin to the clipboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyCommand {
    /// Executable name
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl CopyCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Clipboard tools to try on this platform, most specific first.
pub fn platform_copy_commands() -> Vec<CopyCommand> {
    if cfg!(target_os = "macos") {
        vec![CopyCommand::new("pbcopy", &[])]
    } else if cfg!(windows) {
        vec![CopyCommand::new("clip", &[])]
    } else {
        let mut commands = Vec::new();
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            commands.push(CopyCommand::new("wl-copy", &[]));
        }
        commands.push(CopyCommand::new("xclip", &["-selection", "clipboard"]));
        commands.push(CopyCommand::new("xsel", &["--clipboard", "--input"]));
        commands
    }
}

/// Side effects backed by the real desktop.
pub struct SystemEffects {
    copy_commands: Vec<CopyCommand>,
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEffects {
    /// Uses this platform's clipboard tools.
    pub fn new() -> Self {
        Self::with_copy_commands(platform_copy_commands())
    }

    /// Uses the given clipboard tools, tried in order.
    pub fn with_copy_commands(copy_commands: Vec<CopyCommand>) -> Self {
        Self { copy_commands }
    }

    async fn try_copy(command: &CopyCommand, text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A tool that exits early closes the pipe; its exit status says why.
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
            // Closing stdin lets the tool finish.
            drop(stdin);
        }

        match tokio::time::timeout(COPY_TIMEOUT, child.wait()).await {
            Ok(status) => Ok(status?.success()),
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{} did not exit", command.program),
            )),
        }
    }
}

#[async_trait]
impl SideEffects for SystemEffects {
    #[instrument(skip(self, text))]
    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let mut failures = Vec::new();

        for command in &self.copy_commands {
            match Self::try_copy(command, text).await {
                Ok(true) => {
                    debug!(tool = %command.program, "Copied to clipboard");
                    return Ok(());
                }
                Ok(false) => failures.push(format!("{} exited with an error", command.program)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    failures.push(format!("{} not installed", command.program))
                }
                Err(e) => failures.push(format!("{}: {e}", command.program)),
            }
        }

        Err(DeployError::SideEffectFailed(if failures.is_empty() {
            "no clipboard tool configured".into()
        } else {
            format!("clipboard unavailable ({})", failures.join("; "))
        }))
    }

    #[instrument(skip(self))]
    async fn open_url(&self, url: &str) -> Result<()> {
        let target = url.to_string();
        tokio::task::spawn_blocking(move || open::that(target))
            .await
            .map_err(|e| DeployError::SideEffectFailed(format!("browser task: {e}")))?
            .map_err(|e| DeployError::SideEffectFailed(format!("could not open {url}: {e}")))
    }
}
