//! OpenSSH-backed sessions
//!
//! Every command is its own `ssh <device> <command>` invocation. IOS serves
//! a single exec request per connection and then drops it, so nothing is
//! shared between commands. Authentication is left to the user's agent,
//! keys and `~/.ssh/config`; `BatchMode` keeps ssh from ever prompting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::session::{Connector, Session, SessionError};

/// Command used to learn the device name: `<hostname> uptime is ...`
pub const IDENTITY_COMMAND: &str = "show version | include uptime";

/// Exit status ssh itself uses for connection and authentication failures
const SSH_CONNECT_FAILURE: i32 = 255;

/// SSH connection settings shared by every device in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshProfile {
    /// Login user (defaults to ssh's own choice)
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Private key to offer
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Extra `-o` options, e.g. `KexAlgorithms=+diffie-hellman-group14-sha1`
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for SshProfile {
    fn default() -> Self {
        Self {
            username: None,
            port: None,
            identity_file: None,
            connect_timeout_secs: default_connect_timeout(),
            options: Vec::new(),
        }
    }
}

impl SshProfile {
    /// Arguments common to every ssh invocation
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(ref user) = self.username {
            args.push("-l".to_string());
            args.push(user.clone());
        }
        if let Some(ref key) = self.identity_file {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        for option in &self.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }
}

/// Opens [`SshSession`]s with the system `ssh` binary
#[derive(Debug, Clone)]
pub struct SshConnector {
    profile: SshProfile,
    program: String,
}

impl SshConnector {
    pub fn new(profile: SshProfile) -> Self {
        Self {
            profile,
            program: "ssh".to_string(),
        }
    }

    /// Use a different ssh executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Session = SshSession;

    /// Connections are made per command, so an unreachable device shows up
    /// as [`SessionError::Connect`] on the first command.
    async fn open(&self, address: &str) -> Result<SshSession, SessionError> {
        debug!(address = %address, program = %self.program, "Opening SSH session");

        Ok(SshSession {
            address: address.to_string(),
            program: self.program.clone(),
            base_args: self.profile.base_args(),
            identity: None,
            open: true,
        })
    }
}

/// Command session over one-shot ssh exec connections
#[derive(Debug)]
pub struct SshSession {
    address: String,
    program: String,
    base_args: Vec<String>,
    identity: Option<String>,
    open: bool,
}

impl SshSession {
    fn command_args(&self, command: &str) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.push(self.address.clone());
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl Session for SshSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        if !self.open {
            return Err(SessionError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                reason: "session closed".to_string(),
            });
        }

        trace!(address = %self.address, command = %command, "Running command");

        let output = Command::new(&self.program)
            .args(self.command_args(command))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SessionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(match output.status.code() {
                Some(SSH_CONNECT_FAILURE) => SessionError::Connect {
                    address: self.address.clone(),
                    reason,
                },
                _ => SessionError::Command {
                    address: self.address.clone(),
                    command: command.to_string(),
                    reason,
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn identity(&mut self) -> Result<String, SessionError> {
        if let Some(ref name) = self.identity {
            return Ok(name.clone());
        }

        let output = self.run(IDENTITY_COMMAND).await?;
        let name = hostname_from_uptime(&output).ok_or_else(|| SessionError::Identity {
            address: self.address.clone(),
        })?;
        self.identity = Some(name.clone());
        Ok(name)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.open {
            self.open = false;
            debug!(address = %self.address, "Closed SSH session");
        }
        Ok(())
    }
}

/// Hostname from `show version | include uptime` output
fn hostname_from_uptime(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.split_once(" uptime is "))
        .map(|(name, _)| name.trim())
        .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_from_uptime() {
        let output = "core-sw1 uptime is 3 weeks, 2 days, 4 hours, 10 minutes\n";
        assert_eq!(hostname_from_uptime(output), Some("core-sw1".to_string()));
    }

    #[test]
    fn test_hostname_from_uptime_skips_other_lines() {
        let output = "\nCisco IOS Software, C2960 Software\nSW-A uptime is 1 day, 2 hours\n";
        assert_eq!(hostname_from_uptime(output), Some("SW-A".to_string()));
        assert_eq!(hostname_from_uptime("% Invalid input detected\n"), None);
    }

    #[test]
    fn test_base_args_from_profile() {
        let profile = SshProfile {
            username: Some("netops".to_string()),
            port: Some(2222),
            identity_file: Some(PathBuf::from("/keys/id_ed25519")),
            connect_timeout_secs: 5,
            options: vec!["KexAlgorithms=+diffie-hellman-group14-sha1".to_string()],
        };
        assert_eq!(
            profile.base_args(),
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=5",
                "-p",
                "2222",
                "-l",
                "netops",
                "-i",
                "/keys/id_ed25519",
                "-o",
                "KexAlgorithms=+diffie-hellman-group14-sha1",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_fails_first_command() {
        let connector = SshConnector::new(SshProfile::default())
            .with_program("/nonexistent/portmap-test-ssh");
        let mut session = connector.open("192.168.2.1").await.unwrap();
        let err = session.identity().await.unwrap_err();
        assert!(matches!(err, SessionError::Spawn { .. }));
    }

    /// Write an executable stand-in for `ssh`
    #[cfg(unix)]
    fn fake_ssh(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ssh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_each_command_is_its_own_connection() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let program = fake_ssh(
            dir.path(),
            &format!(
                r#"printf '%s\n' "$*" >> '{}'
for last; do :; done
case "$last" in
  "show version | include uptime") echo "SW-A uptime is 2 weeks, 1 day" ;;
  "show mac address-table") echo "  10    0011.2233.4455    DYNAMIC     Gi0/1" ;;
  *) echo "% Invalid input detected" >&2; exit 1 ;;
esac
"#,
                log.display()
            ),
        );

        let profile = SshProfile {
            username: Some("netops".to_string()),
            ..SshProfile::default()
        };
        let connector = SshConnector::new(profile).with_program(program);
        let mut session = connector.open("192.168.2.1").await.unwrap();

        assert_eq!(session.identity().await.unwrap(), "SW-A");
        assert_eq!(session.identity().await.unwrap(), "SW-A");
        let table = session.run("show mac address-table").await.unwrap();
        assert!(table.contains("Gi0/1"));
        assert!(matches!(
            session.run("show clock").await,
            Err(SessionError::Command { .. })
        ));
        session.close().await.unwrap();
        assert!(session.run("show mac address-table").await.is_err());

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        assert_eq!(
            calls,
            vec![
                "-o BatchMode=yes -o ConnectTimeout=10 -l netops 192.168.2.1 show version | include uptime",
                "-o BatchMode=yes -o ConnectTimeout=10 -l netops 192.168.2.1 show mac address-table",
                "-o BatchMode=yes -o ConnectTimeout=10 -l netops 192.168.2.1 show clock",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ssh_connect_failure_is_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ssh(
            dir.path(),
            "echo 'ssh: connect to host 192.168.2.9 port 22: No route to host' >&2\nexit 255\n",
        );

        let connector = SshConnector::new(SshProfile::default()).with_program(program);
        let mut session = connector.open("192.168.2.9").await.unwrap();
        match session.identity().await {
            Err(SessionError::Connect { address, reason }) => {
                assert_eq!(address, "192.168.2.9");
                assert!(reason.contains("No route to host"));
            }
            other => panic!("expected connect error, got {other:?}"),
        }
    }
}
