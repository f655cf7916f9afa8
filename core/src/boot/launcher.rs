//! Backend process launching.
//!
//! [`NodeLauncher`] is the production launcher: it re-extracts the bundled
//! payload on every cold start and runs the entry script under `node`.
//! Tests plug in their own [`BackendLauncher`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::supervisor::SupervisorError;
use crate::config::{
    BackendConfig, CredentialTransport, ENV_BACKEND_PASSWORD, ENV_BACKEND_USERNAME, PAYLOAD_ENTRY,
};
use crate::types::Network;
use crate::vault::InstallCredential;

/// Everything a launch needs to know about the client side.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub credential: InstallCredential,
    pub network: Network,
}

/// Handle to a running backend.
pub trait BackendProcess: Send {
    /// Non-blocking liveness check.
    fn is_alive(&mut self) -> bool;
    /// Terminates the process and reaps it.
    fn kill(&mut self) -> io::Result<()>;
}

impl BackendProcess for Child {
    fn is_alive(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    fn kill(&mut self) -> io::Result<()> {
        match Child::kill(self) {
            Ok(()) => {}
            // Already exited.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e),
        }
        self.wait().map(|_| ())
    }
}

/// Starts one backend process per call. Invoked from a blocking context.
pub trait BackendLauncher: Send + Sync + 'static {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn BackendProcess>, SupervisorError>;
}

// ---------------------------------------------------------------------------
// NodeLauncher
// ---------------------------------------------------------------------------

/// Extracts the bundled payload and runs `<program> <entry> ...`.
#[derive(Debug, Clone)]
pub struct NodeLauncher {
    config: BackendConfig,
}

impl NodeLauncher {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Deletes the previous extraction and copies the payload fresh.
    /// Returns the extraction directory.
    fn prepare_payload(&self) -> Result<PathBuf, SupervisorError> {
        let target = self.config.extract_dir();
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|source| SupervisorError::Payload {
                path: target.clone(),
                source,
            })?;
        }
        copy_dir_all(&self.config.payload_source, &target).map_err(|source| {
            SupervisorError::Payload {
                path: self.config.payload_source.clone(),
                source,
            }
        })?;
        tracing::debug!(target = %target.display(), "backend payload extracted");
        Ok(target)
    }

    fn command(&self, request: &LaunchRequest, extract_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.current_dir(extract_dir)
            .arg(extract_dir.join(PAYLOAD_ENTRY))
            .stdin(Stdio::null());

        match self.config.credential_transport {
            CredentialTransport::Arguments => {
                cmd.arg(&request.credential.username)
                    .arg(&request.credential.password);
            }
            CredentialTransport::Environment => {
                cmd.env(ENV_BACKEND_USERNAME, &request.credential.username)
                    .env(ENV_BACKEND_PASSWORD, &request.credential.password);
            }
        }
        cmd.arg(request.network.id());
        cmd
    }
}

impl BackendLauncher for NodeLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn BackendProcess>, SupervisorError> {
        let extract_dir = self.prepare_payload()?;
        let child = self
            .command(request, &extract_dir)
            .spawn()
            .map_err(SupervisorError::Launch)?;
        tracing::info!(
            pid = child.id(),
            program = %self.config.program.display(),
            network = %request.network,
            "backend process spawned"
        );
        Ok(Box::new(child))
    }
}

/// Recursively copies `src` into `dst`, creating `dst`.
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn request() -> LaunchRequest {
        LaunchRequest {
            credential: InstallCredential {
                username: "00000000000000aa".into(),
                password: "00000000000000bb".into(),
            },
            network: Network::Main,
        }
    }

    /// Payload whose entry script is a POSIX shell script.
    fn payload(script: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join(PAYLOAD_ENTRY), script).unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        dir
    }

    fn launcher(payload: &Path, data: &Path, transport: CredentialTransport) -> NodeLauncher {
        let mut config = BackendConfig::new(payload, data);
        config.program = PathBuf::from("sh");
        config.credential_transport = transport;
        NodeLauncher::new(config)
    }

    fn wait_exit(process: &mut Box<dyn BackendProcess>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while process.is_alive() {
            assert!(Instant::now() < deadline, "script did not exit");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn copy_dir_all_is_recursive() {
        let src = payload("exit 0\n");
        let dst = tempfile::tempdir().unwrap();
        copy_dir_all(src.path(), &dst.path().join("out")).unwrap();
        assert!(dst.path().join("out/bin/www").is_file());
        assert!(dst.path().join("out/package.json").is_file());
    }

    #[test]
    fn stale_extraction_is_replaced() {
        let src = payload("exit 0\n");
        let data = tempfile::tempdir().unwrap();
        let launcher = launcher(src.path(), data.path(), CredentialTransport::Arguments);

        let stale = launcher.config().extract_dir().join("stale.js");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let mut process = launcher.launch(&request()).unwrap();
        wait_exit(&mut process);
        assert!(!stale.exists());
        assert!(launcher.config().extract_dir().join("bin/www").is_file());
    }

    #[test]
    fn credential_passed_as_arguments() {
        let src = payload("printf '%s %s %s' \"$1\" \"$2\" \"$3\" > args.out\n");
        let data = tempfile::tempdir().unwrap();
        let launcher = launcher(src.path(), data.path(), CredentialTransport::Arguments);

        let mut process = launcher.launch(&request()).unwrap();
        wait_exit(&mut process);

        let out = fs::read_to_string(launcher.config().extract_dir().join("args.out")).unwrap();
        assert_eq!(out, "00000000000000aa 00000000000000bb main");
    }

    #[test]
    fn credential_passed_through_environment() {
        let src = payload(
            "printf '%s %s %s' \"$TERRAPLANET_USERNAME\" \"$TERRAPLANET_PASSWORD\" \"$1\" > args.out\n",
        );
        let data = tempfile::tempdir().unwrap();
        let launcher = launcher(src.path(), data.path(), CredentialTransport::Environment);

        let mut process = launcher.launch(&request()).unwrap();
        wait_exit(&mut process);

        let out = fs::read_to_string(launcher.config().extract_dir().join("args.out")).unwrap();
        assert_eq!(out, "00000000000000aa 00000000000000bb main");
    }

    #[test]
    fn kill_stops_long_running_backend() {
        let src = payload("sleep 30\n");
        let data = tempfile::tempdir().unwrap();
        let launcher = launcher(src.path(), data.path(), CredentialTransport::Arguments);

        let mut process = launcher.launch(&request()).unwrap();
        assert!(process.is_alive());
        process.kill().unwrap();
        assert!(!process.is_alive());
    }

    #[test]
    fn missing_payload_is_payload_error() {
        let data = tempfile::tempdir().unwrap();
        let launcher = launcher(
            &data.path().join("does-not-exist"),
            data.path(),
            CredentialTransport::Arguments,
        );
        assert!(matches!(
            launcher.launch(&request()),
            Err(SupervisorError::Payload { .. })
        ));
    }

    #[test]
    fn missing_program_is_launch_error() {
        let src = payload("exit 0\n");
        let data = tempfile::tempdir().unwrap();
        let mut config = BackendConfig::new(src.path(), data.path());
        config.program = PathBuf::from("/nonexistent/terraplanet-node");
        let launcher = NodeLauncher::new(config);
        assert!(matches!(
            launcher.launch(&request()),
            Err(SupervisorError::Launch(_))
        ));
    }
}
