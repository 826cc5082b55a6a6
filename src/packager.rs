//! External packaging step
//!
//! Turns an extracted source tree into a `.tgz` artifact by shelling out to
//! a packaging tool (by default `jam pack`).

use crate::config::schema::PackagerConfig;
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Max number of output lines to include in packaging error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Builds an artifact from an extracted source tree
#[async_trait]
pub trait Packager: Send + Sync {
    /// Package `buildpack_dir` into `output` as `version`. `cached` requests
    /// the variant with dependencies bundled.
    async fn execute(
        &self,
        buildpack_dir: &Path,
        output: &Path,
        version: &str,
        cached: bool,
    ) -> KilnResult<()>;
}

/// Packager that runs `{program} pack` in the source tree
pub struct CommandPackager {
    program: String,
    offline_flag: String,
}

impl CommandPackager {
    pub fn new(config: &PackagerConfig) -> Self {
        Self {
            program: config.program.clone(),
            offline_flag: config.offline_flag.clone(),
        }
    }

    fn args(
        &self,
        buildpack_dir: &Path,
        output: &Path,
        version: &str,
        cached: bool,
    ) -> Vec<String> {
        let mut args = vec![
            "pack".to_string(),
            "--buildpack".to_string(),
            buildpack_dir.join("buildpack.toml").display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
            "--version".to_string(),
            version.to_string(),
        ];
        if cached && !self.offline_flag.is_empty() {
            args.push(self.offline_flag.clone());
        }
        args
    }
}

#[async_trait]
impl Packager for CommandPackager {
    async fn execute(
        &self,
        buildpack_dir: &Path,
        output: &Path,
        version: &str,
        cached: bool,
    ) -> KilnResult<()> {
        let args = self.args(buildpack_dir, output, version, cached);
        debug!("Executing: {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .current_dir(buildpack_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| KilnError::Packaging(format!("failed to run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let tail = error_tail(
                &String::from_utf8_lossy(&result.stdout),
                &String::from_utf8_lossy(&result.stderr),
            );
            return Err(KilnError::Packaging(format!(
                "{} pack failed ({}):\n{}",
                self.program, result.status, tail
            )));
        }

        info!("Packaged {} as {}", output.display(), version);
        Ok(())
    }
}

/// Combine stdout and stderr and keep the last `ERROR_TAIL_LINES` lines
fn error_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}
