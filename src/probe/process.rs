//! Trial compilation through a real compiler process.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use tempfile::Builder;
use tracing::debug;

use super::CompileProbe;

/// Name of the object file written inside the probe's scratch directory.
const PROBE_OBJECT: &str = "probe.o";

/// Probes flags by compiling an empty translation unit from stdin.
///
/// The compiler runs as `<compiler> <flag> -x <language> -o <tmp> -c -`. The
/// object lands in a fresh temporary directory that is removed when the
/// probe returns, whether or not the compiler could be started.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProbe;

impl ProcessProbe {
    fn run(compiler: &str, flag: &str, language: &str) -> io::Result<bool> {
        let scratch = Builder::new().prefix("kumiki-probe.").tempdir()?;
        let object = scratch.path().join(PROBE_OBJECT);
        let mut child = Command::new(compiler)
            .arg(flag)
            .args(["-x", language, "-o"])
            .arg(&object)
            .args(["-c", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // An empty unit; closing stdin ends the input.
            stdin.write_all(b"")?;
        }
        let status = child.wait()?;
        Ok(status.success())
    }
}

impl CompileProbe for ProcessProbe {
    fn accepts(&self, compiler: &str, flag: &str, language: &str) -> bool {
        match Self::run(compiler, flag, language) {
            Ok(accepted) => {
                debug!(compiler, flag, language, accepted, "probed compiler flag");
                accepted
            }
            Err(err) => {
                debug!(compiler, flag, error = %err, "compiler probe could not run");
                false
            }
        }
    }
}
