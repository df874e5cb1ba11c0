use std::{
    ffi::OsStr,
    fmt,
    path::Path,
    process::Command,
};

use log::debug;

use crate::error::{Error, Result};

/// External tool invocation: program name and ordered arguments.
///
/// Rendered with `Display` as a single shell-like line, where arguments holding
/// spaces or filter-graph punctuation are wrapped in double quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        ToolCommand {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    pub fn to_process(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            if a.contains([' ', ';', '[', ']']) {
                write!(f, " \"{}\"", a)?;
            } else {
                write!(f, " {}", a)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr, the way ffmpeg info output is read.
    pub fn combined(&self) -> String {
        [self.stdout.as_str(), self.stderr.as_str()].join("\n")
    }
}

/// Seam between the pipeline and the ffmpeg/ffprobe binaries.
pub trait ToolRunner: Send + Sync {
    fn output(&self, cmd: &ToolCommand) -> std::io::Result<ToolOutput>;
}

/// Runs tools as child processes found on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn output(&self, cmd: &ToolCommand) -> std::io::Result<ToolOutput> {
        debug!("{}", cmd);
        let output = cmd.to_process().output()?;
        Ok(ToolOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `cmd` and fail on launch errors and non-zero exit.
pub fn run_checked(runner: &dyn ToolRunner, cmd: &ToolCommand) -> Result<ToolOutput> {
    let output = runner.output(cmd).map_err(|source| Error::Launch {
        program: cmd.program.clone(),
        source,
    })?;
    check_status(cmd, &output)?;
    Ok(output)
}

fn check_status(cmd: &ToolCommand, output: &ToolOutput) -> Result<()> {
    if output.success {
        Ok(())
    } else {
        Err(Error::ToolFailed {
            program: cmd.program.clone(),
            status: output.status.clone(),
            stderr: [output.stderr.trim_end(), output.stdout.trim_end()]
                .join("\n")
                .trim()
                .to_string(),
        })
    }
}

/// Lossy display form of a path for command lines and manifests.
pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
pub(crate) mod fake {
    use std::{
        collections::HashMap,
        path::Path,
        sync::Mutex,
    };

    use super::*;

    type Handler = Box<dyn Fn(&ToolCommand) -> std::io::Result<ToolOutput> + Send + Sync>;

    /// Records every command and answers from per-program handlers.
    pub struct FakeRunner {
        pub calls: Mutex<Vec<ToolCommand>>,
        handlers: HashMap<String, Handler>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            FakeRunner {
                calls: Mutex::new(Vec::new()),
                handlers: HashMap::new(),
            }
        }

        pub fn on<F>(mut self, program: &str, handler: F) -> Self
        where
            F: Fn(&ToolCommand) -> std::io::Result<ToolOutput> + Send + Sync + 'static,
        {
            self.handlers.insert(program.to_string(), Box::new(handler));
            self
        }

        pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.program == program)
                .cloned()
                .collect()
        }
    }

    impl ToolRunner for FakeRunner {
        fn output(&self, cmd: &ToolCommand) -> std::io::Result<ToolOutput> {
            self.calls.lock().unwrap().push(cmd.clone());
            match self.handlers.get(&cmd.program) {
                Some(handler) => handler(cmd),
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not installed", cmd.program),
                )),
            }
        }
    }

    pub fn ok(stdout: &str) -> ToolOutput {
        ToolOutput {
            success: true,
            status: "exit status: 0".into(),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> ToolOutput {
        ToolOutput {
            success: false,
            status: "exit status: 1".into(),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Last argument of a command, the input file for probes.
    pub fn last_arg(cmd: &ToolCommand) -> &Path {
        Path::new(cmd.args.last().map(String::as_str).unwrap_or_default())
    }
}
