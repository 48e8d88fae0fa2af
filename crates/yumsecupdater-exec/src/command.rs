//! Command representation and host-namespace wrapping

use std::fmt;

/// Prefix that moves a command into the host mount namespace.
///
/// Requires the container to run with `hostPID: true` and `privileged: true`
/// so that PID 1 is the host init process.
pub const HOST_NAMESPACE_PREFIX: [&str; 3] = ["/usr/bin/nsenter", "-m/proc/1/ns/mnt", "--"];

/// An external command as an argument vector
///
/// Only built through [`CommandSpec::new`], so `argv` always holds the
/// program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    /// Create a command running `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Append several arguments in order
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Wrap the command so it runs inside the host mount namespace
    #[must_use]
    pub fn on_host(self) -> Self {
        let mut argv: Vec<String> = HOST_NAMESPACE_PREFIX
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        argv.extend(self.argv);
        Self { argv }
    }

    /// Program to execute
    #[must_use]
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Full argument vector including the program
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let cmd = CommandSpec::new("yum").arg("-y").args(["-q", "update"]);
        assert_eq!(cmd.program(), "yum");
        assert_eq!(cmd.arguments(), ["-y", "-q", "update"]);
        assert_eq!(cmd.to_string(), "yum -y -q update");
    }

    #[test]
    fn test_on_host_prefixes_nsenter() {
        let cmd = CommandSpec::new("needs-restarting").arg("-r").on_host();
        assert_eq!(cmd.program(), "/usr/bin/nsenter");
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/nsenter -m/proc/1/ns/mnt -- needs-restarting -r"
        );
    }

    #[test]
    fn test_bare_program_has_no_arguments() {
        let cmd = CommandSpec::new("needs-restarting");
        assert_eq!(cmd.program(), "needs-restarting");
        assert!(cmd.arguments().is_empty());
        assert_eq!(cmd.argv(), ["needs-restarting"]);
    }
}
