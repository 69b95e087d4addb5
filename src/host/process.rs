use std::sync::Mutex;

use anyhow::{bail, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::{ProcessControl, ProcessHandle};

/// Process discovery and termination backed by sysinfo.
pub struct SystemProcesses {
    system: Mutex<System>,
    /// Our own PID so we never match ourselves
    own_pid: u32,
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            own_pid: std::process::id(),
        }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for SystemProcesses {
    fn find_processes(&self, name: &str) -> Vec<ProcessHandle> {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::everything());

        let mut found: Vec<ProcessHandle> = system
            .processes()
            .iter()
            .filter(|(pid, _)| pid.as_u32() != self.own_pid)
            .filter_map(|(pid, process)| {
                let process_name = process.name().to_string_lossy();
                name_matches(&process_name, name).then(|| ProcessHandle {
                    pid: pid.as_u32(),
                    name: process_name.into_owned(),
                })
            })
            .collect();
        found.sort_by_key(|handle| handle.pid);
        found
    }

    fn terminate(&self, handle: &ProcessHandle) -> Result<()> {
        let system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(process) = system.process(Pid::from_u32(handle.pid)) else {
            bail!("process {} ({}) is no longer running", handle.pid, handle.name);
        };
        if !process.kill() {
            bail!("failed to send kill signal to {} ({})", handle.pid, handle.name);
        }
        Ok(())
    }
}

/// Case-insensitive prefix match that ignores a trailing `.exe`.
fn name_matches(process_name: &str, wanted: &str) -> bool {
    let process_name = process_name.to_lowercase();
    let process_name = process_name.strip_suffix(".exe").unwrap_or(&process_name);
    !wanted.is_empty() && process_name.starts_with(&wanted.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_prefix_ignoring_case_and_exe() {
        assert!(name_matches("javaw.exe", "javaw"));
        assert!(name_matches("JavaW.EXE", "javaw"));
        assert!(name_matches("java", "java"));
        assert!(name_matches("javaw", "java"));
        assert!(!name_matches("jav", "java"));
        assert!(!name_matches("minecraft-launcher", "java"));
        assert!(!name_matches("java", ""));
    }

    #[test]
    fn never_finds_itself() {
        let processes = SystemProcesses::new();
        let own_pid = std::process::id();
        let all = processes.find_processes("");
        assert!(all.is_empty());
        assert!(processes
            .find_processes("autofisher")
            .iter()
            .all(|handle| handle.pid != own_pid));
    }
}
