//! Static host facts read once at start-up.

use nix::unistd::{gethostname, getuid, User};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Memory page size in bytes (usually 4096).
fn get_page_size() -> u64 {
    // SAFETY: sysconf has no preconditions; -1 and 0 are handled below
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
}

fn get_processors() -> u32 {
    // SAFETY: see get_page_size
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        n as u32
    } else {
        1
    }
}

fn get_phys_pages() -> u64 {
    // SAFETY: see get_page_size
    let n = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    if n > 0 {
        n as u64
    } else {
        0
    }
}

pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Online processors.
pub static PROCESSORS: Lazy<u32> = Lazy::new(get_processors);

/// Identity and capacity of the sampled machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostFacts {
    pub os_name: String,
    pub kernel_release: String,
    pub machine: String,
    pub hostname: String,
    pub user: String,
    pub cpu_model: String,
    pub pid: u32,
    pub processors: u32,
    pub page_size: u64,
    /// Physical memory in bytes
    pub total_memory: u64,
}

/// Reads system information from uname syscall.
/// Returns (sysname, release, machine).
pub fn read_uname() -> Option<(String, String, String)> {
    use std::ffi::CStr;
    use std::mem;

    // SAFETY: utsname only holds c_char arrays, valid when zeroed, and
    // uname NUL-terminates every field it fills.
    unsafe {
        let mut uts: libc::utsname = mem::zeroed();
        if libc::uname(&mut uts) != 0 {
            return None;
        }
        let field = |f: &[libc::c_char]| CStr::from_ptr(f.as_ptr()).to_string_lossy().into_owned();
        Some((
            field(&uts.sysname[..]),
            field(&uts.release[..]),
            field(&uts.machine[..]),
        ))
    }
}

/// First "model name" entry of a /proc/cpuinfo-shaped table.
pub fn parse_cpu_model(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

fn current_user() -> String {
    match User::from_uid(getuid()) {
        Ok(Some(user)) => user.name,
        Ok(None) => getuid().to_string(),
        Err(e) => {
            debug!("User lookup failed: {}", e);
            getuid().to_string()
        }
    }
}

impl HostFacts {
    /// Gathers host facts; anything unreadable is left empty.
    pub fn read(cpuinfo_path: &Path) -> Self {
        let (os_name, kernel_release, machine) = read_uname().unwrap_or_default();
        let hostname = gethostname()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        let cpu_model = match fs::read_to_string(cpuinfo_path) {
            Ok(content) => parse_cpu_model(&content).unwrap_or_default(),
            Err(e) => {
                debug!("Cannot read {}: {}", cpuinfo_path.display(), e);
                String::new()
            }
        };

        Self {
            os_name,
            kernel_release,
            machine,
            hostname,
            user: current_user(),
            cpu_model,
            pid: std::process::id(),
            processors: *PROCESSORS,
            page_size: *PAGE_SIZE,
            total_memory: get_phys_pages() * *PAGE_SIZE,
        }
    }
}
