//! Parsers for `/proc/<pid>/stat` and `/proc/<pid>/statm`.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::ReadError;

/// Numeric fields retained from `/proc/<pid>/stat`.
///
/// `utime`/`stime` are cumulative clock ticks, `rss` is in pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcStat {
    pub pid: u32,
    pub state: char,
    pub ppid: i32,
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
    pub priority: i64,
    pub nice: i64,
    pub num_threads: i64,
    pub starttime: u64,
    pub vsize: u64,
    pub rss: u64,
}

/// Page counts from `/proc/<pid>/statm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcStatm {
    pub size: u64,
    pub resident: u64,
    pub shared: u64,
    pub text: u64,
    pub lib: u64,
    pub data: u64,
    pub dirty: u64,
}

/// One parsed stat line: the command name plus its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    pub comm: String,
    pub stat: ProcStat,
}

/// Single-character scheduler state with a readable description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessState(pub char);

impl ProcessState {
    pub fn code(&self) -> char {
        self.0
    }

    pub fn describe(&self) -> &'static str {
        match self.0 {
            'R' => "Running",
            'S' => "Sleeping (Interruptible)",
            'D' => "Sleeping (Uninterruptible)",
            'Z' => "Zombie",
            'T' => "Stopped",
            't' => "Tracing stop",
            'W' => "Paging/Waking",
            'X' | 'x' => "Dead",
            'K' => "Wakekill",
            'P' => "Parked",
            'I' => "Idle kernel thread",
            _ => "Unknown",
        }
    }
}

// Field offsets counted from the state column, i.e. after "pid (comm) ".
const F_STATE: usize = 0;
const F_PPID: usize = 1;
const F_UTIME: usize = 11;
const F_STIME: usize = 12;
const F_CUTIME: usize = 13;
const F_CSTIME: usize = 14;
const F_PRIORITY: usize = 15;
const F_NICE: usize = 16;
const F_NUM_THREADS: usize = 17;
const F_STARTTIME: usize = 19;
const F_VSIZE: usize = 20;
const F_RSS: usize = 21;

fn field<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T, ReadError> {
    fields
        .get(idx)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ReadError::malformed("stat", format!("bad or missing {} field", name)))
}

/// Parses a `/proc/<pid>/stat` line.
///
/// The command name is enclosed in parentheses and may itself contain
/// spaces and parentheses, so it runs from the first `(` to the last `)`.
pub fn parse_stat(content: &str) -> Result<StatRecord, ReadError> {
    let open = content
        .find('(')
        .ok_or_else(|| ReadError::malformed("stat", "missing '('"))?;
    let close = content
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| ReadError::malformed("stat", "missing ')'"))?;

    let pid: u32 = content[..open]
        .trim()
        .parse()
        .map_err(|_| ReadError::malformed("stat", "bad pid"))?;
    let comm = content[open + 1..close].to_string();

    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    let state = rest
        .get(F_STATE)
        .and_then(|s| s.chars().next())
        .ok_or_else(|| ReadError::malformed("stat", "missing state"))?;

    let stat = ProcStat {
        pid,
        state,
        ppid: field(&rest, F_PPID, "ppid")?,
        utime: field(&rest, F_UTIME, "utime")?,
        stime: field(&rest, F_STIME, "stime")?,
        cutime: field(&rest, F_CUTIME, "cutime")?,
        cstime: field(&rest, F_CSTIME, "cstime")?,
        priority: field(&rest, F_PRIORITY, "priority")?,
        nice: field(&rest, F_NICE, "nice")?,
        num_threads: field(&rest, F_NUM_THREADS, "num_threads")?,
        starttime: field(&rest, F_STARTTIME, "starttime")?,
        vsize: field(&rest, F_VSIZE, "vsize")?,
        // rss is a signed long in the kernel; clamp the impossible negative case
        rss: field::<i64>(&rest, F_RSS, "rss")?.max(0) as u64,
    };

    Ok(StatRecord { comm, stat })
}

/// Parses the seven page counts of a `/proc/<pid>/statm` line.
pub fn parse_statm(content: &str) -> Result<ProcStatm, ReadError> {
    let values: Vec<u64> = content
        .split_whitespace()
        .take(7)
        .map(|v| v.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|e| ReadError::malformed("statm", e.to_string()))?;

    if values.len() < 7 {
        return Err(ReadError::malformed(
            "statm",
            format!("expected 7 fields, got {}", values.len()),
        ));
    }

    Ok(ProcStatm {
        size: values[0],
        resident: values[1],
        shared: values[2],
        text: values[3],
        lib: values[4],
        data: values[5],
        dirty: values[6],
    })
}

/// Reads and parses `<proc_path>/stat`.
pub fn read_stat(proc_path: &Path) -> Result<StatRecord, ReadError> {
    let path = proc_path.join("stat");
    let bytes = fs::read(&path).map_err(|e| ReadError::unavailable(&path, e))?;
    // comm is arbitrary bytes set by the process itself
    parse_stat(&String::from_utf8_lossy(&bytes))
}

/// Reads and parses `<proc_path>/statm`.
pub fn read_statm(proc_path: &Path) -> Result<ProcStatm, ReadError> {
    let path = proc_path.join("statm");
    let bytes = fs::read(&path).map_err(|e| ReadError::unavailable(&path, e))?;
    parse_statm(&String::from_utf8_lossy(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAT_LINE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 3 4 20 0 7 0 12345 12345678 2048 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    #[test]
    fn test_parse_stat_fields() {
        let rec = parse_stat(STAT_LINE).unwrap();
        assert_eq!(rec.comm, "test_process");
        assert_eq!(rec.stat.pid, 1234);
        assert_eq!(rec.stat.state, 'S');
        assert_eq!(rec.stat.ppid, 1);
        assert_eq!(rec.stat.utime, 1000);
        assert_eq!(rec.stat.stime, 500);
        assert_eq!(rec.stat.cutime, 3);
        assert_eq!(rec.stat.cstime, 4);
        assert_eq!(rec.stat.priority, 20);
        assert_eq!(rec.stat.num_threads, 7);
        assert_eq!(rec.stat.starttime, 12345);
        assert_eq!(rec.stat.vsize, 12345678);
        assert_eq!(rec.stat.rss, 2048);
    }

    #[test]
    fn test_parse_stat_comm_with_parens_and_spaces() {
        let line = STAT_LINE.replace("(test_process)", "(Web Content (x) :)");
        let rec = parse_stat(&line).unwrap();
        assert_eq!(rec.comm, "Web Content (x) :");
        assert_eq!(rec.stat.state, 'S');
        assert_eq!(rec.stat.utime, 1000);
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(parse_stat("1234 test S 1 2 3").is_err());
        assert!(parse_stat("1234 (test) S 1 2 3").is_err());
        assert!(parse_stat("abc (test) S 1 1 1 0 -1 0 0 0 0 0 1 1 0 0 20 0 1 0 1 1 1").is_err());
        assert!(parse_stat("").is_err());
    }

    #[test]
    fn test_parse_statm() {
        let m = parse_statm("5000 1200 300 10 0 900 0\n").unwrap();
        assert_eq!(m.size, 5000);
        assert_eq!(m.resident, 1200);
        assert_eq!(m.data, 900);
        assert!(parse_statm("1 2 3").is_err());
        assert!(parse_statm("1 2 3 4 5 six 7").is_err());
    }

    #[test]
    fn test_read_stat_lossy_comm() {
        let dir = tempdir().expect("Failed to create temp dir");
        let line = STAT_LINE.replace("(test_process)", "(t\u{1}st)");
        let mut bytes = line.into_bytes();
        // overwrite the control byte with an invalid UTF-8 byte
        let at = bytes.iter().position(|b| *b == 1).unwrap();
        bytes[at] = 0xfe;
        fs::write(dir.path().join("stat"), bytes).unwrap();
        fs::write(dir.path().join("statm"), b"10 5 1 1 0 2 0\n").unwrap();

        let rec = read_stat(dir.path()).unwrap();
        assert_eq!(rec.comm, "t\u{FFFD}st");
        assert_eq!(rec.stat.utime, 1000);
        assert_eq!(read_statm(dir.path()).unwrap().resident, 5);
    }

    #[test]
    fn test_process_state_describe() {
        assert_eq!(ProcessState('R').describe(), "Running");
        assert_eq!(ProcessState('I').describe(), "Idle kernel thread");
        assert_eq!(ProcessState('x').describe(), "Dead");
        assert_eq!(ProcessState('?').describe(), "Unknown");
        assert_eq!(ProcessState('?').code(), '?');
    }
}
