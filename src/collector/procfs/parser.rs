//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of `/proc` files into
//! structured data, testable with plain string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// The fields of `/proc/[pid]/stat` that CPU sampling needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    /// User-mode CPU time in clock ticks.
    pub utime: u64,
    /// Kernel-mode CPU time in clock ticks.
    pub stime: u64,
    /// Start time after boot in clock ticks; identifies a pid incarnation.
    pub starttime: u64,
}

impl ProcStat {
    /// Total CPU time in clock ticks.
    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Index of `starttime` among the fields following the comm.
const STARTTIME_FIELD: usize = 19;

/// Parses `/proc/[pid]/stat` content.
///
/// The comm field can contain spaces and parentheses, so it is delimited by
/// the first `(` and the last `)`.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();

    if fields.len() <= STARTTIME_FIELD {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected {}+, got {}",
            STARTTIME_FIELD + 1,
            fields.len()
        )));
    }

    let parse_u64 = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        utime: parse_u64(11, "utime")?,
        stime: parse_u64(12, "stime")?,
        starttime: parse_u64(STARTTIME_FIELD, "starttime")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::filesystem::stat_line;

    #[test]
    fn test_parse_proc_stat() {
        let stat = parse_proc_stat(&stat_line(1234, "postgres", 500, 120)).unwrap();
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "postgres");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.utime, 500);
        assert_eq!(stat.stime, 120);
        assert_eq!(stat.starttime, 123400);
        assert_eq!(stat.cpu_ticks(), 620);
    }

    #[test]
    fn test_parse_proc_stat_comm_with_spaces_and_parens() {
        let stat = parse_proc_stat(&stat_line(77, "Web (Content) 2", 3, 4)).unwrap();
        assert_eq!(stat.comm, "Web (Content) 2");
        assert_eq!(stat.utime, 3);
    }

    #[test]
    fn test_parse_proc_stat_zombie() {
        let line = "99 (defunct) Z 1 99 99 0 -1 4194564 0 0 0 0 7 2 0 0 20 0 1 0 4500 0 0";
        let stat = parse_proc_stat(line).unwrap();
        assert_eq!(stat.state, 'Z');
        assert_eq!(stat.cpu_ticks(), 9);
    }

    #[test]
    fn test_parse_proc_stat_errors() {
        assert!(parse_proc_stat("").is_err());
        assert!(parse_proc_stat("12 no-parens S 1").is_err());
        assert!(parse_proc_stat("12 )bad( S 1").is_err());
        assert!(parse_proc_stat("abc (x) S 1 2 3").is_err());
        assert!(parse_proc_stat("12 (short) S 1 2 3").is_err());

        let bad_utime = "5 (x) S 1 5 5 0 -1 0 0 0 0 0 lots 2 0 0 20 0 1 0 100";
        let err = parse_proc_stat(bad_utime).unwrap_err();
        assert!(err.message.contains("utime"));
    }
}
