//! Console report.
//!
//! Rows are collected while the runner works through the candidates and
//! rendered at the end, grouped under `** <group> **` banners in a fixed
//! order. Within a group, rows are ordered by phase, then by candidate.

use std::io::{self, Write};

use crate::dataset::KEY_WIDTH;
use crate::measure::Measurement;
use crate::phase::PIVOT_SPAN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    SequentialSet,
    SequentialGet,
    SequentialDelete,
    RandomSet,
    RandomGet,
    RandomDelete,
    SequentialPivot,
    RandomPivot,
    Scan,
    DegreeSweep,
}

impl Group {
    pub const ALL: [Group; 10] = [
        Group::SequentialSet,
        Group::SequentialGet,
        Group::SequentialDelete,
        Group::RandomSet,
        Group::RandomGet,
        Group::RandomDelete,
        Group::SequentialPivot,
        Group::RandomPivot,
        Group::Scan,
        Group::DegreeSweep,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Group::SequentialSet => "sequential set",
            Group::SequentialGet => "sequential get",
            Group::SequentialDelete => "sequential delete",
            Group::RandomSet => "random set",
            Group::RandomGet => "random get",
            Group::RandomDelete => "random delete",
            Group::SequentialPivot => "sequential pivot",
            Group::RandomPivot => "random pivot",
            Group::Scan => "scan",
            Group::DegreeSweep => "degree sweep",
        }
    }

    fn note(self) -> Option<String> {
        match self {
            Group::SequentialPivot | Group::RandomPivot => Some(format!(
                "Test getting {PIVOT_SPAN} consecutive items starting at a pivot."
            )),
            Group::Scan => Some("Test scanning over every item in the tree".to_string()),
            _ => None,
        }
    }
}

/// One measured (candidate, phase) pair.
#[derive(Clone, Debug)]
pub struct Row {
    pub group: Group,
    pub candidate: String,
    pub phase: String,
    /// Sort position within the group.
    pub rank: usize,
    pub measurement: Measurement,
    pub show_memory: bool,
}

/// `1234567` -> `"1,234,567"`.
pub fn commafy(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human-readable byte count in binary units. Negative deltas keep their sign.
pub fn mem_string(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    let size = bytes.unsigned_abs();
    let value = bytes as f64;
    if size < 1024 {
        format!("{bytes} bytes")
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", value / KB)
    } else if size < 1024 * 1024 * 1024 {
        format!("{:.1} MB", value / KB / KB)
    } else {
        format!("{:.1} GB", value / KB / KB / KB)
    }
}

/// Left column: `<candidate>:` padded to 11, phase padded to 17.
pub fn format_label(candidate: &str, phase: &str) -> String {
    format!("{:<11} {:<17} ", format!("{candidate}:"), phase)
}

pub fn format_measurement(m: &Measurement, show_memory: bool) -> String {
    let mut line = format!(
        "{} ops in {}ms, {}/sec, {} ns/op",
        commafy(m.ops as u64),
        m.elapsed.as_millis(),
        commafy(m.ops_per_sec() as u64),
        m.ns_per_op() as u64,
    );
    if show_memory {
        if let (Some(bytes), Some(per_op)) = (m.memory, m.bytes_per_op()) {
            line.push_str(&format!(", {}, {per_op:.1} bytes/op", mem_string(bytes)));
        }
    }
    line
}

#[derive(Debug)]
pub struct Reporter {
    degree: usize,
    count: usize,
    rows: Vec<Row>,
}

impl Reporter {
    pub fn new(degree: usize, count: usize) -> Self {
        Self {
            degree,
            count,
            rows: Vec::new(),
        }
    }

    pub fn record(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "degree={}, key=string ({KEY_WIDTH} bytes), val=int64, count={}",
            self.degree, self.count
        )?;

        for group in Group::ALL {
            let mut rows: Vec<&Row> = self.rows.iter().filter(|r| r.group == group).collect();
            if rows.is_empty() {
                continue;
            }
            rows.sort_by_key(|r| r.rank);

            writeln!(out)?;
            writeln!(out, "** {} **", group.title())?;
            if let Some(note) = group.note() {
                writeln!(out, "{note}")?;
            }
            for row in rows {
                writeln!(
                    out,
                    "{}{}",
                    format_label(&row.candidate, &row.phase),
                    format_measurement(&row.measurement, row.show_memory)
                )?;
            }
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn measurement(ops: usize, ms: u64, memory: Option<i64>) -> Measurement {
        Measurement {
            ops,
            elapsed: Duration::from_millis(ms),
            memory,
        }
    }

    #[test]
    fn test_commafy() {
        assert_eq!(commafy(0), "0");
        assert_eq!(commafy(999), "999");
        assert_eq!(commafy(1_000), "1,000");
        assert_eq!(commafy(3_294_776), "3,294,776");
        assert_eq!(commafy(100_000_000), "100,000,000");
    }

    #[test]
    fn test_mem_string_units() {
        assert_eq!(mem_string(480), "480 bytes");
        assert_eq!(mem_string(-12), "-12 bytes");
        assert_eq!(mem_string(2048), "2.0 KB");
        assert_eq!(mem_string(63_700_000), "60.7 MB");
        assert_eq!(mem_string(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_line_layout() {
        let line = format!(
            "{}{}",
            format_label("btree", "set-seq"),
            format_measurement(&measurement(1_000_000, 250, Some(52_428_800)), true)
        );
        assert_eq!(
            line,
            "btree:      set-seq           1,000,000 ops in 250ms, 4,000,000/sec, 250 ns/op, 50.0 MB, 52.4 bytes/op"
        );
    }

    #[test]
    fn test_memory_suffix_needs_sample_and_flag() {
        let m = measurement(10, 1, Some(640));
        assert!(format_measurement(&m, true).ends_with(", 640 bytes, 64.0 bytes/op"));
        assert!(!format_measurement(&m, false).contains("bytes"));
        let unsampled = measurement(10, 1, None);
        assert!(!format_measurement(&unsampled, true).contains("bytes"));
    }

    #[test]
    fn test_render_groups_in_order() {
        let mut reporter = Reporter::new(32, 5);
        let row = |group, candidate: &str, phase: &str, rank| Row {
            group,
            candidate: candidate.to_string(),
            phase: phase.to_string(),
            rank,
            measurement: measurement(5, 1, None),
            show_memory: false,
        };
        reporter.record(row(Group::Scan, "std", "scan", 22));
        reporter.record(row(Group::SequentialSet, "std", "set-seq-hint", 1));
        reporter.record(row(Group::SequentialSet, "std", "set-seq", 0));
        reporter.record(row(Group::SequentialSet, "art", "set-seq", 0));

        let mut out = Vec::new();
        reporter.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "degree=32, key=string (16 bytes), val=int64, count=5");
        assert_eq!(lines[3], "** sequential set **");
        assert!(lines[4].starts_with("std:        set-seq "));
        assert!(lines[5].starts_with("art:        set-seq "));
        assert!(lines[6].starts_with("std:        set-seq-hint "));
        assert_eq!(lines[8], "** scan **");
        assert_eq!(lines[9], "Test scanning over every item in the tree");
        assert!(!text.contains("** random"));
    }
}
