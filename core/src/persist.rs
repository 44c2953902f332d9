//! The PageRank score table on disk: one `<page> <score>` pair per line.
//!
//! Readers split each line on whitespace and parse the second field as a
//! float, so page names must not contain whitespace.

use crate::config::SCORE_TABLE_FILE;
use crate::error::{Result, VsrError};
use crate::pagerank::ScoreTable;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Files kept next to a crawled corpus.
pub struct CorpusPaths {
    pub root: PathBuf,
}

impl CorpusPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn score_table(&self) -> PathBuf {
        self.root.join(SCORE_TABLE_FILE)
    }
}

/// Write `table` to `path`. The file is written under a temporary name and
/// renamed into place, so readers see either the old table or the new one.
pub fn save_score_table(path: &Path, table: &ScoreTable) -> Result<()> {
    if let Some(name) = table.iter().map(|(name, _)| name).find(|n| n.is_empty() || n.contains(char::is_whitespace)) {
        return Err(VsrError::InvalidPageName { name: name.to_string() });
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = write_table(&tmp, table).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), pages = table.len(), "score table saved");
    Ok(())
}

fn write_table(path: &Path, table: &ScoreTable) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (name, score) in table.iter() {
        writeln!(out, "{name} {score}")?;
    }
    out.into_inner().map_err(|e| e.into_error())?.sync_all()
}

/// Read a whole score table; any bad line fails the load.
pub fn load_score_table(path: &Path) -> Result<ScoreTable> {
    let table = read_score_table(BufReader::new(File::open(path)?))?;
    tracing::debug!(path = %path.display(), pages = table.len(), "score table loaded");
    Ok(table)
}

/// Parse `<page> <score>` lines. Blank lines are skipped; lines are numbered
/// from 1 in errors.
pub fn read_score_table<R: BufRead>(reader: R) -> Result<ScoreTable> {
    let mut table = ScoreTable::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (name, score) = match fields.as_slice() {
            [] => continue,
            [name, score] => (*name, score.parse::<f64>().ok().filter(|s| s.is_finite())),
            _ => (line.as_str(), None),
        };
        let Some(score) = score else {
            return Err(VsrError::MalformedScoreLine { line: line_no, content: line.clone() });
        };
        if table.insert(name, score).is_some() {
            return Err(VsrError::DuplicateScore { name: name.to_string(), line: line_no });
        }
    }
    Ok(table)
}
