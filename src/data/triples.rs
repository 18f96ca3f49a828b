//! Reading `head<sep>relation<sep>tail` files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{KinbagError, Result};

/// A single fact: `head --relation--> tail`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    pub fn new(head: impl Into<String>, relation: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

/// Load triples from a delimited file with no header row.
///
/// Blank lines are skipped. Any other line must split into exactly three
/// non-empty fields, otherwise the whole load fails with
/// [`KinbagError::MalformedInput`] carrying the 1-based line number.
pub fn load_triples(path: impl AsRef<Path>, delimiter: char) -> Result<Vec<Triple>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut triples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => KinbagError::MalformedInput {
                line: i + 1,
                message: "line is not valid UTF-8".to_string(),
            },
            _ => KinbagError::Io(e),
        })?;
        if let Some(triple) = parse_line(&line, i + 1, delimiter)? {
            triples.push(triple);
        }
    }

    tracing::debug!(path = %path.as_ref().display(), triples = triples.len(), "loaded triples");
    Ok(triples)
}

/// Parse triples from an in-memory string using the same rules as
/// [`load_triples`].
pub fn parse_triples(text: &str, delimiter: char) -> Result<Vec<Triple>> {
    let mut triples = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(triple) = parse_line(line, i + 1, delimiter)? {
            triples.push(triple);
        }
    }
    Ok(triples)
}

fn parse_line(line: &str, line_no: usize, delimiter: char) -> Result<Option<Triple>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    if parts.len() != 3 {
        return Err(KinbagError::MalformedInput {
            line: line_no,
            message: format!("expected 3 columns, found {}", parts.len()),
        });
    }
    if let Some(pos) = parts.iter().position(|p| p.is_empty()) {
        return Err(KinbagError::MalformedInput {
            line: line_no,
            message: format!("column {} is empty", pos + 1),
        });
    }

    Ok(Some(Triple::new(parts[0], parts[1], parts[2])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blank_lines() {
        let text = "alice\tmother\tbob\n\n  \nbob\tbrother\tcarol\n";
        let triples = parse_triples(text, '\t').unwrap();
        assert_eq!(
            triples,
            vec![
                Triple::new("alice", "mother", "bob"),
                Triple::new("bob", "brother", "carol"),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_wrong_column_count() {
        let text = "alice\tmother\tbob\nbob\tbrother\n";
        match parse_triples(text, '\t') {
            Err(KinbagError::MalformedInput { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_empty_field() {
        let text = "alice\t\tbob\n";
        assert!(matches!(
            parse_triples(text, '\t'),
            Err(KinbagError::MalformedInput { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_custom_delimiter_and_crlf() {
        let triples = parse_triples("a,r,b\r\nc,r,d\r\n", ',').unwrap();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[1], Triple::new("c", "r", "d"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Alice\tsister\tBeth").unwrap();
        writeln!(file, "Beth\tmother\tCarl").unwrap();

        let triples = load_triples(file.path(), '\t').unwrap();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].head, "Alice");
    }

    #[test]
    fn test_load_rejects_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a\tr\tb\n\xff\xfe\tr\tc\n").unwrap();

        assert!(matches!(
            load_triples(file.path(), '\t'),
            Err(KinbagError::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.tsv");
        assert!(matches!(load_triples(&path, '\t'), Err(KinbagError::Io(_))));
    }
}
