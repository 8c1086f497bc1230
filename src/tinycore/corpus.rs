use crate::tinycore::error::{Error, Result};
use encoding_rs::WINDOWS_1252;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

// Line iterator over a collection file. TREC collections predate UTF-8,
// so a line that fails UTF-8 validation is redecoded as Windows-1252
// instead of aborting the whole indexing run.
#[derive(Debug)]
pub struct CollectionReader {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl CollectionReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::InputFile {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(CollectionReader {
            reader: BufReader::new(file),
            buf: Vec::new(),
        })
    }
}

impl Iterator for CollectionReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                let line = match std::str::from_utf8(&self.buf) {
                    Ok(line) => line.to_string(),
                    Err(_) => WINDOWS_1252.decode(&self.buf).0.into_owned(),
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reads_lines_and_strips_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.txt");
        fs::write(&path, b"one\r\ntwo\nthree").unwrap();
        let lines: Vec<String> = CollectionReader::open(&path)
            .unwrap()
            .map(|line| line.unwrap())
            .collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.txt");
        fs::write(&path, b"caf\xe9\nplain\n").unwrap();
        let lines: Vec<String> = CollectionReader::open(&path)
            .unwrap()
            .map(|line| line.unwrap())
            .collect();
        assert_eq!(lines, vec!["café", "plain"]);
    }

    #[test]
    fn test_missing_file() {
        let err = CollectionReader::open(Path::new("/no/such/collection")).unwrap_err();
        assert!(matches!(err, Error::InputFile { .. }));
    }
}
