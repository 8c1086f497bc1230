use crate::tinycore::error::{Error, Result};
use crate::tinycore::index::{MemoryIndex, Posting};
use crate::tinycore::lexer::MAX_TERM_BYTES;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// On-disk index layout, all integers 32-bit little-endian:
//   docids.bin    primary keys, one per line, docid order
//   postings.bin  8-byte records (docid u32, tf u32), contiguous per term
//   vocab.bin     records: len u8, term bytes, 0x00, offset u32, size u32
//   lengths.bin   document lengths, u32, docid order
// Term order in vocab.bin and postings.bin is hash order, not sorted.
pub const DOCIDS_FILE: &str = "docids.bin";
pub const POSTINGS_FILE: &str = "postings.bin";
pub const VOCAB_FILE: &str = "vocab.bin";
pub const LENGTHS_FILE: &str = "lengths.bin";

const POSTING_BYTES: usize = 8;

struct VocabRecord<'a> {
    term: &'a str,
    offset: u32,
    size: u32,
}

// Each file is written to a .tmp sibling and renamed once every write
// has succeeded, so a failed run never leaves a torn index file. The
// four renames are not atomic as a group.
pub fn write_index(index: &MemoryIndex, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let records = write_postings(index, &tmp_path(dir, POSTINGS_FILE))?;
    write_vocab(&records, &tmp_path(dir, VOCAB_FILE))?;
    write_docids(index, &tmp_path(dir, DOCIDS_FILE))?;
    write_lengths(index, &tmp_path(dir, LENGTHS_FILE))?;
    for name in [POSTINGS_FILE, VOCAB_FILE, DOCIDS_FILE, LENGTHS_FILE] {
        fs::rename(tmp_path(dir, name), dir.join(name))?;
    }
    log::info!(
        "wrote index of {} documents, {} terms to {}",
        index.get_document_count(),
        index.get_term_count(),
        dir.display()
    );
    Ok(())
}

fn tmp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.tmp", name))
}

fn write_postings<'a>(index: &'a MemoryIndex, path: &Path) -> Result<Vec<VocabRecord<'a>>> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut records = Vec::with_capacity(index.vocab.len());
    let mut offset: u64 = 0;
    for (term, postings) in &index.vocab {
        let size = (postings.len() * POSTING_BYTES) as u64;
        if offset + size > u32::MAX as u64 {
            return Err(Error::IndexTooLarge);
        }
        for posting in postings {
            writer.write_all(&posting.docid.to_le_bytes())?;
            writer.write_all(&posting.tf.to_le_bytes())?;
        }
        records.push(VocabRecord {
            term,
            offset: offset as u32,
            size: size as u32,
        });
        offset += size;
    }
    writer.flush()?;
    Ok(records)
}

fn write_vocab(records: &[VocabRecord], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        assert!(record.term.len() >= 1 && record.term.len() <= MAX_TERM_BYTES);
        writer.write_all(&[record.term.len() as u8])?;
        writer.write_all(record.term.as_bytes())?;
        writer.write_all(&[0u8])?;
        writer.write_all(&record.offset.to_le_bytes())?;
        writer.write_all(&record.size.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_docids(index: &MemoryIndex, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for key in &index.primary_keys {
        writer.write_all(key.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn write_lengths(index: &MemoryIndex, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for length in &index.doc_lengths {
        writer.write_all(&length.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct VocabEntry {
    offset: u32,
    size: u32,
}

#[derive(Debug)]
pub struct DiskIndex {
    dictionary: HashMap<String, VocabEntry>,
    doc_lengths: Vec<u32>,
    primary_keys: Vec<String>,
    average_length: f64,
    postings_file: File,
}

pub struct IndexStats {
    pub document_count: usize,
    pub average_document_length: f64,
    pub shortest_document: u32,
    pub longest_document: u32,
    pub term_count: usize,
    pub most_common: Option<(String, u64)>,
}

impl DiskIndex {
    pub fn open(dir: &Path) -> Result<Self> {
        let doc_lengths = read_lengths(dir)?;
        let primary_keys = read_docids(dir, doc_lengths.len())?;
        let dictionary = read_vocab(dir)?;
        let postings_file = match File::open(dir.join(POSTINGS_FILE)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::CorruptIndex(format!(
                    "{} is missing from {}",
                    POSTINGS_FILE,
                    dir.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let total: u64 = doc_lengths.iter().map(|&length| length as u64).sum();
        let average_length = total as f64 / doc_lengths.len() as f64;
        Ok(DiskIndex {
            dictionary,
            doc_lengths,
            primary_keys,
            average_length,
            postings_file,
        })
    }

    pub fn get_document_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn get_average_document_length(&self) -> f64 {
        self.average_length
    }

    pub fn get_document_length(&self, docid: u32) -> u32 {
        self.doc_lengths[docid as usize]
    }

    pub fn get_primary_key(&self, docid: u32) -> &str {
        &self.primary_keys[docid as usize]
    }

    pub fn get_term_count(&self) -> usize {
        self.dictionary.len()
    }

    // one seek and one exact read per term, the postings file is never
    // loaded wholesale
    pub fn postings(&mut self, term: &str) -> Result<Option<Vec<Posting>>> {
        let entry = match self.dictionary.get(term) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        let mut buf = vec![0u8; entry.size as usize];
        self.postings_file.seek(SeekFrom::Start(entry.offset as u64))?;
        if let Err(e) = self.postings_file.read_exact(&mut buf) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(Error::CorruptIndex(format!(
                    "postings for \"{}\" run past the end of {}",
                    term, POSTINGS_FILE
                )));
            }
            return Err(e.into());
        }
        let postings = buf
            .chunks_exact(POSTING_BYTES)
            .map(|record| Posting {
                docid: u32::from_le_bytes(record[0..4].try_into().unwrap()),
                tf: u32::from_le_bytes(record[4..8].try_into().unwrap()),
            })
            .collect();
        Ok(Some(postings))
    }

    pub fn stats(&mut self) -> Result<IndexStats> {
        let shortest = self.doc_lengths.iter().min().copied().unwrap_or(0);
        let longest = self.doc_lengths.iter().max().copied().unwrap_or(0);
        let mut most_common: Option<(String, u64)> = None;
        // lexicographic order, an occurrence-count tie keeps the smaller term
        let mut terms: Vec<String> = self.dictionary.keys().cloned().collect();
        terms.sort_unstable();
        for term in terms {
            let postings = match self.postings(&term)? {
                Some(postings) => postings,
                None => continue,
            };
            let occurrences: u64 = postings.iter().map(|p| p.tf as u64).sum();
            let better = match &most_common {
                Some((_, best)) => occurrences > *best,
                None => true,
            };
            if better {
                most_common = Some((term, occurrences));
            }
        }
        Ok(IndexStats {
            document_count: self.doc_lengths.len(),
            average_document_length: self.average_length,
            shortest_document: shortest,
            longest_document: longest,
            term_count: self.dictionary.len(),
            most_common,
        })
    }
}

fn read_lengths(dir: &Path) -> Result<Vec<u32>> {
    let path = dir.join(LENGTHS_FILE);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingIndex(dir.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    // an empty lengths file means no index was ever written here
    if bytes.is_empty() {
        return Err(Error::MissingIndex(dir.display().to_string()));
    }
    if bytes.len() % 4 != 0 {
        return Err(Error::CorruptIndex(format!(
            "{} is {} bytes, not a multiple of 4",
            LENGTHS_FILE,
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
        .collect())
}

fn read_docids(dir: &Path, expected: usize) -> Result<Vec<String>> {
    let path = dir.join(DOCIDS_FILE);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::CorruptIndex(format!(
                "{} is missing from {}",
                DOCIDS_FILE,
                dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8(bytes)
        .map_err(|_| Error::CorruptIndex(format!("{} is not valid UTF-8", DOCIDS_FILE)))?;
    let primary_keys: Vec<String> = text.lines().map(str::to_string).collect();
    if primary_keys.len() != expected {
        return Err(Error::CorruptIndex(format!(
            "{} holds {} keys for {} documents",
            DOCIDS_FILE,
            primary_keys.len(),
            expected
        )));
    }
    Ok(primary_keys)
}

fn read_vocab(dir: &Path) -> Result<HashMap<String, VocabEntry>> {
    let path = dir.join(VOCAB_FILE);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::CorruptIndex(format!(
                "{} is missing from {}",
                VOCAB_FILE,
                dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let mut dictionary = HashMap::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let len = bytes[pos] as usize;
        // len byte, term, NUL, offset, size
        let end = pos + 1 + len + 1 + 8;
        if end > bytes.len() {
            return Err(Error::CorruptIndex(format!(
                "{}: truncated record at byte {}",
                VOCAB_FILE, pos
            )));
        }
        let term = std::str::from_utf8(&bytes[pos + 1..pos + 1 + len])
            .map_err(|_| {
                Error::CorruptIndex(format!(
                    "{}: term at byte {} is not valid UTF-8",
                    VOCAB_FILE, pos
                ))
            })?
            .to_string();
        if bytes[pos + 1 + len] != 0 {
            return Err(Error::CorruptIndex(format!(
                "{}: missing terminator at byte {}",
                VOCAB_FILE,
                pos + 1 + len
            )));
        }
        let offset = u32::from_le_bytes(bytes[pos + 2 + len..pos + 6 + len].try_into().unwrap());
        let size = u32::from_le_bytes(bytes[pos + 6 + len..pos + 10 + len].try_into().unwrap());
        if size as usize % POSTING_BYTES != 0 {
            return Err(Error::CorruptIndex(format!(
                "{}: postings size {} for \"{}\" is not a multiple of {}",
                VOCAB_FILE, size, term, POSTING_BYTES
            )));
        }
        dictionary.insert(term, VocabEntry { offset, size });
        pos = end;
    }
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tinycore::index::IndexBuilder;

    fn sample_index() -> MemoryIndex {
        let mut builder = IndexBuilder::new();
        builder.index_line("<DOC><DOCNO>A-1</DOCNO>apple apple banana</DOC>");
        builder.index_line("<DOC><DOCNO>A-2</DOCNO>banana banana</DOC>");
        builder.finish()
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let mut disk = DiskIndex::open(dir.path()).unwrap();
        assert_eq!(disk.get_document_count(), 2);
        assert_eq!(disk.get_average_document_length(), 2.5);
        assert_eq!(disk.get_document_length(0), 3);
        assert_eq!(disk.get_document_length(1), 2);
        assert_eq!(disk.get_primary_key(0), "A-1");
        assert_eq!(disk.get_primary_key(1), "A-2");
        assert_eq!(disk.get_term_count(), 2);
        assert_eq!(
            disk.postings("apple").unwrap(),
            Some(vec![Posting { docid: 0, tf: 2 }])
        );
        assert_eq!(
            disk.postings("banana").unwrap(),
            Some(vec![Posting { docid: 0, tf: 1 }, Posting { docid: 1, tf: 2 }])
        );
        assert_eq!(disk.postings("cherry").unwrap(), None);
    }

    #[test]
    fn test_single_term_byte_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = IndexBuilder::new();
        builder.index_line("<DOC><DOCNO>D1</DOCNO>apple apple</DOC>");
        write_index(&builder.finish(), dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join(LENGTHS_FILE)).unwrap(), 2u32.to_le_bytes());
        assert_eq!(fs::read(dir.path().join(DOCIDS_FILE)).unwrap(), b"D1\n");
        assert_eq!(
            fs::read(dir.path().join(POSTINGS_FILE)).unwrap(),
            [0, 0, 0, 0, 2, 0, 0, 0]
        );
        let mut vocab = vec![5u8];
        vocab.extend_from_slice(b"apple");
        vocab.push(0);
        vocab.extend_from_slice(&0u32.to_le_bytes());
        vocab.extend_from_slice(&8u32.to_le_bytes());
        assert_eq!(fs::read(dir.path().join(VOCAB_FILE)).unwrap(), vocab);
    }

    #[test]
    fn test_no_tmp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 4);
        assert!(names.iter().all(|name| !name.ends_with(".tmp")));
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiskIndex::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingIndex(_)));
    }

    #[test]
    fn test_empty_lengths_is_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        fs::write(dir.path().join(LENGTHS_FILE), b"").unwrap();
        let err = DiskIndex::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingIndex(_)));
    }

    #[test]
    fn test_misaligned_lengths_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let mut bytes = fs::read(dir.path().join(LENGTHS_FILE)).unwrap();
        bytes.pop();
        fs::write(dir.path().join(LENGTHS_FILE), &bytes).unwrap();
        let err = DiskIndex::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_truncated_vocab_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let mut bytes = fs::read(dir.path().join(VOCAB_FILE)).unwrap();
        bytes.truncate(bytes.len() - 3);
        fs::write(dir.path().join(VOCAB_FILE), &bytes).unwrap();
        let err = DiskIndex::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_docids_count_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        fs::write(dir.path().join(DOCIDS_FILE), b"A-1\n").unwrap();
        let err = DiskIndex::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_postings_past_eof_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let bytes = fs::read(dir.path().join(POSTINGS_FILE)).unwrap();
        fs::write(dir.path().join(POSTINGS_FILE), &bytes[..bytes.len() - 8]).unwrap();
        let mut disk = DiskIndex::open(dir.path()).unwrap();
        // whichever term owned the tail of the file now reads past it
        let apple = disk.postings("apple");
        let banana = disk.postings("banana");
        assert!(apple.is_err() || banana.is_err());
    }

    #[test]
    fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        write_index(&sample_index(), dir.path()).unwrap();
        let mut disk = DiskIndex::open(dir.path()).unwrap();
        let stats = disk.stats().unwrap();
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.average_document_length, 2.5);
        assert_eq!(stats.shortest_document, 2);
        assert_eq!(stats.longest_document, 3);
        assert_eq!(stats.term_count, 2);
        assert_eq!(stats.most_common, Some(("banana".to_string(), 3)));
    }

    #[test]
    fn test_stats_breaks_count_ties_by_term() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = IndexBuilder::new();
        builder.index_line("<DOC><DOCNO>T-1</DOCNO>banana banana</DOC>");
        builder.index_line("<DOC><DOCNO>T-2</DOCNO>apple apple</DOC>");
        write_index(&builder.finish(), dir.path()).unwrap();
        let mut disk = DiskIndex::open(dir.path()).unwrap();
        let stats = disk.stats().unwrap();
        assert_eq!(stats.most_common, Some(("apple".to_string(), 2)));
    }
}
