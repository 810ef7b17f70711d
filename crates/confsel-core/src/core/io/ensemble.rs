use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name CREST uses for its energy-sorted conformer ensemble.
pub const ENSEMBLE_FILE_NAME: &str = "crest_conformers.xyz";

const FALLBACK_MOLECULE_NAME: &str = "molecule";

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid atom count on line 1 (value: '{value}')")]
    InvalidAtomCount { value: String },
}

/// One XYZ block of an ensemble: the atom-count line, the comment line and
/// exactly `atom_count` coordinate lines, all kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conformer {
    pub atom_count: usize,
    pub count_line: String,
    pub comment: String,
    pub coordinates: Vec<String>,
}

impl Conformer {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        [self.count_line.as_str(), self.comment.as_str()]
            .into_iter()
            .chain(self.coordinates.iter().map(String::as_str))
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        for line in self.lines() {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()
    }
}

/// Lazily slices fixed-size conformer blocks off the front of an ensemble.
///
/// The iterator stops at `limit` blocks or at the first incomplete block,
/// whichever comes first. A trailing partial block is never yielded.
#[derive(Debug)]
pub struct ConformerBlocks<'a> {
    lines: &'a [String],
    atom_count: usize,
    offset: usize,
    remaining: usize,
}

impl<'a> ConformerBlocks<'a> {
    pub fn new(lines: &'a [String], limit: usize) -> Result<Self, EnsembleError> {
        let atom_count = parse_atom_count(lines.first().map(String::as_str))?;
        Ok(Self {
            lines,
            atom_count,
            offset: 0,
            remaining: limit,
        })
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    fn block_len(&self) -> usize {
        self.atom_count + 2
    }
}

impl Iterator for ConformerBlocks<'_> {
    type Item = Conformer;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let end = self.offset.checked_add(self.block_len())?;
        let block = self.lines.get(self.offset..end)?;
        self.offset = end;
        self.remaining -= 1;

        Some(Conformer {
            atom_count: self.atom_count,
            count_line: block[0].clone(),
            comment: block[1].clone(),
            coordinates: block[2..].to_vec(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let available = self.lines.len().saturating_sub(self.offset) / self.block_len();
        let upper = available.min(self.remaining);
        (upper, Some(upper))
    }
}

fn parse_atom_count(line: Option<&str>) -> Result<usize, EnsembleError> {
    let value = line.unwrap_or("").trim();
    match value.parse::<usize>() {
        // The block also holds the count and comment lines.
        Ok(count) if count > 0 && count.checked_add(2).is_some() => Ok(count),
        _ => Err(EnsembleError::InvalidAtomCount {
            value: value.to_string(),
        }),
    }
}

/// A located `crest_conformers.xyz` file, loaded into memory.
#[derive(Debug, Clone)]
pub struct EnsembleFile {
    path: PathBuf,
    molecule: String,
    lines: Vec<String>,
}

impl EnsembleFile {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, EnsembleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_content(path, &content))
    }

    pub fn from_content<P: AsRef<Path>>(path: P, content: &str) -> Self {
        let path = path.as_ref().to_path_buf();
        let molecule = molecule_name(&path);
        Self {
            path,
            molecule,
            lines: content.lines().map(str::to_owned).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the molecule, taken from the directory holding the ensemble.
    pub fn molecule(&self) -> &str {
        &self.molecule
    }

    pub fn conformers(&self, limit: usize) -> Result<ConformerBlocks<'_>, EnsembleError> {
        ConformerBlocks::new(&self.lines, limit)
    }

    /// Number of complete conformer blocks in the file.
    pub fn count_conformers(&self) -> Result<usize, EnsembleError> {
        Ok(self.conformers(usize::MAX)?.count())
    }
}

fn molecule_name(path: &Path) -> String {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolved = if parent.file_name().is_some() {
        parent
    } else {
        parent.canonicalize().unwrap_or(parent)
    };

    resolved
        .file_name()
        .or_else(|| path.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_MOLECULE_NAME.to_string())
}
