//! The extraction tools work from a manifest: one utterance per line with
//! the id and the paths of its pitch and duration arrays, pipe delimited
//! the same way LJ Speech style metadata files are. Keeping the file format
//! this dumb means a training pipeline can spit one out with a shell
//! one-liner.
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub struct Entry {
    pub id: String,
    pub pitch_path: PathBuf,
    pub durations_path: PathBuf,
}

pub struct Manifest {
    pub entries: Vec<Entry>,
}

impl Manifest {
    pub fn load(p: impl AsRef<Path>) -> anyhow::Result<Self> {
        let f = File::open(p)?;
        Self::from_reader(io::BufReader::new(f))
    }

    /// Works from any reader so tests can run against in-memory manifests
    /// instead of littering the project with fixture files.
    fn from_reader(reader: impl io::Read) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'|')
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut entries = vec![];

        for result in rdr.records() {
            let record = result?;
            match (record.get(0), record.get(1), record.get(2)) {
                (Some(id), Some(pitch), Some(durations)) => {
                    entries.push(Entry {
                        id: id.to_string(),
                        pitch_path: PathBuf::from(pitch),
                        durations_path: PathBuf::from(durations),
                    });
                }
                _ => error!("Incomplete record: {:?}", record),
            }
        }
        Ok(Self { entries })
    }

    /// Validates there's nothing wrong with the manifest. Will log any
    /// errors it finds and return false
    pub fn validate(&self) -> bool {
        info!("Validating manifest");
        let mut ids = HashSet::new();
        let mut success = true;
        for entry in &self.entries {
            if entry.id.trim().is_empty() {
                error!(
                    "Entry with no id, pitch file: {}",
                    entry.pitch_path.display()
                );
                success = false;
            }
            if entry.pitch_path.as_os_str().is_empty() {
                error!("{} has no pitch file", entry.id);
                success = false;
            }
            if entry.durations_path.as_os_str().is_empty() {
                error!("{} has no durations file", entry.id);
                success = false;
            }
            if ids.contains(entry.id.as_str()) {
                error!("Duplicate ID: {}", entry.id);
                success = false;
            }
            ids.insert(entry.id.as_str());
        }
        info!("Validation complete");
        success
    }
}
