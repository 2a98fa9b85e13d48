use std::path::Path;

use rand::Rng as _;
use rand::distributions::Alphanumeric;

use crate::error::ConfigError;

/// The write values for a run, materialized once before the workload starts.
///
/// Either a single random alphanumeric value of the configured size, or the
/// full contents of every file under the test-data directory, handed out
/// round-robin.
pub(crate) struct ValueCorpus {
    values: Vec<Vec<u8>>,
    next: usize,
}

impl ValueCorpus {
    pub(crate) fn random(value_size: usize) -> Self {
        let value: Vec<u8> = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(value_size)
            .collect();
        Self {
            values: vec![value],
            next: 0,
        }
    }

    pub(crate) fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut values = Vec::new();
        walk_dir(dir, &mut values)?;
        if values.is_empty() {
            return Err(ConfigError::EmptyValueCorpus {
                path: dir.to_path_buf(),
            });
        }
        values.sort();
        Ok(Self { values, next: 0 })
    }

    pub(crate) fn next_value(&mut self) -> &[u8] {
        let value = &self.values[self.next % self.values.len()];
        self.next = self.next.wrapping_add(1);
        value
    }
}

fn walk_dir(dir: &Path, values: &mut Vec<Vec<u8>>) -> Result<(), ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::ReadValueCorpus {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::ReadValueCorpus {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, values)?;
        } else if path.is_file() {
            let contents = std::fs::read(&path).map_err(|source| ConfigError::ReadValueCorpus {
                path: path.clone(),
                source,
            })?;
            values.push(contents);
        }
    }
    Ok(())
}
