use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::Result,
    sql::schema::Table,
    storage::{Storage, codec},
};

const EXTENSION: &str = "table";

/// One `<table>.table` file per table inside a data directory
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    atomic_writes: bool,
}

impl FileStorage {
    /// Opens the data directory, creating it if absent
    pub fn new(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        info!(
            dir = %config.data_dir.display(),
            atomic_writes = config.atomic_writes,
            "opened data directory"
        );
        Ok(Self {
            dir: config.data_dir.clone(),
            atomic_writes: config.atomic_writes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, EXTENSION))
    }
}

impl Storage for FileStorage {
    fn load_tables(&mut self) -> Result<Vec<Table>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let data = fs::read_to_string(&path)?;
            tables.push(codec::decode(name, &data)?);
        }
        Ok(tables)
    }

    /// Rewrites the whole table file
    ///
    /// With atomic writes the data goes to a temp file in the same
    /// directory, which is then renamed over the target.
    fn save_table(&mut self, table: &Table) -> Result<()> {
        let path = self.path(&table.name);
        let data = codec::encode(table);
        if self.atomic_writes {
            let mut file = NamedTempFile::new_in(&self.dir)?;
            file.write_all(data.as_bytes())?;
            file.as_file().sync_all()?;
            file.persist(&path)?;
        } else {
            fs::write(&path, data)?;
        }
        debug!(table = %table.name, rows = table.len(), path = %path.display(), "saved table");
        Ok(())
    }
}
