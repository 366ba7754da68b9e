use crate::model::School;
use anyhow::Context;
use fd_lock::RwLock as FileLock;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge l'établissement depuis un support.
    fn load(&self) -> anyhow::Result<School>;
    /// Sauvegarde de manière atomique.
    fn save(&self, school: &School) -> anyhow::Result<()>;

    /// Exécute `f` en excluant tout autre écrivain du même support, y compris
    /// depuis un autre processus. `load` puis `save` dans `f` forment une
    /// transaction.
    fn exclusive<T>(&self, f: impl FnOnce() -> T) -> anyhow::Result<T> {
        Ok(f())
    }
}

/// Document JSON unique ; les écrivains se coordonnent par un verrou
/// consultatif sur `<fichier>.lock`.
pub struct JsonStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_path),
        })
    }
}

impl Storage for JsonStorage {
    /// Un fichier absent donne un établissement vide ; toute autre erreur remonte.
    fn load(&self) -> anyhow::Result<School> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(School::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let school: School = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(school)
    }

    fn save(&self, school: &School) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(school)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }

    // Le document est remplacé par renommage à chaque sauvegarde : le verrou
    // porte sur un fichier annexe dont l'inode ne change pas.
    fn exclusive<T>(&self, f: impl FnOnce() -> T) -> anyhow::Result<T> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("opening {}", self.lock_path.display()))?;
        let mut lock = FileLock::new(file);
        let _guard = lock
            .write()
            .with_context(|| format!("locking {}", self.lock_path.display()))?;
        Ok(f())
    }
}

/// Support en mémoire (tests, intégration dans un autre service).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<School>,
}

impl MemoryStorage {
    pub fn new(school: School) -> Self {
        Self {
            data: Mutex::new(school),
        }
    }

    /// Dernier état sauvegardé.
    pub fn saved(&self) -> anyhow::Result<School> {
        let guard = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(guard.clone())
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> anyhow::Result<School> {
        self.saved()
    }

    fn save(&self, school: &School) -> anyhow::Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *guard = school.clone();
        Ok(())
    }
}
