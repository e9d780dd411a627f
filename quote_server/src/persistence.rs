//! Сохранение заявок.

use commons::errors::QuoteError;
use commons::lead::LeadRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Хранилище заявок (CRM, таблица, файл).
pub trait LeadStore: Send {
    fn save(&mut self, lead: &LeadRecord) -> Result<(), QuoteError>;
}

/// Файл, в который заявки дописываются построчно.
#[derive(Debug)]
pub struct FileLeadStore {
    path: PathBuf,
}

impl FileLeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LeadStore for FileLeadStore {
    fn save(&mut self, lead: &LeadRecord) -> Result<(), QuoteError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|err| {
                QuoteError::storage_err(format!("каталог {}: {err}", dir.display()))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                QuoteError::storage_err(format!("файл {}: {err}", self.path.display()))
            })?;
        writeln!(file, "{lead}")
            .and_then(|_| file.flush())
            .map_err(|err| {
                QuoteError::storage_err(format!("запись {}: {err}", self.path.display()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons::lead::{LeadStatus, QuoteKind};
    use std::str::FromStr;

    fn lead(quote_id: &str) -> LeadRecord {
        LeadRecord {
            quote_id: quote_id.to_string(),
            issued_at: 1_760_000_000,
            kind: QuoteKind::Solar,
            name: "Lucía".to_string(),
            email: String::new(),
            phone: "+54 261 555".to_string(),
            location: "mendoza".to_string(),
            summary: "2.50 kWp 5 panels 1 inverter(s)".to_string(),
            total: 1_950_000.0,
            status: LeadStatus::NewQuote,
        }
    }

    #[test]
    fn appends_one_line_per_lead() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leads.txt");
        let mut store = FileLeadStore::new(&path);

        store.save(&lead("aaaaaaaaaaaa")).unwrap();
        store.save(&lead("bbbbbbbbbbbb")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let restored = LeadRecord::from_str(lines[1]).unwrap();
        assert_eq!(restored, lead("bbbbbbbbbbbb"));
    }

    #[test]
    fn unwritable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // Каталог вместо файла.
        let mut store = FileLeadStore::new(dir.path());

        let err = store.save(&lead("cccccccccccc")).unwrap_err();
        assert!(matches!(err, QuoteError::StorageError(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_is_storage_error() {
        let mut store = FileLeadStore::new("/dev/full");

        let err = store.save(&lead("dddddddddddd")).unwrap_err();
        assert!(matches!(err, QuoteError::StorageError(_)));
    }
}
