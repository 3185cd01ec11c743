use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::domain::{Document, DocumentId, NewDocument};
use super::registry::{decode_date, encode_date, DocumentRegistry, RegistryError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DOCUMENT_COLUMNS: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    expiry_date TEXT,
    file_path TEXT,
    recipient_email TEXT";

/// File-backed registry. Each operation opens its own connection, so the
/// registry value itself carries no open handle and can be shared freely.
#[derive(Debug, Clone)]
pub struct SqliteDocumentRegistry {
    path: PathBuf,
}

impl SqliteDocumentRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the registry and runs [`DocumentRegistry::initialize`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let registry = Self::new(path);
        registry.initialize()?;
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, RegistryError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn table_sql(conn: &Connection) -> Result<Option<String>, RegistryError> {
        let sql = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(sql)
    }

    /// Rebuilds a table created without AUTOINCREMENT so deleted ids stay retired.
    /// Existing ids are copied as-is; the sequence resumes after the largest one.
    fn rebuild_with_autoincrement(&self, conn: &mut Connection) -> Result<(), RegistryError> {
        let columns = Self::column_names(conn)?;
        let recipient = if columns.iter().any(|column| column == "recipient_email") {
            "recipient_email"
        } else {
            "NULL"
        };

        let tx = conn.transaction()?;
        tx.execute(
            &format!("CREATE TABLE documents_rebuilt ({DOCUMENT_COLUMNS})"),
            [],
        )?;
        let copied = tx.execute(
            &format!(
                "INSERT INTO documents_rebuilt (id, name, expiry_date, file_path, recipient_email)
                 SELECT id, name, expiry_date, file_path, {recipient} FROM documents"
            ),
            [],
        )?;
        tx.execute("DROP TABLE documents", [])?;
        tx.execute("ALTER TABLE documents_rebuilt RENAME TO documents", [])?;
        tx.commit()?;

        info!(path = %self.path.display(), copied, "rebuilt legacy documents table");
        Ok(())
    }

    fn column_names(conn: &Connection) -> Result<Vec<String>, RegistryError> {
        let mut stmt = conn.prepare("PRAGMA table_info(documents)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl DocumentRegistry for SqliteDocumentRegistry {
    fn initialize(&self) -> Result<(), RegistryError> {
        let mut conn = self.connect()?;

        match Self::table_sql(&conn)? {
            None => {
                conn.execute(
                    &format!("CREATE TABLE IF NOT EXISTS documents ({DOCUMENT_COLUMNS})"),
                    [],
                )?;
            }
            Some(sql) if !sql.to_ascii_uppercase().contains("AUTOINCREMENT") => {
                self.rebuild_with_autoincrement(&mut conn)?;
            }
            Some(_) => {}
        }

        let columns = Self::column_names(&conn)?;
        if !columns.iter().any(|column| column == "recipient_email") {
            conn.execute("ALTER TABLE documents ADD COLUMN recipient_email TEXT", [])?;
            info!(path = %self.path.display(), "added recipient_email column to documents");
        }

        debug!(path = %self.path.display(), "document registry ready");
        Ok(())
    }

    fn add(&self, document: NewDocument) -> Result<DocumentId, RegistryError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO documents (name, expiry_date, file_path, recipient_email)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                document.name,
                encode_date(document.expiry_date),
                document.file_path,
                document.recipient_email,
            ],
        )?;

        let id = DocumentId(conn.last_insert_rowid());
        info!(%id, name = %document.name, expiry_date = %document.expiry_date, "document added");
        Ok(id)
    }

    fn delete(&self, id: DocumentId) -> Result<bool, RegistryError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.0])?;

        if removed == 0 {
            debug!(%id, "delete ignored, no such document");
        } else {
            info!(%id, "document deleted");
        }
        Ok(removed > 0)
    }

    fn list_all(&self) -> Result<Vec<Document>, RegistryError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, expiry_date, file_path, recipient_email
             FROM documents ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, expiry_date, file_path, recipient_email)| {
                let id = DocumentId(id);
                let expiry_date = decode_date(id, expiry_date.as_deref().unwrap_or_default())?;
                Ok(Document {
                    id,
                    name: name.unwrap_or_default(),
                    expiry_date,
                    file_path,
                    recipient_email,
                })
            })
            .collect()
    }
}
