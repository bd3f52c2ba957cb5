use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Per-user namespaced storage for optional resume uploads. Every
/// operation is scoped under a directory named after the owning user id, so
/// one user can never touch another's files.
pub struct ResumeStore {
    root: PathBuf,
}

impl ResumeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: Uuid) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// File names come straight from an upload form; anything that could
    /// escape the user's directory is rejected.
    fn validate_name(name: &str) -> Result<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed.contains('/')
            || trimmed.contains('\\')
            || trimmed.contains("..")
            || Path::new(trimmed).is_absolute()
        {
            return Err(AppError::Validation(format!("invalid file name: {:?}", name)));
        }
        Ok(trimmed)
    }

    pub fn upload(&self, user_id: Uuid, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let file_name = Self::validate_name(file_name)?;
        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Persistence(format!("failed to create upload dir: {}", e)))?;

        let path = dir.join(file_name);
        fs::write(&path, contents)
            .map_err(|e| AppError::Persistence(format!("failed to write {}: {}", file_name, e)))?;

        info!("Stored resume {} ({} bytes) for user {}", file_name, contents.len(), user_id);
        Ok(path)
    }

    pub fn list(&self, user_id: Uuid) -> Result<Vec<String>> {
        let dir = self.user_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .map_err(|e| AppError::Persistence(format!("failed to list uploads: {}", e)))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| AppError::Persistence(format!("failed to list uploads: {}", e)))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, user_id: Uuid, file_name: &str) -> Result<()> {
        let file_name = Self::validate_name(file_name)?;
        let path = self.user_dir(user_id).join(file_name);
        if !path.exists() {
            return Err(AppError::Validation(format!("no such upload: {}", file_name)));
        }
        fs::remove_file(&path)
            .map_err(|e| AppError::Persistence(format!("failed to delete {}: {}", file_name, e)))?;
        info!("Deleted resume {} for user {}", file_name, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (ResumeStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("mockview-test-{}", Uuid::new_v4()));
        (ResumeStore::new(&root), root)
    }

    #[test]
    fn upload_list_delete_roundtrip() {
        let (store, root) = temp_store();
        let user = Uuid::new_v4();

        store.upload(user, "resume.pdf", b"pdf bytes").unwrap();
        store.upload(user, "cover.txt", b"hello").unwrap();
        assert_eq!(store.list(user).unwrap(), vec!["cover.txt", "resume.pdf"]);

        store.delete(user, "cover.txt").unwrap();
        assert_eq!(store.list(user).unwrap(), vec!["resume.pdf"]);

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn uploads_are_scoped_per_user() {
        let (store, root) = temp_store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.upload(alice, "resume.pdf", b"alice").unwrap();
        assert!(store.list(bob).unwrap().is_empty());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn rejects_path_traversal_names() {
        let (store, root) = temp_store();
        let user = Uuid::new_v4();

        for name in ["../escape.pdf", "a/b.pdf", "a\\b.pdf", "", "  "] {
            match store.upload(user, name, b"x") {
                Err(AppError::Validation(_)) => {}
                other => panic!("expected validation error for {:?}, got {:?}", name, other),
            }
        }

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn delete_of_missing_file_is_a_validation_error() {
        let (store, root) = temp_store();
        match store.delete(Uuid::new_v4(), "ghost.pdf") {
            Err(AppError::Validation(_)) => {}
            other => panic!("expected validation error, got {:?}", other),
        }
        let _ = fs::remove_dir_all(root);
    }
}
