//! Persistence of pages and assets under the output root

use std::path::Path;

/// Writes a file, creating parent directories as needed
///
/// Used concurrently by the asset workers; distinct workers never share a
/// path because assets are deduplicated by local path before dispatch.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/logo.png");

        write_file(&path, [0x89u8, 0x50, 0x4e, 0x47]).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);

        write_file(&path, "replaced").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "replaced");
    }
}
