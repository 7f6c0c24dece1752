//! Local filesystem storage for scrape artifacts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ScrapeResult;
use crate::storage::{ResultStorage, WriteMetadata};

/// Writes and reads the scrape artifact at a fixed path.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultStorage for ResultWriter {
    async fn write_result(&self, result: &ScrapeResult) -> Result<WriteMetadata> {
        let bytes = serde_json::to_vec_pretty(result)?;
        self.write_bytes(&bytes).await?;

        log::info!(
            "Wrote {} products to {}",
            result.products.len(),
            self.path.display()
        );
        Ok(WriteMetadata {
            path: self.path.clone(),
            product_count: result.products.len(),
            timestamp: Utc::now(),
        })
    }

    async fn load_result(&self) -> Result<ScrapeResult> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::config(format!(
                    "no scrape artifact at {}; run a scrape first",
                    self.path.display()
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let result: ScrapeResult = serde_json::from_slice(&bytes)?;
        log::info!(
            "Loaded {} products scraped at {} from {}",
            result.products.len(),
            result.scraped_at,
            self.path.display()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::product;

    #[tokio::test]
    async fn write_creates_parent_dirs_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path().join("data/nested/products.json"));
        let result = ScrapeResult::new(3, vec![product("A"), product("B")]);

        let meta = writer.write_result(&result).await.unwrap();
        assert_eq!(meta.product_count, 2);
        assert!(meta.path.exists());
        assert!(!writer.path().with_extension("json.tmp").exists());

        let loaded = writer.load_result().await.unwrap();
        assert_eq!(loaded, result);
    }

    #[tokio::test]
    async fn write_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path().join("products.json"));

        writer
            .write_result(&ScrapeResult::new(5, vec![product("A")]))
            .await
            .unwrap();
        writer
            .write_result(&ScrapeResult::new(0, Vec::new()))
            .await
            .unwrap();

        let loaded = writer.load_result().await.unwrap();
        assert_eq!(loaded.total_found, 0);
        assert!(loaded.products.is_empty());
    }

    #[tokio::test]
    async fn artifact_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path().join("products.json"));
        writer
            .write_result(&ScrapeResult::new(1, vec![product("A")]))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(writer.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["totalScraped"], 1);
        assert_eq!(value["products"][0]["catalogNumber"], "A");
        assert!(raw.contains("\n  "), "expected pretty-printed JSON");
    }

    #[tokio::test]
    async fn missing_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path().join("absent.json"));
        assert!(matches!(
            writer.load_result().await,
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn invalid_products_are_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(
            &path,
            r#"{"scrapedAt":"2026-01-01T00:00:00Z","totalFound":1,"totalScraped":1,
                "products":[{"catalogNumber":"","name":"x","description":"","price":"1",
                "imageUrl":"","productUrl":"https://a.example/p","scrapedAt":"2026-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();

        let result = ResultWriter::new(path).load_result().await;
        assert!(matches!(result, Err(AppError::Json(_))));
    }
}
