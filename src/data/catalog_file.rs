/// Catalog JSON file
use anyhow::{Context, Result};
use bible_core::{Book, Catalog, CatalogBuilder, ChapterKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// On-disk catalog: book rows plus the chapters that have a video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Book rows; when empty the canonical 66-book table is used
    #[serde(default)]
    pub books: Vec<BookRecord>,
    /// One entry per chapter video
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    /// Numeric book id (1 = Genesis)
    pub id: u32,
    /// Display name
    pub name: String,
    /// Short code
    pub code: String,
    /// Number of chapters in the versification
    pub chapters: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Verse count per chapter, when known
    #[serde(default)]
    pub verses: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Book code
    pub book: String,
    /// Chapter number (0 = introduction)
    pub chapter: u32,
    /// Player video id
    #[serde(default)]
    pub video_id: Option<String>,
}

impl CatalogFile {
    /// Read and parse a catalog file
    pub async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let file: CatalogFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        debug!(
            "Catalog file {}: {} books, {} videos",
            path.display(),
            file.books.len(),
            file.videos.len()
        );
        Ok(file)
    }

    /// Build the immutable catalog
    pub fn to_catalog(&self) -> Result<Catalog> {
        let mut builder = if self.books.is_empty() {
            CatalogBuilder::canonical()
        } else {
            CatalogBuilder::new()
        };

        for record in &self.books {
            let mut book = Book::new(&record.code, &record.name, record.id);
            book.image_path = record.image.clone();
            builder = builder.add_book(book, record.chapters, record.aliases.clone());
            for (&chapter, &count) in &record.verses {
                builder = builder.verse_count(&record.code, chapter, count);
            }
        }

        for video in &self.videos {
            builder = builder.enable_chapter(&video.book, video.chapter);
        }

        Ok(builder.build()?)
    }

    /// Video id registered for a chapter
    pub fn video_for(&self, key: &ChapterKey) -> Option<&str> {
        self.videos
            .iter()
            .find(|v| v.chapter == key.chapter && v.book.eq_ignore_ascii_case(&key.book_code))
            .and_then(|v| v.video_id.as_deref())
    }
}

/// Load the catalog from a JSON file
pub async fn load_catalog(path: &Path) -> Result<Catalog> {
    let file = CatalogFile::read(path).await?;
    let catalog = file.to_catalog()?;
    info!("📚 Loaded catalog from {}", path.display());
    Ok(catalog)
}
