use anyhow::{anyhow, Result};
use bible_core::{ChapterKey, ChapterMarkers};
use clap::Parser;
use isl_bible_navigator::data::{
    discover_marker_files, load_catalog, read_marker_file, verse_coverage,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "catalog-check")]
#[command(about = "Validate a catalog against its verse marker files")]
struct Cli {
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    #[arg(long, default_value = "data/markers")]
    markers_dir: PathBuf,

    /// Also list enabled chapters that have no marker file
    #[arg(long)]
    missing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    let catalog = load_catalog(&cli.catalog).await?;
    let enabled_books = catalog
        .books()
        .filter(|b| !catalog.is_book_disabled(b))
        .count();
    let enabled_chapters: usize = catalog
        .books()
        .map(|b| catalog.enabled_chapters(b).count())
        .sum();
    info!("📚 Catalog: {} books ({} with video)", catalog.len(), enabled_books);
    info!("🎬 Chapters with video: {}", enabled_chapters);

    let files = discover_marker_files(&cli.markers_dir)?;
    info!("📂 Found {} marker files in {}", files.len(), cli.markers_dir.display());

    let mut covered = BTreeSet::new();
    let mut problems = 0usize;

    for file in &files {
        let Some(book) = catalog.lookup_book(&file.book) else {
            warn!("❓ {}: unknown book '{}'", file.path.display(), file.book);
            problems += 1;
            continue;
        };

        if !catalog.is_chapter_enabled(book, file.chapter) {
            warn!(
                "🚫 {}: {} {} has no video in the catalog",
                file.path.display(),
                book,
                file.chapter
            );
            problems += 1;
        }

        let key = ChapterKey::new(book, file.chapter);
        let checked = read_marker_file(&file.path)
            .and_then(|markers| ChapterMarkers::new(key.clone(), markers));
        match checked {
            Ok(chapter) => {
                let expected = catalog.list_verses(book, file.chapter);
                if !expected.is_empty() {
                    let coverage = verse_coverage(expected, chapter.markers());
                    if !coverage.missing.is_empty() {
                        warn!("🕳️ {}: missing verses {:?}", key, coverage.missing);
                    }
                    if !coverage.unexpected.is_empty() {
                        warn!("➕ {}: unexpected verses {:?}", key, coverage.unexpected);
                    }
                    problems += coverage.problems();
                }

                info!("✅ {}: {} markers", key, chapter.len());
                covered.insert(key);
            }
            Err(e) => {
                warn!("❌ {}: {}", file.path.display(), e);
                problems += 1;
            }
        }
    }

    if cli.missing {
        let mut missing = 0usize;
        for book in catalog.books() {
            for chapter in catalog.enabled_chapters(book) {
                let key = ChapterKey::new(book, chapter);
                if !covered.contains(&key) {
                    info!("📭 No verse markers for {} {}", book, chapter);
                    missing += 1;
                }
            }
        }
        info!("📊 {} of {} chapters lack verse markers", missing, enabled_chapters);
    }

    if problems > 0 {
        return Err(anyhow!("{} marker file problems found", problems));
    }

    info!("🎉 All marker files are valid");
    Ok(())
}
