use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::catalog::models::{Catalog, Category, VideoEntry};
use crate::natural;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi"];

/// Seek position the scanner assigns to every discovered file.
const SCANNED_THUMBNAIL_TIME: f64 = 1.0;

/// Public path prefix the video files are served under.
pub const VIDEOS_URL_PREFIX: &str = "videos";

// Scan `<root>/<category>/` for every category. A missing category directory
// yields an empty list; a missing root is an error so callers can fall back.
pub async fn scan_catalog(root: &Path) -> io::Result<Catalog> {
    let root_meta = fs::metadata(root).await?;
    if !root_meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        ));
    }

    let mut catalog = Catalog::empty();
    for category in Category::ALL {
        let videos = scan_category(root, category).await;
        debug!("Scanned {} videos in {}", videos.len(), category.key());
        *catalog.videos_mut(category) = videos;
    }

    info!(
        "Scanned {} videos under {}",
        catalog.total(),
        root.display()
    );
    Ok(catalog)
}

// Unreadable directories and entries are logged and skipped.
async fn scan_category(root: &Path, category: Category) -> Vec<VideoEntry> {
    let dir_path = root.join(category.key());

    let is_dir = fs::metadata(&dir_path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Vec::new();
    }

    let mut entries = match fs::read_dir(&dir_path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read {}: {}", dir_path.display(), e);
            return Vec::new();
        }
    };

    let mut videos = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to list {}: {}", dir_path.display(), e);
                break;
            }
        };
        let path = entry.path();

        if !is_video(&path) {
            continue;
        }

        // Follows symlinks; directories named like videos are skipped
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let title = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if filename.is_empty() {
            continue;
        }

        let mut video = VideoEntry::new(
            title,
            format!("{}/{}/{}", VIDEOS_URL_PREFIX, category.key(), filename),
        );
        video.thumbnail_time = SCANNED_THUMBNAIL_TIME;
        videos.push(video);
    }

    videos.sort_by(|a, b| natural::compare(&a.title, &b.title));
    videos
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn touch(path: &Path) {
        std_fs::write(path, b"").unwrap();
    }

    #[tokio::test]
    async fn lists_supported_files_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        let category = dir.path().join("category1");
        std_fs::create_dir_all(&category).unwrap();
        touch(&category.join("clip10.mp4"));
        touch(&category.join("clip2.MOV"));
        touch(&category.join("clip1.webm"));
        touch(&category.join("notes.txt"));
        std_fs::create_dir_all(category.join("nested.mp4")).unwrap();

        let catalog = scan_catalog(dir.path()).await.unwrap();
        let titles: Vec<_> = catalog.category1.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["clip1", "clip2", "clip10"]);
        assert_eq!(catalog.category1[1].url, "videos/category1/clip2.MOV");
        assert_eq!(catalog.category1[0].thumbnail_time, 1.0);
        assert_eq!(catalog.category1[0].description, "");
    }

    #[tokio::test]
    async fn missing_category_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::create_dir_all(dir.path().join("category3")).unwrap();
        touch(&dir.path().join("category3").join("a.avi"));

        let catalog = scan_catalog(dir.path()).await.unwrap();
        assert!(catalog.category1.is_empty());
        assert!(catalog.category2.is_empty());
        assert_eq!(catalog.category3.len(), 1);
        assert!(catalog.category4.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_videos_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let category = dir.path().join("category1");
        std_fs::create_dir_all(&category).unwrap();
        let target = dir.path().join("source.mp4");
        touch(&target);
        std::os::unix::fs::symlink(&target, category.join("linked.mp4")).unwrap();

        let catalog = scan_catalog(dir.path()).await.unwrap();
        assert_eq!(catalog.category1.len(), 1);
        assert_eq!(catalog.category1[0].url, "videos/category1/linked.mp4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn broken_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let category = dir.path().join("category2");
        std_fs::create_dir_all(&category).unwrap();
        touch(&category.join("ok.mp4"));
        std::os::unix::fs::symlink(dir.path().join("gone.mp4"), category.join("dangling.mp4"))
            .unwrap();
        std_fs::create_dir_all(dir.path().join("category1")).unwrap();
        touch(&dir.path().join("category1").join("a.mp4"));

        let catalog = scan_catalog(dir.path()).await.unwrap();
        let titles: Vec<_> = catalog.category2.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["ok"]);
        assert_eq!(catalog.category1.len(), 1);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_catalog(&dir.path().join("nope")).await.is_err());
    }
}
