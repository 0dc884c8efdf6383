//! Discovery of test-run artifacts under the screenshot and video roots.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::NotifyError;

const SCREENSHOT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    Video,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Video => "video",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Screenshot => SCREENSHOT_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
        }
    }

    pub fn matches(self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|value| value.to_str()) else {
            return false;
        };
        self.extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    }
}

/// A discovered artifact file. Contents are read only when it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Path relative to its root, `/`-separated; used as the upload filename.
    pub relative_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactInventory {
    pub screenshots: Vec<ArtifactRef>,
    pub videos: Vec<ArtifactRef>,
}

impl ArtifactInventory {
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty() && self.videos.is_empty()
    }
}

pub fn discover_artifact_inventory(
    screenshots_root: &Path,
    videos_root: &Path,
) -> Result<ArtifactInventory, NotifyError> {
    Ok(ArtifactInventory {
        screenshots: discover_artifacts(screenshots_root, ArtifactKind::Screenshot)?,
        videos: discover_artifacts(videos_root, ArtifactKind::Video)?,
    })
}

/// Walks `root` recursively and returns matching files sorted by relative name.
///
/// A missing root yields an empty list. Zero-length files are skipped since
/// the upload API rejects them.
pub fn discover_artifacts(
    root: &Path,
    kind: ArtifactKind,
) -> Result<Vec<ArtifactRef>, NotifyError> {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), kind = kind.as_str(), "artifact root not found");
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|error| {
            NotifyError::Artifacts(format!("failed to walk {}: {error}", root.display()))
        })?;
        if !entry.file_type().is_file() || !kind.matches(entry.path()) {
            continue;
        }
        let metadata = entry.metadata().map_err(|error| {
            NotifyError::Artifacts(format!(
                "failed to read metadata for {}: {error}",
                entry.path().display()
            ))
        })?;
        if metadata.len() == 0 {
            tracing::warn!(path = %entry.path().display(), "skipping empty artifact file");
            continue;
        }
        artifacts.push(ArtifactRef {
            kind,
            relative_name: relative_name(root, entry.path()),
            path: entry.into_path(),
        });
    }
    artifacts.sort_by(|left, right| left.relative_name.cmp(&right.relative_name));
    Ok(artifacts)
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
