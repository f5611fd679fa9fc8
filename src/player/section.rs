//! Sections, track slots and their alternate takes.
//!
//! A [`Section`] is one song: an ordered list of [`Track`] slots. Each slot
//! holds one or two [`TrackItem`]s, the alternate takes that can be swapped
//! for each other. The arrangement file read by the `play` command maps
//! directly onto these types.

use crate::constants::MAX_ALTERNATES;
use crate::error::ArrangementError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// A playable file. Immutable once created and shared between segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSource {
    pub id: Uuid,
    pub location: PathBuf,
    pub display_name: String,
}

impl AudioSource {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let display_name = location
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| location.display().to_string());
        Self {
            id: Uuid::new_v4(),
            location,
            display_name,
        }
    }

    pub fn with_name(location: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::new(location)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackItem {
    pub id: Uuid,
    pub name: String,
    /// Empty until a file is assigned
    pub source: Option<Arc<AudioSource>>,
}

impl TrackItem {
    pub fn new(name: impl Into<String>, source: Option<Arc<AudioSource>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let source = AudioSource::new(path);
        Self::new(source.display_name.clone(), Some(Arc::new(source)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub items: Vec<TrackItem>,
}

impl Track {
    pub fn new(items: Vec<TrackItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            items,
        }
    }

    /// Items that have a file assigned
    pub fn populated(&self) -> Vec<&Arc<AudioSource>> {
        self.items.iter().filter_map(|item| item.source.as_ref()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub tracks: Vec<Track>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            tracks: Vec::new(),
        }
    }

    pub fn with_tracks(title: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Self::new(title)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArrangementFile {
    #[serde(default)]
    sections: Vec<SectionEntry>,
}

#[derive(Debug, Deserialize)]
struct SectionEntry {
    title: String,
    #[serde(default)]
    tracks: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    #[serde(default)]
    takes: Vec<TakeEntry>,
}

#[derive(Debug, Deserialize)]
struct TakeEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

/// Load sections from a TOML arrangement file.
///
/// Take paths may use `~` and are resolved relative to the arrangement file.
pub fn load_arrangement(path: &Path) -> Result<Vec<Section>, ArrangementError> {
    let contents = fs::read_to_string(path).map_err(|source| ArrangementError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_arrangement(&contents, path)
}

fn parse_arrangement(contents: &str, path: &Path) -> Result<Vec<Section>, ArrangementError> {
    let file: ArrangementFile =
        toml::from_str(contents).map_err(|source| ArrangementError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    file.sections
        .into_iter()
        .map(|entry| {
            let mut section = Section::new(entry.title);
            for (index, track) in entry.tracks.into_iter().enumerate() {
                if track.takes.len() > MAX_ALTERNATES {
                    return Err(ArrangementError::TooManyTakes {
                        section: section.title.clone(),
                        track: index + 1,
                        count: track.takes.len(),
                    });
                }
                let items = track
                    .takes
                    .into_iter()
                    .map(|take| resolve_take(take, base_dir))
                    .collect();
                section.tracks.push(Track::new(items));
            }
            Ok(section)
        })
        .collect()
}

fn resolve_take(take: TakeEntry, base_dir: &Path) -> TrackItem {
    let source = take.path.map(|raw| {
        let expanded = shellexpand::tilde(&raw);
        let path = Path::new(expanded.as_ref());
        let location = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };
        Arc::new(match &take.name {
            Some(name) => AudioSource::with_name(location, name.clone()),
            None => AudioSource::new(location),
        })
    });

    let name = take
        .name
        .or_else(|| source.as_ref().map(|s| s.display_name.clone()))
        .unwrap_or_else(|| "(empty)".to_string());

    TrackItem::new(name, source)
}
