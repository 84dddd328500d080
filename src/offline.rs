//! Offline catalog backed by a JSON snapshot.
//!
//! A snapshot lists the listener's top artists plus every artist and album
//! the traversal may visit:
//!
//! ```json
//! {
//!   "top_artists": ["spotify:artist:seed"],
//!   "artists": {
//!     "spotify:artist:seed": {
//!       "name": "Seed",
//!       "related": ["spotify:artist:other"],
//!       "albums": []
//!     }
//!   },
//!   "albums": {
//!     "spotify:album:a": {
//!       "tracks": [{ "uri": "spotify:track:1", "popularity": 42 }]
//!     }
//!   }
//! }
//! ```
//!
//! Playlists "created" against the snapshot live in memory only.

use crate::catalog::{
    AlbumRef, ArtistRef, CatalogClient, PlaylistHandle, TimeRange, TrackRef, Visibility,
};
use crate::error::ProviderError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub top_artists: Vec<ArtistRef>,
    #[serde(default)]
    pub artists: BTreeMap<ArtistRef, ArtistEntry>,
    #[serde(default)]
    pub albums: BTreeMap<AlbumRef, AlbumEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistEntry {
    pub name: String,
    #[serde(default)]
    pub related: Vec<ArtistRef>,
    #[serde(default)]
    pub albums: Vec<AlbumRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub uri: TrackRef,
    pub popularity: u32,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Io`] if the file cannot be read, [`ProviderError::Decode`]
    /// if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let content = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&content)?;
        debug!(
            "Loaded snapshot {}: {} artists, {} albums",
            path.display(),
            snapshot.artists.len(),
            snapshot.albums.len()
        );
        Ok(snapshot)
    }
}

/// Fluent construction of snapshots, mostly for tests and benchmarks.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: CatalogSnapshot,
}

impl SnapshotBuilder {
    /// Adds a top artist, registering it by name if it is not known yet.
    #[must_use]
    pub fn top_artist(mut self, uri: &str, name: &str) -> Self {
        let artist = ArtistRef::new(uri);
        self.snapshot
            .artists
            .entry(artist.clone())
            .or_insert_with(|| ArtistEntry {
                name: name.to_string(),
                ..ArtistEntry::default()
            });
        self.snapshot.top_artists.push(artist);
        self
    }

    /// Adds or replaces an artist's name, relations and discography.
    #[must_use]
    pub fn artist(mut self, uri: &str, name: &str, related: &[&str], albums: &[&str]) -> Self {
        self.snapshot.artists.insert(
            ArtistRef::new(uri),
            ArtistEntry {
                name: name.to_string(),
                related: related.iter().copied().map(ArtistRef::from).collect(),
                albums: albums.iter().copied().map(AlbumRef::from).collect(),
            },
        );
        self
    }

    /// Adds or replaces an album and its `(track, popularity)` list.
    #[must_use]
    pub fn album(mut self, uri: &str, tracks: &[(&str, u32)]) -> Self {
        self.snapshot.albums.insert(
            AlbumRef::new(uri),
            AlbumEntry {
                name: None,
                tracks: tracks
                    .iter()
                    .map(|&(track, popularity)| TrackEntry {
                        uri: TrackRef::new(track),
                        popularity,
                    })
                    .collect(),
            },
        );
        self
    }

    #[must_use]
    pub fn build(self) -> CatalogSnapshot {
        self.snapshot
    }
}

/// A playlist written to the offline catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflinePlaylist {
    pub handle: PlaylistHandle,
    pub user: String,
    pub name: String,
    pub visibility: Visibility,
    pub description: String,
    pub tracks: Vec<TrackRef>,
}

/// [`CatalogClient`] over an in-memory [`CatalogSnapshot`].
///
/// Unknown artists have no relations and no albums; asking for the name of
/// an unknown artist or the tracks of an unknown album is a 404, like the
/// real service.
#[derive(Debug, Clone, Default)]
pub struct OfflineCatalog {
    snapshot: CatalogSnapshot,
    playlists: Vec<OfflinePlaylist>,
}

impl OfflineCatalog {
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            playlists: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// See [`CatalogSnapshot::load`].
    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        Ok(Self::new(CatalogSnapshot::load(path)?))
    }

    #[must_use]
    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    /// Playlists created so far, oldest first.
    #[must_use]
    pub fn playlists(&self) -> &[OfflinePlaylist] {
        &self.playlists
    }

    fn not_found(what: &str, id: &str) -> ProviderError {
        ProviderError::Status {
            status: 404,
            body: format!("{what} {id} not in snapshot"),
        }
    }
}

impl CatalogClient for OfflineCatalog {
    fn top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>, ProviderError> {
        debug!("Offline snapshot ignores time range {time_range}");
        Ok(self.snapshot.top_artists.clone())
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>, ProviderError> {
        Ok(self
            .snapshot
            .artists
            .get(artist)
            .map(|entry| entry.related.clone())
            .unwrap_or_default())
    }

    fn artist_albums(&self, artist: &ArtistRef) -> Result<Vec<AlbumRef>, ProviderError> {
        Ok(self
            .snapshot
            .artists
            .get(artist)
            .map(|entry| entry.albums.clone())
            .unwrap_or_default())
    }

    fn album_track_popularities(
        &self,
        album: &AlbumRef,
    ) -> Result<Vec<(TrackRef, u32)>, ProviderError> {
        let entry = self
            .snapshot
            .albums
            .get(album)
            .ok_or_else(|| Self::not_found("album", album.as_str()))?;
        Ok(entry
            .tracks
            .iter()
            .map(|track| (track.uri.clone(), track.popularity))
            .collect())
    }

    fn artist_name(&self, artist: &ArtistRef) -> Result<String, ProviderError> {
        self.snapshot
            .artists
            .get(artist)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| Self::not_found("artist", artist.as_str()))
    }

    fn create_playlist(
        &mut self,
        user: &str,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<PlaylistHandle, ProviderError> {
        let handle = PlaylistHandle::new(format!("offline:playlist:{}", self.playlists.len() + 1));
        info!("Created offline playlist {handle} '{name}' for {user}");
        self.playlists.push(OfflinePlaylist {
            handle: handle.clone(),
            user: user.to_string(),
            name: name.to_string(),
            visibility,
            description: description.to_string(),
            tracks: Vec::new(),
        });
        Ok(handle)
    }

    fn add_tracks(
        &mut self,
        _user: &str,
        playlist: &PlaylistHandle,
        tracks: &[TrackRef],
    ) -> Result<(), ProviderError> {
        let target = self
            .playlists
            .iter_mut()
            .find(|p| &p.handle == playlist)
            .ok_or_else(|| Self::not_found("playlist", playlist.as_str()))?;
        target.tracks.extend_from_slice(tracks);
        Ok(())
    }
}
