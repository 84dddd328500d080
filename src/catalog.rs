//! Catalog access: opaque identifiers, the provider port, and the adapter
//! the selection code talks to.
//!
//! [`CatalogClient`] is implemented by each concrete provider
//! ([`crate::spotify::SpotifyClient`], [`crate::offline::OfflineCatalog`]).
//! [`Catalog`] wraps a client and turns "nothing there" into empty results so
//! the traversal can keep going, while provider failures still propagate.

use crate::algorithm::{self, PopularityBand};
use crate::error::{ProviderError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(uri: impl Into<String>) -> Self {
                Self(uri.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(uri: &str) -> Self {
                Self::new(uri)
            }
        }

        impl From<String> for $name {
            fn from(uri: String) -> Self {
                Self(uri)
            }
        }
    };
}

opaque_ref!(
    /// Provider identifier of an artist.
    ArtistRef
);
opaque_ref!(
    /// Provider identifier of an album.
    AlbumRef
);
opaque_ref!(
    /// Provider identifier of a track.
    TrackRef
);
opaque_ref!(
    /// Provider identifier of a created playlist.
    PlaylistHandle
);

/// Listening-history window used to find top artists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks
    #[default]
    ShortTerm,
    /// Roughly the last six months
    MediumTerm,
    /// Several years of history
    LongTerm,
}

impl TimeRange {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who can see a created playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Operations an external music catalog must provide.
///
/// Implementations report "no data" as an empty `Vec`, and anything that
/// went wrong on the way to the provider as a [`ProviderError`].
pub trait CatalogClient {
    /// Top artists of the authenticated listener for the given window.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>, ProviderError>;

    /// Artists the provider considers related to `artist`.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>, ProviderError>;

    /// Albums released by `artist`.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn artist_albums(&self, artist: &ArtistRef) -> Result<Vec<AlbumRef>, ProviderError>;

    /// Every track on `album` with its popularity in `0..=100`.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn album_track_popularities(
        &self,
        album: &AlbumRef,
    ) -> Result<Vec<(TrackRef, u32)>, ProviderError>;

    /// Display name of `artist`.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn artist_name(&self, artist: &ArtistRef) -> Result<String, ProviderError>;

    /// Creates an empty playlist owned by `user`.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn create_playlist(
        &mut self,
        user: &str,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<PlaylistHandle, ProviderError>;

    /// Appends `tracks` to `playlist`, in order.
    ///
    /// # Errors
    ///
    /// Transport, auth or decoding failures.
    fn add_tracks(
        &mut self,
        user: &str,
        playlist: &PlaylistHandle,
        tracks: &[TrackRef],
    ) -> Result<(), ProviderError>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for Box<C> {
    fn top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>, ProviderError> {
        (**self).top_artists(time_range)
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>, ProviderError> {
        (**self).related_artists(artist)
    }

    fn artist_albums(&self, artist: &ArtistRef) -> Result<Vec<AlbumRef>, ProviderError> {
        (**self).artist_albums(artist)
    }

    fn album_track_popularities(
        &self,
        album: &AlbumRef,
    ) -> Result<Vec<(TrackRef, u32)>, ProviderError> {
        (**self).album_track_popularities(album)
    }

    fn artist_name(&self, artist: &ArtistRef) -> Result<String, ProviderError> {
        (**self).artist_name(artist)
    }

    fn create_playlist(
        &mut self,
        user: &str,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<PlaylistHandle, ProviderError> {
        (**self).create_playlist(user, name, visibility, description)
    }

    fn add_tracks(
        &mut self,
        user: &str,
        playlist: &PlaylistHandle,
        tracks: &[TrackRef],
    ) -> Result<(), ProviderError> {
        (**self).add_tracks(user, playlist, tracks)
    }
}

/// An album's tracks together with its acceptance band.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumBand {
    pub album: AlbumRef,
    pub band: PopularityBand,
    pub tracks: Vec<(TrackRef, u32)>,
    pub qualifying: Vec<TrackRef>,
}

impl AlbumBand {
    #[must_use]
    pub fn popularities(&self) -> Vec<u32> {
        self.tracks.iter().map(|(_, popularity)| *popularity).collect()
    }
}

/// Read/write facade over a [`CatalogClient`].
pub struct Catalog<C> {
    client: C,
}

impl<C: CatalogClient> Catalog<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    /// Top artists for seeding; empty when the listener has no history.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn fetch_top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>> {
        let artists = self.client.top_artists(time_range)?;
        debug!("{} top artists for {time_range}", artists.len());
        Ok(artists)
    }

    /// Related artists; empty when the provider has no relation data.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn fetch_related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>> {
        let related = self.client.related_artists(artist)?;
        if related.is_empty() {
            debug!("No related artists for {artist}");
        }
        Ok(related)
    }

    /// Albums of `artist`. An absent artist has no albums.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn fetch_albums(&self, artist: Option<&ArtistRef>) -> Result<Vec<AlbumRef>> {
        let Some(artist) = artist else {
            debug!("No artist to look up albums for");
            return Ok(Vec::new());
        };

        let albums = self.client.artist_albums(artist)?;
        if albums.is_empty() {
            warn!("No albums found for {artist}");
        }
        Ok(albums)
    }

    /// One `(track, popularity)` pair per track on the album.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn fetch_track_popularities(&self, album: &AlbumRef) -> Result<Vec<(TrackRef, u32)>> {
        let tracks = self.client.album_track_popularities(album)?;
        debug!("{} tracks on {album}", tracks.len());
        Ok(tracks)
    }

    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn fetch_artist_name(&self, artist: &ArtistRef) -> Result<String> {
        Ok(self.client.artist_name(artist)?)
    }

    /// Tracks of `album` with its band and the tracks inside it.
    /// `None` when the album has no tracks.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn popularity_band(
        &self,
        album: &AlbumRef,
        max_popularity: u32,
    ) -> Result<Option<AlbumBand>> {
        let tracks = self.fetch_track_popularities(album)?;
        if tracks.is_empty() {
            debug!("Album {album} has no tracks, skipping");
            return Ok(None);
        }

        let popularities: Vec<u32> = tracks.iter().map(|(_, popularity)| *popularity).collect();
        let band = algorithm::popularity_band(&popularities, max_popularity)?;
        let qualifying = algorithm::qualifying_tracks(&tracks, band);
        debug!(
            "Album {album}: band {band}, {}/{} tracks qualify",
            qualifying.len(),
            tracks.len()
        );

        Ok(Some(AlbumBand {
            album: album.clone(),
            band,
            tracks,
            qualifying,
        }))
    }
}
