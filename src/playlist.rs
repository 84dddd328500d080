//! # Playlist Selection
//!
//! Builds a playlist by walking outward from one of the listener's top
//! artists:
//!
//! ```text
//! top artists ──pick──▶ seed ──related──▶ artist ──albums──▶ album ──band──▶ track
//!                        ▲                                                   │
//!                        └──────────── next pass (2 picks per artist) ◀──────┘
//! ```
//!
//! The outer loop is bounded by attempts, not by results: every pass
//! advances the song counter by [`SONGS_PER_ARTIST`] whether or not it added
//! anything. A sparse catalog therefore yields a short playlist instead of an
//! endless walk, and the number of provider calls per run stays capped.
//!
//! Missing data along the way (no related artists, no albums, an empty
//! album, no track inside the band, a track already drafted) is skipped.
//! Only provider failures and a missing seed end the run early.

use crate::algorithm::DEFAULT_MAX_POPULARITY;
use crate::catalog::{
    AlbumRef, ArtistRef, Catalog, CatalogClient, PlaylistHandle, TimeRange, TrackRef, Visibility,
};
use crate::error::{Result, SelectionError};
use crate::sampler::pick_random;
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;

/// Default number of tracks a run aims for.
pub const DEFAULT_TARGET_SIZE: usize = 10;

/// Picks made from one related artist before another is sampled. Also the
/// amount the outer counter advances per pass.
pub const SONGS_PER_ARTIST: usize = 2;

/// Description attached to every created playlist.
pub const PLAYLIST_DESCRIPTION: &str = "auto-created";

/// Parameters of one selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Inclusive upper popularity bound for candidate tracks
    pub max_popularity: u32,
    /// Maximum number of tracks in the playlist
    pub target_size: usize,
    /// History window the seed artist is drawn from
    pub time_range: TimeRange,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_popularity: DEFAULT_MAX_POPULARITY,
            target_size: DEFAULT_TARGET_SIZE,
            time_range: TimeRange::ShortTerm,
        }
    }
}

impl SelectionConfig {
    /// Number of outer passes a run makes.
    #[must_use]
    pub const fn passes(&self) -> usize {
        self.target_size.div_ceil(SONGS_PER_ARTIST)
    }
}

/// Ordered, duplicate-free list of selected tracks with a fixed capacity.
#[derive(Debug, Clone, Default)]
pub struct PlaylistDraft {
    tracks: Vec<TrackRef>,
    seen: HashSet<TrackRef>,
    capacity: usize,
}

impl PlaylistDraft {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tracks: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `track` unless it is already drafted or the draft is full.
    /// Returns whether the track was added.
    pub fn push(&mut self, track: TrackRef) -> bool {
        if self.is_full() || self.seen.contains(&track) {
            return false;
        }
        self.seen.insert(track.clone());
        self.tracks.push(track);
        true
    }

    #[must_use]
    pub fn contains(&self, track: &TrackRef) -> bool {
        self.seen.contains(track)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.tracks.len() >= self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    #[must_use]
    pub fn into_tracks(self) -> Vec<TrackRef> {
        self.tracks
    }
}

/// What happened during the traversal, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Outer passes made
    pub passes: usize,
    /// Album picks attempted
    pub attempts: usize,
    /// Attempts that produced a new track
    pub accepted: usize,
    /// Attempts that found no qualifying track
    pub absent: usize,
    /// Attempts whose track was already drafted
    pub duplicates: usize,
    /// Attempts whose new track found the draft already full
    pub overflow: usize,
}

impl TraversalStats {
    /// Attempts with a recorded outcome. Always equals `attempts`.
    #[must_use]
    pub const fn resolved(&self) -> usize {
        self.accepted + self.absent + self.duplicates + self.overflow
    }
}

/// Result of a traversal without a playlist being written.
#[derive(Debug, Clone)]
pub struct Exploration {
    pub seed: ArtistRef,
    pub seed_name: String,
    pub tracks: Vec<TrackRef>,
    pub stats: TraversalStats,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub playlist: PlaylistHandle,
    pub name: String,
    pub seed: ArtistRef,
    pub tracks: Vec<TrackRef>,
    pub stats: TraversalStats,
}

/// `songs like <artist>, <month>.<day>.<year>` with unpadded numbers.
///
/// ```
/// use chrono::NaiveDate;
/// use songslike::playlist::playlist_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(playlist_name("Björk", date), "songs like Björk, 3.7.2024");
/// ```
#[must_use]
pub fn playlist_name(artist_name: &str, date: NaiveDate) -> String {
    format!(
        "songs like {artist_name}, {}.{}.{}",
        date.month(),
        date.day(),
        date.year()
    )
}

/// Drives one playlist-generation run against a catalog.
///
/// The random source is injected so runs can be replayed with a seeded
/// generator; each explorer owns its own.
pub struct PlaylistExplorer<C, R> {
    catalog: Catalog<C>,
    rng: R,
    config: SelectionConfig,
}

impl<C: CatalogClient, R: Rng> PlaylistExplorer<C, R> {
    pub fn new(client: C, rng: R, config: SelectionConfig) -> Self {
        Self {
            catalog: Catalog::new(client),
            rng,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog<C> {
        &self.catalog
    }

    /// Hands back the catalog client, e.g. to inspect what was written.
    pub fn into_client(self) -> C {
        self.catalog.into_inner()
    }

    /// Picks the seed artist from the listener's top artists.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoSeedArtist`] without listening history, or any
    /// provider failure.
    pub fn pick_seed(&mut self) -> Result<ArtistRef> {
        let top_artists = self.catalog.fetch_top_artists(self.config.time_range)?;
        let seed = pick_random(&top_artists, &mut self.rng).ok_or(SelectionError::NoSeedArtist)?;
        info!("Seed artist {seed} (from {} top artists)", top_artists.len());
        Ok(seed)
    }

    /// Picks one track from `album` whose popularity lies inside the album's
    /// band. `None` for an absent or empty album, or when nothing qualifies.
    ///
    /// # Errors
    ///
    /// Provider failures only.
    pub fn pick_song(&mut self, album: Option<&AlbumRef>) -> Result<Option<TrackRef>> {
        let Some(album) = album else {
            return Ok(None);
        };
        let Some(band) = self.catalog.popularity_band(album, self.config.max_popularity)? else {
            return Ok(None);
        };
        Ok(pick_random(&band.qualifying, &mut self.rng))
    }

    /// Runs the bounded traversal from `seed` and returns the draft.
    ///
    /// # Errors
    ///
    /// Provider failures only; every soft absence is skipped.
    pub fn fill_draft(&mut self, seed: &ArtistRef) -> Result<(PlaylistDraft, TraversalStats)> {
        let mut draft = PlaylistDraft::with_capacity(self.config.target_size);
        let mut stats = TraversalStats::default();
        let mut song_index = 0;

        while song_index < self.config.target_size {
            stats.passes += 1;
            let related = self.catalog.fetch_related_artists(seed)?;
            let related_artist = pick_random(&related, &mut self.rng);
            match &related_artist {
                Some(artist) => debug!("Pass {}: related artist {artist}", stats.passes),
                None => debug!("Pass {}: {seed} has no related artists", stats.passes),
            }

            for _ in 0..SONGS_PER_ARTIST {
                stats.attempts += 1;
                let albums = self.catalog.fetch_albums(related_artist.as_ref())?;
                let album = pick_random(&albums, &mut self.rng);

                match self.pick_song(album.as_ref())? {
                    Some(track) if draft.contains(&track) => {
                        debug!("{track} already drafted");
                        stats.duplicates += 1;
                    }
                    Some(track) if draft.is_full() => {
                        debug!("Draft full, dropping {track}");
                        stats.overflow += 1;
                    }
                    Some(track) => {
                        debug!("Drafted {track}");
                        draft.push(track);
                        stats.accepted += 1;
                    }
                    None => {
                        debug!("No qualifying song this attempt");
                        stats.absent += 1;
                    }
                }
            }

            song_index += SONGS_PER_ARTIST;
        }

        info!(
            "Drafted {} tracks in {} passes ({} absent, {} duplicate)",
            draft.len(),
            stats.passes,
            stats.absent,
            stats.duplicates
        );
        Ok((draft, stats))
    }

    /// Seed plus traversal, without creating anything.
    ///
    /// # Errors
    ///
    /// As [`Self::pick_seed`] and [`Self::fill_draft`].
    pub fn explore(&mut self) -> Result<Exploration> {
        let seed = self.pick_seed()?;
        let seed_name = self.catalog.fetch_artist_name(&seed)?;
        let (draft, stats) = self.fill_draft(&seed)?;
        Ok(Exploration {
            seed,
            seed_name,
            tracks: draft.into_tracks(),
            stats,
        })
    }

    /// Full run: seed, name, create the private playlist, traverse, then
    /// hand the draft to the provider whatever its size.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::NoSeedArtist`] without listening history
    /// - [`SelectionError::PlaylistCreation`] if the playlist cannot be created
    /// - [`SelectionError::Provider`] for any other provider failure
    pub fn create_playlist(&mut self, user: &str, today: NaiveDate) -> Result<RunReport> {
        let seed = self.pick_seed()?;
        let name = playlist_name(&self.catalog.fetch_artist_name(&seed)?, today);

        let playlist = self
            .catalog
            .client_mut()
            .create_playlist(user, &name, Visibility::Private, PLAYLIST_DESCRIPTION)
            .map_err(SelectionError::PlaylistCreation)?;
        info!("Created playlist '{name}' ({playlist})");

        let (draft, stats) = self.fill_draft(&seed)?;
        if draft.len() < self.config.target_size {
            warn!(
                "Only {} of {} tracks found for '{name}'",
                draft.len(),
                self.config.target_size
            );
        }

        self.catalog
            .client_mut()
            .add_tracks(user, &playlist, draft.tracks())?;

        Ok(RunReport {
            playlist,
            name,
            seed,
            tracks: draft.into_tracks(),
            stats,
        })
    }
}
