//! Playlists of songs like the artists you have been listening to.
//!
//! Core modules:
//! - [`algorithm`] - Per-album popularity band statistics
//! - [`sampler`] - Uniform random picks with an injected generator
//! - [`catalog`] - Identifiers, the provider port, and the catalog adapter
//! - [`playlist`] - The bounded artist → album → song traversal
//!
//! ### Providers
//!
//! - [`spotify`] - Spotify Web API over blocking HTTP
//! - [`offline`] - JSON catalog snapshots, for dry runs and tests
//!
//! ### Supporting Modules
//!
//! - [`config`] - Settings file and its location
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`error`] - Typed errors for selection and providers
//!
//! ## Quick Start Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use songslike::offline::{CatalogSnapshot, OfflineCatalog};
//! use songslike::playlist::{PlaylistExplorer, SelectionConfig};
//!
//! let snapshot = CatalogSnapshot::builder()
//!     .top_artist("spotify:artist:seed", "Seed")
//!     .artist("spotify:artist:seed", "Seed", &["spotify:artist:near"], &[])
//!     .artist("spotify:artist:near", "Near", &[], &["spotify:album:one"])
//!     .album("spotify:album:one", &[("spotify:track:a", 30), ("spotify:track:b", 90)])
//!     .build();
//!
//! let mut explorer = PlaylistExplorer::new(
//!     OfflineCatalog::new(snapshot),
//!     StdRng::seed_from_u64(1),
//!     SelectionConfig::default(),
//! );
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let report = explorer.create_playlist("me", today)?;
//!
//! assert_eq!(report.name, "songs like Seed, 6.1.2024");
//! assert_eq!(report.tracks.len(), 1);
//! # Ok::<(), songslike::error::SelectionError>(())
//! ```
//!
//! ## How songs are picked
//!
//! 1. A seed artist is drawn from the listener's short-term top artists.
//! 2. Each pass draws one related artist of the seed, then makes two picks
//!    from it: a random album, then a random track whose popularity lies in
//!    `[max(0, floor(mean - 2·stdev)), max_popularity]` for that album.
//! 3. New tracks are appended; repeats and empty picks are skipped.
//! 4. Every pass counts as two songs whether or not it found any, so a run
//!    makes at most `target_size / 2` passes (rounded up).
//!
//! ## Error Handling
//!
//! Library operations return [`error::SelectionError`]; the binary wraps
//! them in `anyhow` with context.

pub mod algorithm;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod offline;
pub mod playlist;
pub mod sampler;
pub mod spotify;
