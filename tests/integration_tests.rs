//! # Integration Tests for songslike
//!
//! Exercises the public API the way the binary uses it: snapshots on disk,
//! full runs against the offline catalog, provider failures, settings files
//! and the CLI itself.

use anyhow::Result;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use songslike::algorithm;
use songslike::catalog::{
    AlbumRef, ArtistRef, CatalogClient, PlaylistHandle, TimeRange, TrackRef, Visibility,
};
use songslike::error::{ProviderError, SelectionError};
use songslike::offline::{CatalogSnapshot, OfflineCatalog};
use songslike::playlist::{PlaylistExplorer, SelectionConfig, PLAYLIST_DESCRIPTION};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
}

/// One seed, one related artist, one album: `t1` under the cap, `t2` above.
fn minimal_snapshot() -> CatalogSnapshot {
    CatalogSnapshot::builder()
        .top_artist("spotify:artist:seed", "Seed")
        .artist("spotify:artist:seed", "Seed", &["spotify:artist:rel"], &[])
        .artist("spotify:artist:rel", "Rel", &[], &["spotify:album:one"])
        .album(
            "spotify:album:one",
            &[("spotify:track:t1", 30), ("spotify:track:t2", 90)],
        )
        .build()
}

/// Three related artists with three albums each. Albums `x` and `y` spread
/// popularities from 20 to 90; album `z` is tightly packed around 47 with one
/// `quiet` outlier at 2 that falls below its threshold of 10.
fn wide_snapshot() -> CatalogSnapshot {
    let mut builder = CatalogSnapshot::builder()
        .top_artist("seed:a", "Seed A")
        .top_artist("seed:b", "Seed B")
        .artist("seed:a", "Seed A", &["rel:1", "rel:2", "rel:3"], &[])
        .artist("seed:b", "Seed B", &["rel:1", "rel:2", "rel:3"], &[]);

    for artist in 1..=3 {
        let uri = format!("rel:{artist}");
        let albums = [
            format!("album:{artist}:x"),
            format!("album:{artist}:y"),
            format!("album:{artist}:z"),
        ];
        let album_refs: Vec<&str> = albums.iter().map(String::as_str).collect();
        builder = builder.artist(&uri, &format!("Rel {artist}"), &[], &album_refs);

        for album in &albums {
            let mut tracks: Vec<(String, u32)> = Vec::new();
            if album.ends_with(":z") {
                tracks.push((format!("{album}:track:quiet"), 2));
                tracks.extend((0..8).map(|i| (format!("{album}:track:{i}"), 40 + i * 2)));
            } else {
                tracks.extend((0..8).map(|i| (format!("{album}:track:{i}"), 20 + i * 10)));
            }
            let track_refs: Vec<(&str, u32)> =
                tracks.iter().map(|(uri, pop)| (uri.as_str(), *pop)).collect();
            builder = builder.album(album, &track_refs);
        }
    }
    builder.build()
}

fn explorer(
    snapshot: CatalogSnapshot,
    seed: u64,
    config: SelectionConfig,
) -> PlaylistExplorer<OfflineCatalog, StdRng> {
    PlaylistExplorer::new(
        OfflineCatalog::new(snapshot),
        StdRng::seed_from_u64(seed),
        config,
    )
}

/// Delegates reads to an offline catalog but refuses to create playlists.
struct ReadOnlyCatalog {
    inner: OfflineCatalog,
    add_calls: usize,
}

impl CatalogClient for ReadOnlyCatalog {
    fn top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>, ProviderError> {
        self.inner.top_artists(time_range)
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>, ProviderError> {
        self.inner.related_artists(artist)
    }

    fn artist_albums(&self, artist: &ArtistRef) -> Result<Vec<AlbumRef>, ProviderError> {
        self.inner.artist_albums(artist)
    }

    fn album_track_popularities(
        &self,
        album: &AlbumRef,
    ) -> Result<Vec<(TrackRef, u32)>, ProviderError> {
        self.inner.album_track_popularities(album)
    }

    fn artist_name(&self, artist: &ArtistRef) -> Result<String, ProviderError> {
        self.inner.artist_name(artist)
    }

    fn create_playlist(
        &mut self,
        _user: &str,
        _name: &str,
        _visibility: Visibility,
        _description: &str,
    ) -> Result<PlaylistHandle, ProviderError> {
        Err(ProviderError::Status {
            status: 403,
            body: "insufficient scope".to_string(),
        })
    }

    fn add_tracks(
        &mut self,
        _user: &str,
        _playlist: &PlaylistHandle,
        _tracks: &[TrackRef],
    ) -> Result<(), ProviderError> {
        self.add_calls += 1;
        Ok(())
    }
}

mod run_tests {
    use super::*;

    #[test]
    fn test_band_excludes_tracks_above_cap() -> Result<()> {
        let mut explorer = explorer(minimal_snapshot(), 3, SelectionConfig::default());
        let report = explorer.create_playlist("listener", run_date())?;

        assert_eq!(report.name, "songs like Seed, 2.29.2024");
        assert_eq!(report.tracks, vec![TrackRef::new("spotify:track:t1")]);

        let client = explorer.into_client();
        let playlist = &client.playlists()[0];
        assert_eq!(playlist.visibility, Visibility::Private);
        assert_eq!(playlist.description, PLAYLIST_DESCRIPTION);
        assert_eq!(playlist.tracks, report.tracks);
        Ok(())
    }

    #[test]
    fn test_seed_without_related_artists_still_writes_playlist() -> Result<()> {
        let snapshot = CatalogSnapshot::builder()
            .top_artist("spotify:artist:lonely", "Lonely")
            .build();
        let mut explorer = explorer(snapshot, 9, SelectionConfig::default());
        let report = explorer.create_playlist("listener", run_date())?;

        assert!(report.tracks.is_empty());
        assert_eq!(report.stats.passes, 5);
        assert_eq!(report.stats.absent, 10);

        let client = explorer.into_client();
        assert_eq!(client.playlists().len(), 1);
        assert!(client.playlists()[0].tracks.is_empty());
        Ok(())
    }

    #[test]
    fn test_no_history_creates_nothing() {
        let mut explorer = explorer(CatalogSnapshot::default(), 1, SelectionConfig::default());
        let err = explorer.create_playlist("listener", run_date()).unwrap_err();

        assert!(matches!(err, SelectionError::NoSeedArtist));
        assert!(explorer.into_client().playlists().is_empty());
    }

    #[test]
    fn test_refused_creation_stops_before_adding() {
        let client = ReadOnlyCatalog {
            inner: OfflineCatalog::new(minimal_snapshot()),
            add_calls: 0,
        };
        let mut explorer =
            PlaylistExplorer::new(client, StdRng::seed_from_u64(5), SelectionConfig::default());

        let err = explorer.create_playlist("listener", run_date()).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::PlaylistCreation(ProviderError::Status { status: 403, .. })
        ));
        assert_eq!(explorer.into_client().add_calls, 0);
    }

    #[test]
    fn test_runs_respect_size_and_pass_limits() -> Result<()> {
        for seed in 0..20 {
            for target_size in [1, 4, 7, 10] {
                let config = SelectionConfig {
                    target_size,
                    ..SelectionConfig::default()
                };
                let mut explorer = explorer(wide_snapshot(), seed, config.clone());
                let report = explorer.create_playlist("listener", run_date())?;

                assert!(report.tracks.len() <= target_size);
                assert_eq!(report.stats.passes, config.passes());
                assert_eq!(report.stats.attempts, config.passes() * 2);
                assert_eq!(report.stats.resolved(), report.stats.attempts);

                let unique: HashSet<_> = report.tracks.iter().collect();
                assert_eq!(unique.len(), report.tracks.len(), "duplicate track drafted");
            }
        }
        Ok(())
    }

    #[test]
    fn test_every_drafted_track_is_inside_its_album_band() -> Result<()> {
        let snapshot = wide_snapshot();

        for seed in 0..20 {
            let mut explorer = explorer(snapshot.clone(), seed, SelectionConfig::default());
            let exploration = explorer.explore()?;

            for track in &exploration.tracks {
                let album = snapshot
                    .albums
                    .values()
                    .find(|album| album.tracks.iter().any(|entry| &entry.uri == track))
                    .unwrap();
                let popularities: Vec<u32> =
                    album.tracks.iter().map(|entry| entry.popularity).collect();
                let band = algorithm::popularity_band(&popularities, 60)?;
                let popularity = album
                    .tracks
                    .iter()
                    .find(|entry| &entry.uri == track)
                    .map(|entry| entry.popularity)
                    .unwrap();

                assert!(band.lower <= popularity, "{track} below {band}");
                assert!(popularity <= band.upper, "{track} above {band}");
                assert!(!track.as_str().ends_with(":quiet"), "{track} is below its threshold");
            }
        }
        Ok(())
    }

    #[test]
    fn test_same_seed_replays_same_playlist() -> Result<()> {
        let first = explorer(wide_snapshot(), 1234, SelectionConfig::default()).explore()?;
        let second = explorer(wide_snapshot(), 1234, SelectionConfig::default()).explore()?;

        assert_eq!(first.seed, second.seed);
        assert_eq!(first.tracks, second.tracks);
        assert_eq!(first.stats, second.stats);
        Ok(())
    }
}

mod snapshot_tests {
    use super::*;

    #[test]
    fn test_run_from_snapshot_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, serde_json::to_string_pretty(&minimal_snapshot())?)?;

        let catalog = OfflineCatalog::from_path(&path)?;
        let mut explorer =
            PlaylistExplorer::new(catalog, StdRng::seed_from_u64(2), SelectionConfig::default());
        let exploration = explorer.explore()?;

        assert_eq!(exploration.seed, ArtistRef::new("spotify:artist:seed"));
        assert_eq!(exploration.seed_name, "Seed");
        assert_eq!(exploration.tracks, vec![TrackRef::new("spotify:track:t1")]);
        Ok(())
    }

    #[test]
    fn test_malformed_snapshot_is_decode_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"top_artists\": 7 }")?;

        let err = OfflineCatalog::from_path(&path).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        Ok(())
    }
}

mod configuration_tests {
    use super::*;
    use songslike::config::Settings;

    #[test]
    fn test_settings_drive_selection() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        let settings = Settings {
            user_id: Some("listener".to_string()),
            max_popularity: 35,
            target_size: 4,
            time_range: TimeRange::LongTerm,
            ..Settings::default()
        };
        settings.save_to(&path)?;

        let loaded = Settings::load_from(&path)?;
        let selection = loaded.selection();
        assert_eq!(selection.max_popularity, 35);
        assert_eq!(selection.target_size, 4);
        assert_eq!(selection.passes(), 2);
        assert_eq!(selection.time_range, TimeRange::LongTerm);
        Ok(())
    }
}

mod cli_tests {
    use super::*;

    fn songslike() -> Command {
        Command::new(env!("CARGO_BIN_EXE_songslike"))
    }

    fn write_snapshot(dir: &TempDir) -> Result<PathBuf> {
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, serde_json::to_string(&minimal_snapshot())?)?;
        Ok(path)
    }

    #[test]
    fn test_cli_help_displays_correctly() -> Result<()> {
        let output = songslike().arg("--help").output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success());
        assert!(stdout.contains("songslike"));
        assert!(stdout.contains("create"));
        assert!(stdout.contains("top-artists"));
        Ok(())
    }

    #[test]
    fn test_dry_run_against_snapshot() -> Result<()> {
        let dir = TempDir::new()?;
        let snapshot = write_snapshot(&dir)?;
        let output = songslike()
            .args(["--config", &dir.path().join("config.json").to_string_lossy()])
            .args(["create", "--catalog", &snapshot.to_string_lossy()])
            .args(["--dry-run", "--seed", "7"])
            .output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout.contains("Songs like Seed"));
        assert!(stdout.contains("spotify:track:t1"));
        assert!(!stdout.contains("spotify:track:t2"));
        Ok(())
    }

    #[test]
    fn test_band_lists_album_tracks() -> Result<()> {
        let dir = TempDir::new()?;
        let snapshot = write_snapshot(&dir)?;
        let output = songslike()
            .args(["--config", &dir.path().join("config.json").to_string_lossy()])
            .args(["band", "spotify:album:one", "--catalog", &snapshot.to_string_lossy()])
            .output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout.contains("Band: [0, 60]"));
        assert!(stdout.contains("spotify:track:t2"));
        Ok(())
    }

    #[test]
    fn test_config_init_then_show() -> Result<()> {
        let dir = TempDir::new()?;
        let config = dir.path().join("config.json");
        let config_arg = config.to_string_lossy().to_string();

        let init = songslike()
            .args(["--config", &config_arg, "config", "init", "--user", "listener"])
            .output()?;
        assert!(init.status.success());
        assert!(config.exists());

        let again = songslike()
            .args(["--config", &config_arg, "config", "init"])
            .output()?;
        assert!(!again.status.success());

        let show = songslike().args(["--config", &config_arg, "config", "show"]).output()?;
        let stdout = String::from_utf8_lossy(&show.stdout);
        assert!(stdout.contains("\"user_id\": \"listener\""));
        assert!(stdout.contains("\"max_popularity\": 60"));
        Ok(())
    }

    #[test]
    fn test_invalid_settings_can_be_replaced() -> Result<()> {
        let dir = TempDir::new()?;
        let config = dir.path().join("config.json");
        let config_arg = config.to_string_lossy().to_string();
        std::fs::write(&config, r#"{ "max_popularity": 150 }"#)?;

        let show = songslike().args(["--config", &config_arg, "config", "show"]).output()?;
        assert!(!show.status.success());

        let completion = songslike()
            .args(["--config", &config_arg, "completion", "bash"])
            .output()?;
        assert!(completion.status.success());

        let init = songslike()
            .args(["--config", &config_arg, "config", "init", "--force"])
            .output()?;
        assert!(init.status.success(), "{}", String::from_utf8_lossy(&init.stderr));

        let show = songslike().args(["--config", &config_arg, "config", "show"]).output()?;
        assert!(show.status.success());
        assert!(String::from_utf8_lossy(&show.stdout).contains("\"max_popularity\": 60"));
        Ok(())
    }

    #[test]
    fn test_completion_generation() -> Result<()> {
        let output = songslike().args(["completion", "bash"]).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success());
        assert!(stdout.contains("_songslike"));
        Ok(())
    }
}
