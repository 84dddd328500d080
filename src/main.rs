//! # songslike
//!
//! Builds a private playlist of songs like one of the artists you have been
//! listening to lately.
//!
//! ## Usage
//!
//! ```bash
//! # One-time: remember who owns the playlists
//! songslike config init --user my_user_id
//!
//! # Build a playlist from your short-term top artists
//! SPOTIFY_ACCESS_TOKEN=... songslike create
//!
//! # Try the traversal against a local snapshot
//! songslike create --catalog snapshot.json --dry-run --verbose
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use songslike::algorithm::statistics;
use songslike::catalog::{AlbumRef, Catalog, CatalogClient};
use songslike::cli::{self, ConfigAction, SourceArgs};
use songslike::completion;
use songslike::config::{self, Settings};
use songslike::offline::OfflineCatalog;
use songslike::playlist::{PlaylistExplorer, SelectionConfig, TraversalStats};
use songslike::spotify::SpotifyClient;
use std::path::Path;

/// Builds the catalog client the command should talk to.
fn open_catalog(source: &SourceArgs, settings: &Settings) -> Result<Box<dyn CatalogClient>> {
    if let Some(path) = &source.catalog {
        info!("Using offline catalog snapshot {}", path.display());
        let offline = OfflineCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog snapshot {}", path.display()))?;
        return Ok(Box::new(offline));
    }

    let token = source
        .token
        .clone()
        .context("No access token. Set SPOTIFY_ACCESS_TOKEN or pass --token")?;
    let market = source.market.clone().or_else(|| settings.market.clone());
    let client = SpotifyClient::new(token, settings.api_base.clone())
        .context("Failed to set up Spotify client")?
        .with_market(market);
    Ok(Box::new(client))
}

fn print_stats(stats: &TraversalStats) {
    println!(
        "Passes: {}  attempts: {}  added: {}  nothing found: {}  repeats: {}  over target: {}",
        stats.passes,
        stats.attempts,
        stats.accepted,
        stats.absent,
        stats.duplicates,
        stats.overflow
    );
}

fn run_create(
    settings: &Settings,
    source: &SourceArgs,
    user: Option<String>,
    selection: SelectionConfig,
    dry_run: bool,
    seed: Option<u64>,
    verbose: bool,
) -> Result<()> {
    let client = open_catalog(source, settings)?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut explorer = PlaylistExplorer::new(client, rng, selection);

    if dry_run {
        let exploration = explorer.explore().context("Failed to explore the catalog")?;
        println!("Songs like {} ({})", exploration.seed_name, exploration.seed);
        for (i, track) in exploration.tracks.iter().enumerate() {
            println!("  {}. {track}", i + 1);
        }
        if verbose {
            print_stats(&exploration.stats);
        }
        return Ok(());
    }

    let user = user
        .or_else(|| settings.user_id.clone())
        .or_else(|| source.catalog.as_ref().map(|_| "offline".to_string()))
        .context("No user id. Pass --user or run `songslike config init --user <id>`")?;

    let today = chrono::Local::now().date_naive();
    let report = explorer
        .create_playlist(&user, today)
        .context("Failed to create playlist")?;

    println!(
        "Created '{}' with {} songs ({})",
        report.name,
        report.tracks.len(),
        report.playlist
    );
    if verbose {
        for (i, track) in report.tracks.iter().enumerate() {
            println!("  {}. {track}", i + 1);
        }
        print_stats(&report.stats);
    }
    Ok(())
}

fn run_top_artists(
    settings: &Settings,
    source: &SourceArgs,
    selection: &SelectionConfig,
) -> Result<()> {
    let catalog = Catalog::new(open_catalog(source, settings)?);
    let artists = catalog
        .fetch_top_artists(selection.time_range)
        .context("Failed to fetch top artists")?;

    if artists.is_empty() {
        println!("No top artists for {}", selection.time_range);
        return Ok(());
    }
    for (i, artist) in artists.iter().enumerate() {
        let name = catalog
            .fetch_artist_name(artist)
            .with_context(|| format!("Failed to look up {artist}"))?;
        println!("  {}. {name} ({artist})", i + 1);
    }
    Ok(())
}

fn run_band(
    settings: &Settings,
    source: &SourceArgs,
    album: &str,
    max_popularity: u32,
) -> Result<()> {
    let catalog = Catalog::new(open_catalog(source, settings)?);
    let album = AlbumRef::new(album.trim());

    let Some(band) = catalog
        .popularity_band(&album, max_popularity)
        .with_context(|| format!("Failed to read album {album}"))?
    else {
        println!("{album} has no tracks");
        return Ok(());
    };

    if let Some(summary) = statistics::analyze(&band.popularities()) {
        println!(
            "{} tracks, popularity mean {:.2}, stdev {:.2}, range {}-{}",
            summary.count, summary.mean, summary.std_deviation, summary.min, summary.max
        );
    }
    println!("Band: {}", band.band);
    for (track, popularity) in &band.tracks {
        let marker = if band.band.contains(*popularity) { "+" } else { " " };
        println!("  {marker} {popularity:>3}  {track}");
    }
    Ok(())
}

fn show_config(path: &Path, settings: &Settings) -> Result<()> {
    let origin = if path.exists() { "file" } else { "defaults" };
    println!("# {} ({origin})", path.display());
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

/// Writes a fresh settings file. The existing file is never parsed, so
/// `--force` also replaces a broken one.
fn init_config(path: &Path, user: Option<String>, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let fresh = Settings {
        user_id: user,
        ..Settings::default()
    };
    fresh.save_to(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Main entry point.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug songslike create` - every traversal decision
/// - `RUST_LOG=songslike::spotify=debug songslike create` - just the HTTP calls
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };
    let load_settings = || -> Result<Settings> {
        let settings = Settings::load_from(&config_path)?;
        debug!("Effective settings: {settings:?}");
        Ok(settings)
    };

    match args.command {
        cli::Command::Create {
            source,
            user,
            max_popularity,
            target_size,
            time_range,
            dry_run,
            seed,
            verbose,
        } => {
            let settings = load_settings()?;
            let defaults = settings.selection();
            let selection = SelectionConfig {
                max_popularity: max_popularity.unwrap_or(defaults.max_popularity),
                target_size: target_size
                    .map(usize::try_from)
                    .transpose()
                    .context("target size too large")?
                    .unwrap_or(defaults.target_size),
                time_range: time_range.unwrap_or(defaults.time_range),
            };
            run_create(&settings, &source, user, selection, dry_run, seed, verbose)?;
        }
        cli::Command::TopArtists { source, time_range } => {
            let settings = load_settings()?;
            let mut selection = settings.selection();
            if let Some(time_range) = time_range {
                selection.time_range = time_range;
            }
            run_top_artists(&settings, &source, &selection)?;
        }
        cli::Command::Band {
            source,
            album,
            max_popularity,
        } => {
            let settings = load_settings()?;
            let max_popularity = max_popularity.unwrap_or(settings.max_popularity);
            run_band(&settings, &source, &album, max_popularity)?;
        }
        cli::Command::Config { action } => match action {
            ConfigAction::Show => show_config(&config_path, &load_settings()?)?,
            ConfigAction::Init { user, force } => init_config(&config_path, user, force)?,
        },
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
