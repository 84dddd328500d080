//! # Command-Line Interface Module
//!
//! Clap definitions for the `songslike` binary.
//!
//! ## Commands
//!
//! - `create`: build a playlist of songs like one of your top artists
//! - `top-artists`: list the artists a run can be seeded from
//! - `band`: show an album's popularity band and qualifying tracks
//! - `config`: show or initialize the settings file
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! SPOTIFY_ACCESS_TOKEN=... songslike create --user my_user_id
//! songslike create --catalog snapshot.json --dry-run --verbose
//! songslike band spotify:album:4aawyAB9vmqN3uQ7FjRGTy --max-popularity 50
//! ```

use crate::catalog::TimeRange;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "songslike")]
#[command(about = "songslike: playlists of songs like the artists you have been listening to")]
#[command(version)]
pub struct Args {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, env = "SONGSLIKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Where catalog data comes from.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read the catalog from a JSON snapshot instead of the Web API
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Bearer token for the Web API
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Restrict catalog lookups to one market (e.g. "SE")
    #[arg(long)]
    pub market: Option<String>,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a playlist of songs like one of your top artists
    ///
    /// Picks a random recent top artist, then repeatedly walks to a random
    /// related artist, one of their albums, and a song whose popularity is
    /// within that album's band. The playlist is private and named
    /// "songs like <artist>, <month>.<day>.<year>".
    Create {
        #[command(flatten)]
        source: SourceArgs,

        /// User id that will own the playlist
        #[arg(long, env = "SONGSLIKE_USER")]
        user: Option<String>,

        /// Highest track popularity (0-100) allowed in the playlist
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        max_popularity: Option<u32>,

        /// Maximum number of songs in the playlist
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        target_size: Option<u64>,

        /// Listening-history window used to pick the seed artist
        #[arg(long, value_enum)]
        time_range: Option<TimeRange>,

        /// Print the picked songs without creating a playlist
        #[arg(long)]
        dry_run: bool,

        /// Seed the random generator for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Show traversal statistics and every picked song
        #[arg(short, long)]
        verbose: bool,
    },

    /// List your top artists (the candidates for a seed)
    TopArtists {
        #[command(flatten)]
        source: SourceArgs,

        /// Listening-history window
        #[arg(long, value_enum)]
        time_range: Option<TimeRange>,
    },

    /// Show an album's popularity band and which tracks fall inside it
    Band {
        #[command(flatten)]
        source: SourceArgs,

        /// Album URI, id, or open.spotify.com link
        album: String,

        /// Upper bound of the band
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        max_popularity: Option<u32>,
    },

    /// Show or initialize the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    ///
    /// Usage: songslike completion bash > ~/.local/share/bash-completion/completions/songslike
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Settings file actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings and where they come from
    Show,

    /// Write a settings file with defaults (and an optional user id)
    Init {
        /// User id that will own created playlists
        #[arg(long)]
        user: Option<String>,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_create_flags_parse() {
        let args = Args::try_parse_from([
            "songslike",
            "create",
            "--catalog",
            "snap.json",
            "--max-popularity",
            "45",
            "--target-size",
            "6",
            "--time-range",
            "medium-term",
            "--dry-run",
            "--seed",
            "7",
        ])
        .unwrap();

        match args.command {
            Command::Create {
                source,
                max_popularity,
                target_size,
                time_range,
                dry_run,
                seed,
                ..
            } => {
                assert_eq!(source.catalog, Some(PathBuf::from("snap.json")));
                assert_eq!(max_popularity, Some(45));
                assert_eq!(target_size, Some(6));
                assert_eq!(time_range, Some(TimeRange::MediumTerm));
                assert!(dry_run);
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_popularity_above_100_rejected() {
        let result =
            Args::try_parse_from(["songslike", "band", "album", "--max-popularity", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_target_size_rejected() {
        let result = Args::try_parse_from(["songslike", "create", "--target-size", "0"]);
        assert!(result.is_err());
    }
}
