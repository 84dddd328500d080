//! # Spotify Web API Provider
//!
//! Blocking HTTP implementation of [`CatalogClient`] against the Spotify Web
//! API. Authentication is out of scope: the client is handed a ready bearer
//! token (normally from `SPOTIFY_ACCESS_TOKEN`).
//!
//! Identifiers stay opaque everywhere else in the crate. This module is the
//! only place that knows `spotify:<kind>:<id>` URIs and open.spotify.com links
//! map to the bare ids the REST paths want.
//!
//! Requests are never retried here; a failed call surfaces as a
//! [`ProviderError`] and ends the run.

use crate::catalog::{
    AlbumRef, ArtistRef, CatalogClient, PlaylistHandle, TimeRange, TrackRef, Visibility,
};
use crate::error::ProviderError;
use log::{debug, info, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

const REQUEST_TIMEOUT_SECONDS: u64 = 15;
const MAX_TRACK_IDS_PER_REQUEST: usize = 50;
const MAX_URIS_PER_ADD: usize = 100;
const ALBUM_TRACKS_PAGE: &str = "50";

mod models {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Page<T> {
        pub items: Vec<T>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ArtistObject {
        pub uri: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct RelatedArtists {
        #[serde(default)]
        pub artists: Vec<ArtistObject>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AlbumObject {
        pub uri: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct SimplifiedTrack {
        pub id: Option<String>,
        pub uri: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct FullTrack {
        pub id: Option<String>,
        #[serde(default)]
        pub popularity: u32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Tracks {
        pub tracks: Vec<Option<FullTrack>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PlaylistObject {
        pub uri: String,
    }
}

#[derive(Debug, Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    public: bool,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct AddTracksBody<'a> {
    uris: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[allow(dead_code)]
    snapshot_id: Option<String>,
}

/// Returns the bare id from a `spotify:<kind>:<id>` URI, an
/// `open.spotify.com/<kind>/<id>` link, or an id that is already bare.
#[must_use]
pub fn bare_id(reference: &str) -> &str {
    let trimmed = reference.trim();

    if let Some((_, rest)) = trimmed.split_once("open.spotify.com/") {
        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        return path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(path);
    }

    trimmed.rsplit(':').next().unwrap_or(trimmed)
}

/// Turns any reference form into a `spotify:<kind>:<id>` URI.
#[must_use]
pub fn to_uri(kind: &str, reference: &str) -> String {
    format!("spotify:{kind}:{}", bare_id(reference))
}

/// Spotify Web API client.
pub struct SpotifyClient {
    http: Client,
    api_base: String,
    token: String,
    market: Option<String>,
}

impl SpotifyClient {
    /// # Errors
    ///
    /// [`ProviderError::MissingToken`] for an empty token, or
    /// [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProviderError::MissingToken);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .user_agent(concat!("songslike/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            market: None,
        })
    }

    /// Builds a client from the token in `SPOTIFY_ACCESS_TOKEN`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::MissingToken`] if the variable is unset or empty.
    pub fn from_env(api_base: impl Into<String>) -> Result<Self, ProviderError> {
        let token = std::env::var(ACCESS_TOKEN_ENV).map_err(|_| ProviderError::MissingToken)?;
        Self::new(token, api_base)
    }

    /// Restricts album and track lookups to one market (ISO 3166-1 alpha-2).
    /// Listener, artist and playlist endpoints are never market-scoped.
    #[must_use]
    pub fn with_market(mut self, market: Option<String>) -> Self {
        self.market = market;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Base URL extended by `segments`, each percent-encoded as one path
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let base = &self.api_base;
        let mut url = Url::parse(base)
            .map_err(|e| ProviderError::Http(format!("invalid API base {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::Http(format!("API base {base} cannot take a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ProviderError> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("{what} failed with {status}: {body}");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>()?)
    }

    fn get_request(&self, path: &str, params: &[(&str, &str)], in_market: bool) -> RequestBuilder {
        debug!("GET {path} {params:?}");
        let mut request = self.http.get(self.url(path)).query(params);
        if let (true, Some(market)) = (in_market, &self.market) {
            request = request.query(&[("market", market.as_str())]);
        }
        request
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        self.execute(self.get_request(path, params, false), path)
    }

    /// GET restricted to the configured market, if any.
    fn get_in_market<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        self.execute(self.get_request(path, params, true), path)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ProviderError> {
        debug!("POST {url}");
        let what = url.path().to_string();
        self.execute(self.http.post(url).json(body), &what)
    }

    fn popularities(&self, ids: &[String]) -> Result<Vec<models::FullTrack>, ProviderError> {
        let mut tracks = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_TRACK_IDS_PER_REQUEST) {
            let joined = chunk.join(",");
            let page: models::Tracks = self.get_in_market("/tracks", &[("ids", joined.as_str())])?;
            tracks.extend(page.tracks.into_iter().flatten());
        }
        Ok(tracks)
    }
}

/// Pairs album tracks with looked-up popularities by id, keeping album order.
/// Tracks the lookup did not return are dropped.
fn join_popularities(
    album_tracks: Vec<models::SimplifiedTrack>,
    looked_up: &[models::FullTrack],
) -> Vec<(TrackRef, u32)> {
    album_tracks
        .into_iter()
        .filter_map(|track| {
            let id = track.id?;
            let popularity = looked_up
                .iter()
                .find(|full| full.id.as_deref() == Some(id.as_str()))?
                .popularity;
            Some((TrackRef::new(track.uri), popularity))
        })
        .collect()
}

impl CatalogClient for SpotifyClient {
    fn top_artists(&self, time_range: TimeRange) -> Result<Vec<ArtistRef>, ProviderError> {
        let page: models::Page<models::ArtistObject> =
            self.get("/me/top/artists", &[("time_range", time_range.as_str())])?;
        Ok(page.items.into_iter().map(|a| ArtistRef::new(a.uri)).collect())
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>, ProviderError> {
        let path = format!("/artists/{}/related-artists", bare_id(artist.as_str()));
        match self.get::<models::RelatedArtists>(&path, &[]) {
            Ok(related) => Ok(related.artists.into_iter().map(|a| ArtistRef::new(a.uri)).collect()),
            Err(ProviderError::Status { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                warn!("No related-artist data for {artist}");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn artist_albums(&self, artist: &ArtistRef) -> Result<Vec<AlbumRef>, ProviderError> {
        let path = format!("/artists/{}/albums", bare_id(artist.as_str()));
        let page: models::Page<models::AlbumObject> = self.get_in_market(&path, &[])?;
        Ok(page.items.into_iter().map(|a| AlbumRef::new(a.uri)).collect())
    }

    fn album_track_popularities(
        &self,
        album: &AlbumRef,
    ) -> Result<Vec<(TrackRef, u32)>, ProviderError> {
        let path = format!("/albums/{}/tracks", bare_id(album.as_str()));
        let page: models::Page<models::SimplifiedTrack> =
            self.get_in_market(&path, &[("limit", ALBUM_TRACKS_PAGE)])?;

        let ids: Vec<String> = page.items.iter().filter_map(|t| t.id.clone()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let looked_up = self.popularities(&ids)?;
        Ok(join_popularities(page.items, &looked_up))
    }

    fn artist_name(&self, artist: &ArtistRef) -> Result<String, ProviderError> {
        let path = format!("/artists/{}", bare_id(artist.as_str()));
        let found: models::ArtistObject = self.get(&path, &[])?;
        Ok(found.name)
    }

    fn create_playlist(
        &mut self,
        user: &str,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<PlaylistHandle, ProviderError> {
        let url = self.endpoint(&["users", user, "playlists"])?;
        let body = CreatePlaylistBody {
            name,
            public: visibility.is_public(),
            description,
        };
        let created: models::PlaylistObject = self.post(url, &body)?;
        info!("Created Spotify playlist {} '{name}'", created.uri);
        Ok(PlaylistHandle::new(created.uri))
    }

    fn add_tracks(
        &mut self,
        _user: &str,
        playlist: &PlaylistHandle,
        tracks: &[TrackRef],
    ) -> Result<(), ProviderError> {
        if tracks.is_empty() {
            info!("Nothing to add to {playlist}");
            return Ok(());
        }

        let url = self.endpoint(&["playlists", bare_id(playlist.as_str()), "tracks"])?;
        let uris: Vec<String> = tracks.iter().map(|t| to_uri("track", t.as_str())).collect();
        for chunk in uris.chunks(MAX_URIS_PER_ADD) {
            let _: Snapshot = self.post(url.clone(), &AddTracksBody { uris: chunk })?;
        }
        info!("Added {} tracks to {playlist}", tracks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id_from_all_reference_forms() {
        assert_eq!(bare_id("spotify:artist:0OdUWJ0sBjDrqHygGUXeCF"), "0OdUWJ0sBjDrqHygGUXeCF");
        assert_eq!(
            bare_id("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=abc"),
            "4aawyAB9vmqN3uQ7FjRGTy"
        );
        assert_eq!(bare_id("  6rqhFgbbKwnb9MLmUQDhG6 "), "6rqhFgbbKwnb9MLmUQDhG6");
    }

    #[test]
    fn test_bare_id_from_localized_links() {
        assert_eq!(
            bare_id("https://open.spotify.com/intl-de/album/4aawyAB9vmqN3uQ7FjRGTy?si=abc"),
            "4aawyAB9vmqN3uQ7FjRGTy"
        );
        assert_eq!(
            bare_id("https://open.spotify.com/artist/0OdUWJ0sBjDrqHygGUXeCF/"),
            "0OdUWJ0sBjDrqHygGUXeCF"
        );
    }

    #[test]
    fn test_market_only_on_catalog_lookups() {
        let client = SpotifyClient::new("token", "http://localhost:9/v1")
            .unwrap()
            .with_market(Some("SE".to_string()));

        let scoped = client.get_request("/albums/x/tracks", &[], true).build().unwrap();
        assert_eq!(scoped.url().query(), Some("market=SE"));

        let unscoped = client
            .get_request("/me/top/artists", &[("time_range", "short_term")], false)
            .build()
            .unwrap();
        assert_eq!(unscoped.url().query(), Some("time_range=short_term"));
    }

    #[test]
    fn test_user_id_is_encoded_as_one_segment() {
        let client = SpotifyClient::new("token", "http://localhost:9/v1/").unwrap();
        let url = client.endpoint(&["users", "dj set/2 ?x", "playlists"]).unwrap();
        assert_eq!(url.path(), "/v1/users/dj%20set%2F2%20%3Fx/playlists");
    }

    #[test]
    fn test_to_uri_normalizes() {
        assert_eq!(to_uri("track", "abc"), "spotify:track:abc");
        assert_eq!(to_uri("track", "spotify:track:abc"), "spotify:track:abc");
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(matches!(
            SpotifyClient::new("  ", DEFAULT_API_BASE),
            Err(ProviderError::MissingToken)
        ));
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = SpotifyClient::new("token", "http://localhost:9/v1/").unwrap();
        assert_eq!(client.url("/me/top/artists"), "http://localhost:9/v1/me/top/artists");
    }

    #[test]
    fn test_top_artists_page_decodes() {
        let json = r#"{"items":[{"uri":"spotify:artist:a","name":"A","id":"a"},
                                {"uri":"spotify:artist:b","name":"B","id":"b"}],
                       "total":2,"limit":20}"#;
        let page: models::Page<models::ArtistObject> = serde_json::from_str(json).unwrap();
        let names: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_popularities_joined_in_album_order() {
        let album: models::Page<models::SimplifiedTrack> = serde_json::from_str(
            r#"{"items":[{"id":"1","uri":"spotify:track:1"},
                         {"id":"2","uri":"spotify:track:2"},
                         {"id":null,"uri":"spotify:local:x"},
                         {"id":"3","uri":"spotify:track:3"}]}"#,
        )
        .unwrap();
        let looked_up: models::Tracks = serde_json::from_str(
            r#"{"tracks":[{"id":"3","popularity":70},null,{"id":"1","popularity":12}]}"#,
        )
        .unwrap();
        let full: Vec<_> = looked_up.tracks.into_iter().flatten().collect();

        let joined = join_popularities(album.items, &full);
        assert_eq!(
            joined,
            vec![
                (TrackRef::new("spotify:track:1"), 12),
                (TrackRef::new("spotify:track:3"), 70),
            ]
        );
    }

    #[test]
    fn test_create_playlist_body_shape() {
        let body = CreatePlaylistBody {
            name: "songs like X, 1.2.2024",
            public: Visibility::Private.is_public(),
            description: "auto-created",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["public"], serde_json::Value::Bool(false));
        assert_eq!(value["description"], "auto-created");
    }
}
