// DriveTunes - index and play the music stored in Google Drive
// OAuth 2.0 + PKCE sign-in, paginated Drive listing, one-at-a-time tag worker,
// SQLite song library

use std::sync::Arc;
use tracing::info;

pub mod auth;
pub mod drive;
pub mod error;
pub mod indexer;
pub mod library;
pub mod player;
pub mod tagger;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

use auth::StoredAuth;
use drive::DriveClient;
use indexer::{IndexSummary, Indexer};
use library::{Song, SongStore};
use tagger::{DriveTagger, TagWorker};
use utils::AppSettings;

/// Interactive sign-in. `show_url` is given the consent page to open.
pub async fn login(settings: &AppSettings, show_url: impl FnOnce(&str)) -> Result<StoredAuth> {
    let (client_id, client_secret) = settings.require_client()?;
    let start = auth::start_google_login(client_id)?;
    show_url(&start.auth_url);

    let code = auth::wait_for_oauth_callback().await?;
    auth::exchange_oauth_code(&code, client_id, client_secret).await
}

/// Credentials without user interaction, or `NotAuthorized`
pub async fn authorize(settings: &AppSettings) -> Result<StoredAuth> {
    let (client_id, client_secret) = settings.require_client()?;
    auth::authorize_immediate(client_id, client_secret)
        .await
        .ok_or(Error::NotAuthorized)
}

pub fn open_library(settings: &AppSettings) -> Result<SongStore> {
    SongStore::open(&settings.database_path())
}

/// Scan Drive and tag every new MP3 into the local library
pub async fn index_library(settings: &AppSettings) -> Result<IndexSummary> {
    let auth = authorize(settings).await?;
    info!("Authorized, listing Drive files");

    let source = Arc::new(DriveClient::production(&auth.access_token, &settings.query)?);
    let store = open_library(settings)?;
    let token = auth.access_token.clone();
    let worker = TagWorker::spawn(move || DriveTagger::new(token))?;

    Indexer::new(source, store, worker).run().await
}

/// Every song in the library, in display order
pub fn list_songs(settings: &AppSettings) -> Result<Vec<Song>> {
    open_library(settings)?.all()
}

/// Drop a song chosen by id or list position, so the next `index` tags it again
pub fn forget_song(settings: &AppSettings, selector: &str) -> Result<Song> {
    let store = open_library(settings)?;
    let songs = store.all()?;
    let song = player::select_song(&songs, selector)?.clone();
    store.remove(&song.id)?;
    info!("Forgot song: {} ({})", song.title, song.id);
    Ok(song)
}

/// Empty the library; returns how many songs were removed
pub fn reset_library(settings: &AppSettings) -> Result<usize> {
    let removed = open_library(settings)?.clear()?;
    info!("Library reset, {} songs removed", removed);
    Ok(removed)
}

/// Play a song chosen by id or list position
pub async fn play_song(settings: &AppSettings, selector: &str) -> Result<()> {
    let songs = list_songs(settings)?;
    let song = player::select_song(&songs, selector)?;

    let auth = authorize(settings).await?;
    let source = DriveClient::production(&auth.access_token, &settings.query)?;
    player::play(&source, song, settings.player_command.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings_with_library(name: &str) -> (AppSettings, PathBuf) {
        let dir = std::env::temp_dir().join(format!("drivetunes-lib-{}-{}", name, std::process::id()));
        let settings = AppSettings {
            database_path: Some(dir.join("songs.db")),
            ..AppSettings::default()
        };
        let store = open_library(&settings).unwrap();
        for (id, title) in [("a", "Alpha"), ("b", "Beta")] {
            store
                .put(&Song {
                    id: id.into(),
                    title: title.into(),
                    artist: String::new(),
                    album: String::new(),
                    url: String::new(),
                    filename: format!("{}.mp3", id),
                })
                .unwrap();
        }
        (settings, dir)
    }

    #[test]
    fn test_forget_song_by_id_and_position() {
        let (settings, dir) = settings_with_library("forget");

        assert_eq!(forget_song(&settings, "b").unwrap().title, "Beta");
        assert_eq!(forget_song(&settings, "1").unwrap().id, "a");
        assert!(matches!(forget_song(&settings, "a"), Err(Error::SongNotFound(_))));
        assert!(list_songs(&settings).unwrap().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_reset_library() {
        let (settings, dir) = settings_with_library("reset");

        assert_eq!(reset_library(&settings).unwrap(), 2);
        assert_eq!(reset_library(&settings).unwrap(), 0);
        assert!(list_songs(&settings).unwrap().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }
}
