// Song list rendering and playback

use tokio::process::Command;
use tracing::info;
use url::Url;

use crate::drive::FileSource;
use crate::error::{Error, Result};
use crate::library::Song;

/// `title - artist - album`
pub fn render_song_line(song: &Song) -> String {
    format!("{} - {} - {}", song.title, song.artist, song.album)
}

/// Numbered, playable list of the library
pub fn render_songs(songs: &[Song]) -> String {
    if songs.is_empty() {
        return "No songs yet - run `drivetunes index` to scan your Drive.\n".to_string();
    }

    let width = songs.len().to_string().len();
    songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            format!(
                "{:>width$}. {}  [play: {}]\n",
                i + 1,
                render_song_line(song),
                song.id,
                width = width
            )
        })
        .collect()
}

/// Pick a song by id, or by its 1-based position in `render_songs` output
pub fn select_song<'a>(songs: &'a [Song], selector: &str) -> Result<&'a Song> {
    if let Some(song) = songs.iter().find(|s| s.id == selector) {
        return Ok(song);
    }
    selector
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| songs.get(i))
        .ok_or_else(|| Error::SongNotFound(selector.to_string()))
}

/// Append the access token so a plain HTTP client can stream the file
pub fn authorized_url(download_url: &str, access_token: &str) -> Result<String> {
    let mut url = Url::parse(download_url)?;
    url.query_pairs_mut().append_pair("access_token", access_token);
    Ok(url.into())
}

/// Look the file up again for a fresh download URL and authorize it
pub async fn resolve_stream_url<S: FileSource + ?Sized>(source: &S, song: &Song) -> Result<String> {
    let file = source.get_file(song.id.clone()).await?;
    let download_url = file
        .download_url
        .ok_or_else(|| Error::SongNotFound(format!("{} has no download URL", song.id)))?;
    authorized_url(&download_url, source.access_token())
}

/// Play a song with the configured player command, or print its stream URL
pub async fn play<S: FileSource + ?Sized>(
    source: &S,
    song: &Song,
    player_command: Option<&str>,
) -> Result<()> {
    let url = resolve_stream_url(source, song).await?;

    let Some(command) = player_command else {
        println!("{}", render_song_line(song));
        println!("{}", url);
        return Ok(());
    };

    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| Error::Config("empty player command".to_string()))?;

    info!("Playing {} with {}", render_song_line(song), program);
    let status = Command::new(program).args(parts).arg(&url).status().await?;
    if !status.success() {
        return Err(Error::Config(format!("player exited with {}", status)));
    }
    Ok(())
}
