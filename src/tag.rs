use std::path::Path;

use id3::frame::Comment;
use id3::{Content, Frame, Tag, TagLike, Version};

use crate::config::ChannelConfig;
use crate::error::TagError;
use crate::feed::Episode;

/// Language written into comment frames
const COMMENT_LANG: &str = "eng";

/// Audio containers the tag library can edit in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Mpeg,
    Aiff,
    Wav,
}

/// Write descriptive tags into a downloaded audio file.
///
/// Title and artist are only filled in when the file does not already
/// carry them; album, genre and comment come from the channel settings
/// when configured. Returns whether anything was written. Callers treat
/// every error as a logged warning.
pub fn tag_file(path: &Path, episode: &Episode, channel: &ChannelConfig) -> Result<bool, TagError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "mp3" => apply_tags(path, episode, channel, Container::Mpeg),
        "aiff" | "aif" => apply_tags(path, episode, channel, Container::Aiff),
        "wav" => apply_tags(path, episode, channel, Container::Wav),
        _ => Err(TagError::UnsupportedFormat { extension }),
    }
}

fn apply_tags(
    path: &Path,
    episode: &Episode,
    channel: &ChannelConfig,
    container: Container,
) -> Result<bool, TagError> {
    let mut tag = read_tag(path, container)?;
    let mut touched = false;

    if is_blank(tag.title()) {
        tag.set_title(episode.title.clone());
        touched = true;
    }

    if is_blank(tag.artist()) {
        let artist = channel
            .get("artist_tag")
            .map(String::from)
            .unwrap_or_else(|| title_case(channel.name()));
        tag.set_artist(artist);
        touched = true;
    }

    if let Some(album) = channel.get("album_tag") {
        tag.set_album(album);
        touched = true;
    }

    if let Some(genre) = channel.get("genre_tag").or_else(|| channel.get("genre")) {
        tag.set_genre(genre);
        touched = true;
    }

    // The comment frame is an ID3 notion; the generic containers skip it
    if container == Container::Mpeg {
        if let Some(comment) = channel.get("comment_tag") {
            tag.add_frame(Frame::with_content(
                "COMM",
                Content::Comment(Comment {
                    lang: COMMENT_LANG.to_string(),
                    description: String::new(),
                    text: comment.to_string(),
                }),
            ));
            touched = true;
        }
    }

    if touched {
        write_tag(path, &tag, container)?;
    }

    Ok(touched)
}

fn read_tag(path: &Path, container: Container) -> Result<Tag, TagError> {
    let result = match container {
        Container::Mpeg => Tag::read_from_path(path),
        Container::Aiff => Tag::read_from_aiff_path(path),
        Container::Wav => Tag::read_from_wav_path(path),
    };

    match result {
        Ok(tag) => Ok(tag),
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Ok(Tag::new()),
        Err(e) => Err(TagError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn write_tag(path: &Path, tag: &Tag, container: Container) -> Result<(), TagError> {
    let result = match container {
        Container::Mpeg => tag.write_to_path(path, Version::Id3v24),
        Container::Aiff => tag.write_to_aiff_path(path, Version::Id3v24),
        Container::Wav => tag.write_to_wav_path(path, Version::Id3v24),
    };

    result.map_err(|e| TagError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Capitalize the first letter of every word, like the channel names in a
/// config file usually want ("morning news" -> "Morning News").
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_alpha = false;

    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(c);
            prev_is_alpha = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn make_channel(name: &str, settings: &[(&str, &str)]) -> ChannelConfig {
        let settings: HashMap<String, String> = settings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ChannelConfig::new(name, "http://x/feed.xml", settings)
    }

    fn make_episode(title: &str) -> Episode {
        Episode {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn junk_mp3(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("episode.mp3");
        std::fs::write(&path, b"not really mpeg audio").unwrap();
        path
    }

    #[test]
    fn fills_title_and_default_artist() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());
        let channel = make_channel("morning news", &[]);

        let touched = tag_file(&path, &make_episode("Episode 1"), &channel).unwrap();
        assert!(touched);

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Episode 1"));
        assert_eq!(tag.artist(), Some("Morning News"));
    }

    #[test]
    fn configured_artist_tag_wins_over_channel_name() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());
        let channel = make_channel("showA", &[("artist_tag", "The Hosts")]);

        tag_file(&path, &make_episode("Episode 1"), &channel).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.artist(), Some("The Hosts"));
    }

    #[test]
    fn existing_title_and_artist_are_never_overwritten() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());

        let mut existing = Tag::new();
        existing.set_title("Original Title");
        existing.set_artist("Original Artist");
        existing.write_to_path(&path, Version::Id3v24).unwrap();

        let channel = make_channel("showA", &[("artist_tag", "Replacement")]);
        tag_file(&path, &make_episode("New Title"), &channel).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Original Title"));
        assert_eq!(tag.artist(), Some("Original Artist"));
    }

    #[test]
    fn album_genre_and_comment_come_from_settings() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());
        let channel = make_channel(
            "showA",
            &[
                ("album_tag", "Season 2"),
                ("genre_tag", "News"),
                ("comment_tag", "Fetched by podspool"),
            ],
        );

        tag_file(&path, &make_episode("Episode 1"), &channel).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.album(), Some("Season 2"));
        assert_eq!(tag.genre(), Some("News"));

        let comment = tag.comments().next().unwrap();
        assert_eq!(comment.lang, "eng");
        assert_eq!(comment.text, "Fetched by podspool");
    }

    #[test]
    fn genre_setting_is_a_fallback_for_genre_tag() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());
        let channel = make_channel("showA", &[("genre", "Talk")]);

        tag_file(&path, &make_episode("Episode 1"), &channel).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.genre(), Some("Talk"));
    }

    #[test]
    fn nothing_written_when_all_fields_already_present() {
        let dir = tempdir().unwrap();
        let path = junk_mp3(dir.path());

        let mut existing = Tag::new();
        existing.set_title("Title");
        existing.set_artist("Artist");
        existing.write_to_path(&path, Version::Id3v24).unwrap();

        let channel = make_channel("showA", &[]);
        let touched = tag_file(&path, &make_episode("Other"), &channel).unwrap();
        assert!(!touched);
    }

    #[test]
    fn unsupported_container_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episode.ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let channel = make_channel("showA", &[]);
        let result = tag_file(&path, &make_episode("Episode 1"), &channel);

        assert!(matches!(
            result,
            Err(TagError::UnsupportedFormat { extension }) if extension == "ogg"
        ));
    }

    #[test]
    fn title_case_capitalizes_words() {
        assert_eq!(title_case("morning news"), "Morning News");
        assert_eq!(title_case("showA"), "Showa");
        assert_eq!(title_case("my-favorite show"), "My-Favorite Show");
        assert_eq!(title_case(""), "");
    }
}
