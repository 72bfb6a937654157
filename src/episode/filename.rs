use url::Url;

use crate::config::ChannelConfig;
use crate::feed::Episode;

/// Extension used when the enclosure URL's path carries none
const DEFAULT_EXTENSION: &str = ".mp3";

/// Check if a character may appear in a generated filename
fn is_safe_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Compute the output filename for an episode.
///
/// A configured `filespec` is used literally; template tokens are not
/// expanded. Otherwise the name is built as
/// `{channel}_{sanitized title}{extension}`.
pub fn episode_filename(episode: &Episode, channel: &ChannelConfig) -> String {
    if let Some(filespec) = channel.filespec() {
        return filespec.to_string();
    }

    let title = sanitize_title(&episode.title);
    let extension = extension_for(episode.enclosure_url().unwrap_or_default());

    format!("{}_{}{}", channel.name(), title, extension)
}

/// Replace every character outside `[A-Za-z0-9_.-]` with an underscore.
/// The mapping is strictly one character to one character.
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if is_safe_filename_char(c) { c } else { '_' })
        .collect()
}

/// Derive the filename extension (with its dot) from the final path
/// segment of the enclosure URL.
fn extension_for(enclosure_url: &str) -> String {
    let path = match Url::parse(enclosure_url) {
        Ok(url) => url.path().to_string(),
        // Not an absolute URL; strip query and fragment by hand
        Err(_) => enclosure_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rfind('.') {
        Some(pos) if pos > 0 => segment[pos..].to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_channel(settings: &[(&str, &str)]) -> ChannelConfig {
        let settings: HashMap<String, String> = settings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ChannelConfig::new("showA", "http://x/feed.xml", settings)
    }

    fn make_episode(title: &str, enclosure_url: &str) -> Episode {
        Episode {
            title: title.to_string(),
            enclosure: Some(crate::feed::Enclosure {
                url: Some(enclosure_url.to_string()),
                mime_type: None,
                length: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn filespec_is_used_literally() {
        let channel = make_channel(&[("filespec", "latest.mp3")]);
        let episode = make_episode("Some Episode", "http://x/audio/ep.ogg");

        assert_eq!(episode_filename(&episode, &channel), "latest.mp3");
    }

    #[test]
    fn default_name_combines_channel_title_and_extension() {
        let channel = make_channel(&[]);
        let episode = make_episode("Episode 12", "http://x/audio/ep12.mp3");

        assert_eq!(episode_filename(&episode, &channel), "showA_Episode_12.mp3");
    }

    #[test]
    fn sanitize_maps_each_character_one_to_one() {
        let title = "Ep. #5: a/b (c)?";
        let sanitized = sanitize_title(title);

        assert_eq!(sanitized, "Ep.__5__a_b__c__");
        assert_eq!(sanitized.chars().count(), title.chars().count());
    }

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_title("abc-XYZ_0.9"), "abc-XYZ_0.9");
    }

    #[test]
    fn extension_ignores_query_parameters() {
        assert_eq!(extension_for("http://x/audio/ep.ogg?session=42"), ".ogg");
    }

    #[test]
    fn extension_defaults_to_mp3() {
        assert_eq!(extension_for("http://x/audio/episode"), ".mp3");
        assert_eq!(extension_for(""), ".mp3");
    }

    #[test]
    fn extension_from_relative_url() {
        assert_eq!(extension_for("audio/ep.m4a?x=1"), ".m4a");
    }

    #[test]
    fn leading_dot_segment_is_not_an_extension() {
        assert_eq!(extension_for("http://x/audio/.hidden"), ".mp3");
    }
}
