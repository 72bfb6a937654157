// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FeedError;

/// A single feed item, as far as this tool cares about it.
///
/// Text fields are trimmed and default to the empty string when the
/// sub-element is absent. The pubDate is kept as the raw feed string.
#[derive(Debug, Clone, Default)]
pub struct Episode {
    pub title: String,
    pub description: String,
    pub pub_date: String,
    pub link: String,
    pub enclosure: Option<Enclosure>,
}

impl Episode {
    /// The enclosure URL, when both the element and its `url` attribute exist
    pub fn enclosure_url(&self) -> Option<&str> {
        self.enclosure.as_ref().and_then(|e| e.url.as_deref())
    }
}

/// The media pointer of a feed item. Each attribute may be absent on its own.
#[derive(Debug, Clone, Default)]
pub struct Enclosure {
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub length: Option<u64>,
}

/// Which text sub-element of an `item` is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    PubDate,
    Link,
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"description" => Some(Field::Description),
        b"pubDate" => Some(Field::PubDate),
        b"link" => Some(Field::Link),
        _ => None,
    }
}

/// Parse feed XML into episode descriptors.
///
/// Every `item` element anywhere in the document is collected, in document
/// order; no date-based re-sorting is performed. Malformed XML is an error
/// for the caller to turn into an empty result.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<Episode>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut episodes = Vec::new();
    let mut current: Option<Episode> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(FeedError::ParseFailed(e)),
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" => {
                    current = Some(Episode::default());
                    field = None;
                }
                b"enclosure" if current.is_some() => {
                    if let Some(episode) = current.as_mut() {
                        // The first enclosure of an item wins
                        if episode.enclosure.is_none() {
                            episode.enclosure = Some(parse_enclosure(&e));
                        }
                    }
                }
                name if current.is_some() => {
                    field = field_for(name);
                    text.clear();
                }
                _ => {}
            },

            // Enclosures are usually self-closing
            Ok(Event::Empty(e)) => {
                if current.is_some() && e.local_name().as_ref() == b"enclosure" {
                    if let Some(episode) = current.as_mut() {
                        if episode.enclosure.is_none() {
                            episode.enclosure = Some(parse_enclosure(&e));
                        }
                    }
                }
            }

            Ok(Event::Text(t)) => {
                if field.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }

            Ok(Event::CData(t)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }

            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"item" {
                    if let Some(episode) = current.take() {
                        episodes.push(episode);
                    }
                    field = None;
                } else if let (Some(episode), Some(open)) = (current.as_mut(), field) {
                    if field_for(name.as_ref()) == Some(open) {
                        let value = text.trim().to_string();
                        match open {
                            Field::Title => episode.title = value,
                            Field::Description => episode.description = value,
                            Field::PubDate => episode.pub_date = value,
                            Field::Link => episode.link = value,
                        }
                        field = None;
                    }
                }
            }

            _ => {}
        }
        buf.clear();
    }

    Ok(episodes)
}

fn parse_enclosure(e: &BytesStart) -> Enclosure {
    let mut enclosure = Enclosure::default();

    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"url" => enclosure.url = Some(value.into_owned()),
            b"type" => enclosure.mime_type = Some(value.into_owned()),
            b"length" => enclosure.length = value.trim().parse().ok(),
            _ => {}
        }
    }

    enclosure
}
