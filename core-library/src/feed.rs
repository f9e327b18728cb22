//! Feed document types and mapping to [`Track`]s.
//!
//! The feed is a JSON object whose `data` array holds one entry per track:
//!
//! ```json
//! {
//!   "data": [{
//!     "id": "57a1",
//!     "name": "Morning jam",
//!     "audioLink": "https://.../1.m4a",
//!     "createdOn": "2017-09-18T15:07:00Z",
//!     "picture": { "m": "https://.../m.png" },
//!     "author": { "name": "Ivan", "picture": { "xs": "https://.../xs.png" } }
//!   }]
//! }
//! ```
//!
//! Entries missing a required field are skipped; the rest of the feed still
//! loads. A missing or unreadable `createdOn` leaves [`Track::created`] empty.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::models::{Author, Track};

const CREATED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Top-level feed document.
#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    /// Raw entries; each is mapped independently so one bad entry does not
    /// reject the document.
    pub data: Vec<Value>,
}

/// Picture set attached to tracks and authors. Only the sizes the client
/// displays are read.
#[derive(Debug, Default, Deserialize)]
pub struct FeedPicture {
    pub xs: Option<String>,
    pub m: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedAuthor {
    pub name: Option<String>,
    pub picture: Option<FeedPicture>,
}

/// One entry of the `data` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: Option<String>,
    pub author: Option<FeedAuthor>,
    pub name: Option<String>,
    pub picture: Option<FeedPicture>,
    pub audio_link: Option<String>,
    pub created_on: Option<String>,
}

impl TryFrom<FeedAuthor> for Author {
    type Error = &'static str;

    fn try_from(author: FeedAuthor) -> std::result::Result<Self, Self::Error> {
        let name = author.name.ok_or("author.name missing")?;
        let avatar_url = author
            .picture
            .and_then(|p| p.xs)
            .ok_or("author.picture.xs missing")?;
        Ok(Author { name, avatar_url })
    }
}

impl TryFrom<FeedEntry> for Track {
    type Error = &'static str;

    fn try_from(entry: FeedEntry) -> std::result::Result<Self, Self::Error> {
        let id = entry.id.ok_or("id missing")?;
        let author = Author::try_from(entry.author.ok_or("author missing")?)?;
        let name = entry.name.ok_or("name missing")?;
        let cover_url = entry
            .picture
            .and_then(|p| p.m)
            .ok_or("picture.m missing")?;
        let audio_url = entry.audio_link.ok_or("audioLink missing")?;

        Ok(Track {
            id: id.into(),
            author,
            name,
            cover_url,
            audio_url,
            created: entry.created_on.as_deref().and_then(parse_created_on),
        })
    }
}

/// Parse a `createdOn` value (`YYYY-MM-DDTHH:MM:SSZ`, UTC).
pub fn parse_created_on(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, CREATED_ON_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a feed document body into tracks, in feed order.
///
/// # Errors
///
/// [`LibraryError::Parse`] if the body is not JSON or has no `data` array.
pub fn parse_feed(body: &[u8]) -> Result<Vec<Track>> {
    let document: FeedDocument = serde_json::from_slice(body)
        .map_err(|e| LibraryError::Parse(format!("invalid feed document: {}", e)))?;

    Ok(map_entries(document.data))
}

fn map_entries(entries: Vec<Value>) -> Vec<Track> {
    let total = entries.len();
    let tracks: Vec<Track> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let entry = match serde_json::from_value::<FeedEntry>(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(index, error = %e, "Skipping malformed feed entry");
                    return None;
                }
            };
            match Track::try_from(entry) {
                Ok(track) => Some(track),
                Err(reason) => {
                    debug!(index, reason, "Skipping incomplete feed entry");
                    None
                }
            }
        })
        .collect();

    debug!(total, mapped = tracks.len(), "Feed mapped");
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn entry(id: &str) -> Value {
        serde_json::json!({
            "id": id,
            "name": format!("Song {}", id),
            "audioLink": format!("https://audio.test/{}.m4a", id),
            "createdOn": "2017-09-18T15:07:00Z",
            "picture": { "m": "https://img.test/m.png", "l": "https://img.test/l.png" },
            "author": { "name": "Ivan", "picture": { "xs": "https://img.test/xs.png" } }
        })
    }

    fn body(entries: Vec<Value>) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "data": entries })).unwrap()
    }

    #[test]
    fn test_maps_complete_entry() {
        let tracks = parse_feed(&body(vec![entry("a")])).unwrap();

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.id.as_str(), "a");
        assert_eq!(track.name, "Song a");
        assert_eq!(track.author.name, "Ivan");
        assert_eq!(track.author.avatar_url, "https://img.test/xs.png");
        assert_eq!(track.cover_url, "https://img.test/m.png");
        assert_eq!(track.audio_url, "https://audio.test/a.m4a");

        let created = track.created.unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2017, 9, 18));
        assert_eq!((created.hour(), created.minute()), (15, 7));
    }

    #[test]
    fn test_skips_incomplete_entries_and_keeps_order() {
        let mut missing_audio = entry("b");
        missing_audio.as_object_mut().unwrap().remove("audioLink");
        let mut missing_avatar = entry("c");
        missing_avatar["author"]["picture"] = serde_json::json!({});

        let tracks = parse_feed(&body(vec![
            entry("a"),
            missing_audio,
            missing_avatar,
            serde_json::json!("not an object"),
            entry("d"),
        ]))
        .unwrap();

        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_bad_created_on_keeps_entry() {
        let mut odd = entry("a");
        odd["createdOn"] = serde_json::json!("yesterday");
        let mut absent = entry("b");
        absent.as_object_mut().unwrap().remove("createdOn");

        let tracks = parse_feed(&body(vec![odd, absent])).unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.created.is_none()));
    }

    #[test]
    fn test_wrong_field_type_skips_entry() {
        let mut numeric_id = entry("a");
        numeric_id["id"] = serde_json::json!(42);

        let tracks = parse_feed(&body(vec![numeric_id, entry("b")])).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id.as_str(), "b");
    }

    #[test]
    fn test_missing_data_array_is_parse_error() {
        let err = parse_feed(br#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, LibraryError::Parse(_)));

        let err = parse_feed(b"<html>").unwrap_err();
        assert!(matches!(err, LibraryError::Parse(_)));
    }

    #[test]
    fn test_parse_created_on_accepts_offsets() {
        let parsed = parse_created_on("2017-09-18T17:07:00+02:00").unwrap();
        assert_eq!(parsed.hour(), 15);
        assert!(parse_created_on("18.09.2017").is_none());
    }
}
