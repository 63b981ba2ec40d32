use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Milliseconds = f64;

/// A chart document as stored on disk.
///
/// Most charts wrap everything in a `song` object; some exporters write the
/// song fields at the top level instead. Both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SongFile {
    Wrapped { song: Song },
    Bare(Song),
}

impl SongFile {
    pub fn song(&self) -> &Song {
        match self {
            SongFile::Wrapped { song } | SongFile::Bare(song) => song,
        }
    }

    pub fn into_song(self) -> Song {
        match self {
            SongFile::Wrapped { song } | SongFile::Bare(song) => song,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(default, rename = "song", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub bpm: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub needs_voices: bool,
    #[serde(default)]
    pub notes: Vec<Section>,
    #[serde(default)]
    pub events: Vec<ScriptEventEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub must_hit_section: bool,
    /// `[time, lane, sustain, ...]` arrays. Kept as raw JSON values so the
    /// chart parser can report which element is malformed.
    #[serde(default)]
    pub section_notes: Vec<Vec<Value>>,
    #[serde(default, rename = "changeBPM")]
    pub change_bpm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default = "default_length_in_steps")]
    pub length_in_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptEventEntry {
    pub time: Milliseconds,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub params: Value,
}

fn default_speed() -> f64 {
    1.0
}

fn default_length_in_steps() -> u32 {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_document_reads_song_fields() {
        let v = serde_json::json!({
            "song": {
                "song": "Bopeebo",
                "bpm": 100,
                "speed": 1.3,
                "needsVoices": true,
                "notes": [
                    { "mustHitSection": true, "sectionNotes": [[0, 1, 0], [500, 5, 250]] }
                ]
            }
        });

        let file: SongFile = serde_json::from_value(v).unwrap();
        let song = file.song();
        assert_eq!(song.name.as_deref(), Some("Bopeebo"));
        assert_eq!(song.bpm, 100.0);
        assert_eq!(song.speed, 1.3);
        assert!(song.needs_voices);
        assert_eq!(song.notes.len(), 1);
        assert!(song.notes[0].must_hit_section);
        assert_eq!(song.notes[0].section_notes[1][2], 250);
    }

    #[test]
    fn bare_document_is_accepted() {
        let v = serde_json::json!({
            "song": "Fresh",
            "bpm": 120,
            "notes": []
        });

        let file: SongFile = serde_json::from_value(v).unwrap();
        assert!(matches!(file, SongFile::Bare(_)));
        assert_eq!(file.song().name.as_deref(), Some("Fresh"));
    }

    #[test]
    fn section_defaults() {
        let v = serde_json::json!({ "sectionNotes": [] });
        let section: Section = serde_json::from_value(v).unwrap();
        assert!(!section.must_hit_section);
        assert!(!section.change_bpm);
        assert_eq!(section.bpm, None);
        assert_eq!(section.length_in_steps, 16);
    }

    #[test]
    fn song_defaults_speed_and_events() {
        let v = serde_json::json!({ "song": { "bpm": 150 } });
        let song = serde_json::from_value::<SongFile>(v).unwrap().into_song();
        assert_eq!(song.speed, 1.0);
        assert!(song.notes.is_empty());
        assert!(song.events.is_empty());
        assert!(!song.needs_voices);
    }

    #[test]
    fn script_event_type_is_renamed() {
        let v = serde_json::json!({
            "time": 1200,
            "script": "cameraZoom",
            "type": "zoomIn",
            "params": { "zoom": 1.2 }
        });

        let event: ScriptEventEntry = serde_json::from_value(v).unwrap();
        assert_eq!(event.kind.as_deref(), Some("zoomIn"));
        assert_eq!(event.params["zoom"], 1.2);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "zoomIn");
    }
}
