use std::{fs, path::Path};

use log::{debug, info};
use strumline_schema::SongFile;

mod error;
mod model;
mod parser;
mod time_map;

pub use error::{ChartError, ChartErrorKind};
pub use model::{sort_notes, BpmChange, Chart, Lane, Note, NoteState, ScriptEvent, Side, LANE_COUNT};

use parser::{script_events, section_notes};
use time_map::bpm_timeline;

pub fn parse_file(path: impl AsRef<Path>) -> Result<Chart, ChartError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ChartError::new("C1001", format!("failed to read chart: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    parse_str(&src).map_err(|e| e.with_file(path.display().to_string()))
}

pub fn parse_str(src: &str) -> Result<Chart, ChartError> {
    let file: SongFile = serde_json::from_str(src)
        .map_err(|e| ChartError::new("C1002", format!("invalid chart json: {e}"), 0))?;
    parse_document(&file)
}

/// Flattens the section list into one time-sorted note list.
///
/// Any malformed note rejects the whole chart; there is no partial load.
pub fn parse_document(file: &SongFile) -> Result<Chart, ChartError> {
    let song = file.song();

    if !(song.bpm.is_finite() && song.bpm > 0.0) {
        return Err(ChartError::new("C2001", format!("bpm must be > 0, got {}", song.bpm), 0));
    }
    if !(song.speed.is_finite() && song.speed > 0.0) {
        return Err(ChartError::new("C2002", format!("speed must be > 0, got {}", song.speed), 0));
    }

    let mut notes = Vec::new();
    for (index, section) in song.notes.iter().enumerate() {
        let parsed = section_notes(section, index)?;
        debug!("section {index}: {} note(s), must_hit={}", parsed.len(), section.must_hit_section);
        notes.extend(parsed);
    }

    let bpm_changes = bpm_timeline(song)?;
    let events = script_events(&song.events);

    let mut chart = Chart::new(song.bpm, song.speed, notes);
    chart.song = song.name.clone();
    chart.needs_voices = song.needs_voices;
    chart.events = events;
    chart.bpm_changes = bpm_changes;

    info!(
        "parsed chart {:?}: {} notes ({} player), {} holds, {} bpm changes, {} script events",
        chart.song,
        chart.notes.len(),
        chart.notes_for(Side::Player).count(),
        chart.hold_count(),
        chart.bpm_changes.len(),
        chart.events.len()
    );

    Ok(chart)
}
