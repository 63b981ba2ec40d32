use serde_json::Value;
use strumline_schema::{ScriptEventEntry, Section};

use crate::model::{Lane, Note, ScriptEvent, Side};
use crate::ChartError;

/// Raw lanes 0-3 belong to whoever the section focuses on, 4-7 to the other
/// side.
pub(crate) fn resolve_side(raw_lane: u8, must_hit_section: bool) -> Side {
    let first_half = raw_lane < 4;
    if first_half == must_hit_section {
        Side::Player
    } else {
        Side::Opponent
    }
}

pub(crate) fn section_notes(section: &Section, section_index: usize) -> Result<Vec<Note>, ChartError> {
    section
        .section_notes
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            resolve_note(raw, section.must_hit_section, section_index)
                .map_err(|e| e.with_note(i).with_context(Value::Array(raw.clone()).to_string()))
        })
        .collect()
}

fn resolve_note(raw: &[Value], must_hit_section: bool, section: usize) -> Result<Note, ChartError> {
    if raw.len() < 2 {
        return Err(ChartError::new(
            "C3002",
            format!("note needs at least [time, lane], got {} element(s)", raw.len()),
            section,
        ));
    }

    let time = raw[0]
        .as_f64()
        .ok_or_else(|| ChartError::new("C3001", "note time is not a number", section))?;

    let raw_lane = parse_raw_lane(&raw[1], section)?;

    let sustain = match raw.get(2) {
        None | Some(Value::Null) => 0.0,
        Some(v) => v
            .as_f64()
            .ok_or_else(|| ChartError::new("C3003", "sustain length is not a number", section))?,
    };

    let side = resolve_side(raw_lane, must_hit_section);
    let lane = Lane::from_index(usize::from(raw_lane % 4))
        .ok_or_else(|| ChartError::new("C3101", format!("lane {raw_lane} out of range"), section))?;

    Ok(Note::new(time, lane, sustain, side).with_section(section))
}

fn parse_raw_lane(value: &Value, section: usize) -> Result<u8, ChartError> {
    let n = value
        .as_f64()
        .ok_or_else(|| ChartError::new("C3004", "lane is not a number", section))?;
    if n.fract() != 0.0 || !(0.0..=7.0).contains(&n) {
        return Err(ChartError::new(
            "C3101",
            format!("lane index must be within 0-7, got {value}"),
            section,
        ));
    }
    Ok(n as u8)
}

pub(crate) fn script_events(entries: &[ScriptEventEntry]) -> Vec<ScriptEvent> {
    let mut events: Vec<ScriptEvent> = entries
        .iter()
        .map(|e| ScriptEvent {
            time: e.time,
            script: e.script.clone().filter(|s| !s.trim().is_empty()),
            kind: e.kind.clone().unwrap_or_else(|| "run".to_string()),
            params: e.params.clone(),
        })
        .collect();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}
