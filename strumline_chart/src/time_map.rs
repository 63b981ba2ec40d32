use strumline_schema::Song;

use crate::model::BpmChange;
use crate::ChartError;

/// Walks the sections once and records every tempo change at the time its
/// section starts.
pub(crate) fn bpm_timeline(song: &Song) -> Result<Vec<BpmChange>, ChartError> {
    let mut bpm = song.bpm;
    let mut section_start = 0.0_f64;
    let mut changes = Vec::new();

    for (index, section) in song.notes.iter().enumerate() {
        if section.change_bpm {
            if let Some(new_bpm) = section.bpm {
                if !(new_bpm.is_finite() && new_bpm > 0.0) {
                    return Err(ChartError::new(
                        "C2003",
                        format!("section bpm must be > 0, got {new_bpm}"),
                        index,
                    ));
                }
                if new_bpm != bpm {
                    changes.push(BpmChange {
                        time: section_start,
                        bpm: new_bpm,
                    });
                    bpm = new_bpm;
                }
            }
        }
        section_start += section_duration_ms(bpm, section.length_in_steps);
    }

    Ok(changes)
}

fn section_duration_ms(bpm: f64, length_in_steps: u32) -> f64 {
    let crochet = 60_000.0 / bpm;
    crochet * (length_in_steps as f64 / 4.0)
}
