use super::{PersistenceError, PersistenceResult};
use crate::phase::{Phase, PhaseId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct PhaseSetSnapshot {
    phases: Vec<Phase>,
}

pub fn save_phases_to_json<P: AsRef<Path>>(phases: &[Phase], path: P) -> PersistenceResult<()> {
    super::validate_phases(phases)?;
    let snapshot = PhaseSetSnapshot {
        phases: phases.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_phases_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Phase>> {
    let file = File::open(path)?;
    let snapshot: PhaseSetSnapshot = serde_json::from_reader(file)?;
    super::validate_phases(&snapshot.phases)?;
    Ok(snapshot.phases)
}

#[derive(Default, Serialize, Deserialize)]
struct PhaseCsvRecord {
    id: PhaseId,
    number: String,
    title: String,
    duration: i64,
    #[serde(default)]
    predecessors: String,
}

impl From<&Phase> for PhaseCsvRecord {
    fn from(phase: &Phase) -> Self {
        Self {
            id: phase.id,
            number: phase.number.clone(),
            title: phase.title.clone(),
            duration: phase.duration,
            predecessors: join_i32(&phase.predecessors),
        }
    }
}

impl PhaseCsvRecord {
    fn into_phase(self) -> PersistenceResult<Phase> {
        let predecessors = split_i32(&self.predecessors)?;
        Ok(Phase::new(self.id, self.number, self.title, self.duration)
            .with_predecessors(predecessors))
    }
}

pub fn save_phases_to_csv<P: AsRef<Path>>(phases: &[Phase], path: P) -> PersistenceResult<()> {
    super::validate_phases(phases)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for phase in phases {
        writer.serialize(PhaseCsvRecord::from(phase))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_phases_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Phase>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut phases = Vec::new();
    for record in reader.deserialize::<PhaseCsvRecord>() {
        phases.push(record?.into_phase()?);
    }
    super::validate_phases(&phases)?;
    Ok(phases)
}

fn join_i32(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_i32(input: &str) -> PersistenceResult<Vec<i32>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|part| {
            part.trim().parse::<i32>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid phase id '{part}': {e}"))
            })
        })
        .collect()
}
