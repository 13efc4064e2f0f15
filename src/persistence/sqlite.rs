use super::{PersistenceError, PersistenceResult, PhaseStore, normalized_predecessors};
use crate::phase::{Phase, PhaseDraft, PhaseId, ProjectId};
use crate::phase_validation::validate_phase;
use rusqlite::{Connection, Transaction, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub struct SqlitePhaseStore {
    connection: Mutex<Connection>,
}

impl SqlitePhaseStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS phases (
                phase_id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                number TEXT NOT NULL,
                title TEXT NOT NULL,
                hours INTEGER NOT NULL CHECK (hours > 0),
                UNIQUE (project_id, number)
            );
            CREATE TABLE IF NOT EXISTS phase_dependencies (
                phase_id INTEGER NOT NULL
                    REFERENCES phases (phase_id) ON DELETE CASCADE,
                predecessor_phase_id INTEGER NOT NULL
                    REFERENCES phases (phase_id) ON DELETE CASCADE,
                PRIMARY KEY (phase_id, predecessor_phase_id),
                CHECK (phase_id <> predecessor_phase_id)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn number_taken(
        tx: &Transaction,
        project_id: ProjectId,
        number: &str,
        exclude: Option<PhaseId>,
    ) -> PersistenceResult<bool> {
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM phases
             WHERE project_id = ?1 AND number = ?2 AND (?3 IS NULL OR phase_id <> ?3)",
            params![project_id, number, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn save_dependencies(
        tx: &Transaction,
        project_id: ProjectId,
        phase_id: PhaseId,
        predecessors: &[PhaseId],
    ) -> PersistenceResult<()> {
        tx.execute(
            "DELETE FROM phase_dependencies WHERE phase_id = ?1",
            params![phase_id],
        )?;
        let mut exists = tx.prepare(
            "SELECT COUNT(*) FROM phases WHERE phase_id = ?1 AND project_id = ?2",
        )?;
        let mut insert = tx.prepare(
            "INSERT INTO phase_dependencies (phase_id, predecessor_phase_id) VALUES (?1, ?2)",
        )?;
        for &pred in predecessors {
            let count: i64 = exists.query_row(params![pred, project_id], |row| row.get(0))?;
            if count == 0 {
                return Err(PersistenceError::InvalidData(format!(
                    "predecessor {pred} is not a phase of project {project_id}"
                )));
            }
            insert.execute(params![phase_id, pred])?;
        }
        Ok(())
    }

    fn save_in_tx(
        tx: &Transaction,
        project_id: ProjectId,
        phase_id: Option<PhaseId>,
        draft: &PhaseDraft,
    ) -> PersistenceResult<Phase> {
        validate_phase(&draft.clone().into_phase(phase_id.unwrap_or_default()))
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;

        if Self::number_taken(tx, project_id, &draft.number, phase_id)? {
            return Err(PersistenceError::DuplicateNumber {
                project_id,
                number: draft.number.clone(),
            });
        }

        let id = match phase_id {
            None => {
                tx.execute(
                    "INSERT INTO phases (project_id, number, title, hours) VALUES (?1, ?2, ?3, ?4)",
                    params![project_id, draft.number, draft.title, draft.duration],
                )?;
                tx.last_insert_rowid() as PhaseId
            }
            Some(id) => {
                let updated = tx.execute(
                    "UPDATE phases SET number = ?1, title = ?2, hours = ?3
                     WHERE phase_id = ?4 AND project_id = ?5",
                    params![draft.number, draft.title, draft.duration, id, project_id],
                )?;
                if updated == 0 {
                    return Err(PersistenceError::NotFound(id));
                }
                id
            }
        };

        let predecessors = normalized_predecessors(Some(id), &draft.predecessors);
        Self::save_dependencies(tx, project_id, id, &predecessors)?;

        Ok(Phase::new(id, draft.number.clone(), draft.title.clone(), draft.duration)
            .with_predecessors(predecessors))
    }
}

impl PhaseStore for SqlitePhaseStore {
    fn load_phases(&self, project_id: ProjectId) -> PersistenceResult<Vec<Phase>> {
        let conn = self.connection();

        let mut stmt = conn.prepare(
            "SELECT phase_id, number, title, hours FROM phases
             WHERE project_id = ?1 ORDER BY number ASC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Phase::new(
                row.get(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get(3)?,
            ))
        })?;
        let mut phases = Vec::new();
        for phase in rows {
            phases.push(phase?);
        }

        let position: HashMap<PhaseId, usize> = phases
            .iter()
            .enumerate()
            .map(|(idx, phase)| (phase.id, idx))
            .collect();

        let mut stmt = conn.prepare(
            "SELECT d.phase_id, d.predecessor_phase_id FROM phase_dependencies d
             JOIN phases p ON p.phase_id = d.phase_id
             WHERE p.project_id = ?1
             ORDER BY d.phase_id, d.predecessor_phase_id",
        )?;
        let edges = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, PhaseId>(0)?, row.get::<_, PhaseId>(1)?))
        })?;
        for edge in edges {
            let (phase_id, pred_id) = edge?;
            if let Some(&idx) = position.get(&phase_id) {
                phases[idx].predecessors.push(pred_id);
            }
        }

        debug!(project_id, phases = phases.len(), "loaded phases");
        Ok(phases)
    }

    fn save_phase(
        &self,
        project_id: ProjectId,
        phase_id: Option<PhaseId>,
        draft: &PhaseDraft,
    ) -> PersistenceResult<Phase> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let phase = Self::save_in_tx(&tx, project_id, phase_id, draft)?;
        tx.commit()?;
        Ok(phase)
    }

    fn import_phases(
        &self,
        project_id: ProjectId,
        phases: &[Phase],
    ) -> PersistenceResult<Vec<Phase>> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        // Insert everything first so file ids can be mapped to stored ids.
        let mut id_map: HashMap<PhaseId, PhaseId> = HashMap::with_capacity(phases.len());
        let mut stored = Vec::with_capacity(phases.len());
        for phase in phases {
            let draft = PhaseDraft::new(phase.number.clone(), phase.title.clone(), phase.duration);
            let saved = Self::save_in_tx(&tx, project_id, None, &draft)?;
            id_map.insert(phase.id, saved.id);
            stored.push(saved);
        }

        for (phase, saved) in phases.iter().zip(stored.iter_mut()) {
            let mut mapped = Vec::with_capacity(phase.predecessors.len());
            for pred in &phase.predecessors {
                match id_map.get(pred) {
                    Some(&id) => mapped.push(id),
                    None => warn!(
                        phase = phase.id,
                        predecessor = pred,
                        "predecessor not in imported set; dropped"
                    ),
                }
            }
            if mapped.is_empty() {
                continue;
            }
            let predecessors = normalized_predecessors(Some(saved.id), &mapped);
            Self::save_dependencies(&tx, project_id, saved.id, &predecessors)?;
            saved.predecessors = predecessors;
        }

        tx.commit()?;
        debug!(project_id, phases = stored.len(), "imported phases");
        Ok(stored)
    }

    fn delete_phase(&self, phase_id: PhaseId) -> PersistenceResult<()> {
        let conn = self.connection();
        // Dependency rows on both sides go through ON DELETE CASCADE.
        let deleted = conn.execute("DELETE FROM phases WHERE phase_id = ?1", params![phase_id])?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound(phase_id));
        }
        Ok(())
    }
}
