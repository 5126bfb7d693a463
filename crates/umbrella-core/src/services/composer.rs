//! Planning composer
//!
//! Holds an in-progress planning draft (site, date, two shift rosters) and
//! enforces the roster rules before anything is sent to the backend:
//! an agent never appears in both shifts, nor twice in one shift, and a
//! draft is only submittable with a site, a date and at least one line.

use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use crate::error::Error;
use crate::models::{
    Agent, AttendanceStatus, CreatePlanning, Planning, PlanningAgentInput, ShiftType, ShiftsInput,
    UpdatePlanning,
};

/// Why a composer action or submission was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposerError {
    #[error("Aucun agent disponible pour ce site")]
    NoEligibleAgents,

    #[error("Tous les agents sont déjà assignés à un shift")]
    AllAgentsAssigned,

    #[error("Ligne {index} introuvable dans le shift {shift}")]
    InvalidIndex { shift: ShiftType, index: usize },

    #[error("L'agent #{agent_id} est déjà assigné au shift {shift}")]
    AgentInOtherShift { agent_id: i64, shift: ShiftType },

    #[error("L'agent #{agent_id} figure déjà dans le shift {shift}")]
    DuplicateInShift { agent_id: i64, shift: ShiftType },

    #[error("Le site et la date sont requis")]
    MissingSiteOrDate,

    #[error("Au moins un agent doit être ajouté dans un des shifts")]
    EmptyRosters,

    #[error("Un remplaçant est requis pour l'agent #{agent_id}")]
    MissingReplacement { agent_id: i64 },

    #[error("Le remplaçant #{remplacant_id} de l'agent #{agent_id} doit être un autre agent du site")]
    InvalidReplacement { agent_id: i64, remplacant_id: i64 },
}

impl From<ComposerError> for Error {
    fn from(err: ComposerError) -> Self {
        Error::Validation(err.to_string())
    }
}

/// Single-field edit of one roster line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentFieldUpdate {
    Agent(i64),
    Status(AttendanceStatus),
    Reason(Option<String>),
    Remplacant(Option<i64>),
}

/// Draft planning under construction
#[derive(Debug, Clone)]
pub struct PlanningComposer {
    agents: Vec<Agent>,
    site_id: Option<i64>,
    date: Option<NaiveDate>,
    shifts: ShiftsInput,
}

impl PlanningComposer {
    /// New empty draft over the known agents (all sites)
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            agents,
            site_id: None,
            date: None,
            shifts: ShiftsInput::default(),
        }
    }

    /// Draft pre-filled from a stored planning, for editing
    pub fn from_planning(agents: Vec<Agent>, planning: &Planning) -> Self {
        Self {
            agents,
            site_id: Some(planning.site_id),
            date: Some(planning.date),
            shifts: ShiftsInput::from(&planning.shifts),
        }
    }

    pub fn site_id(&self) -> Option<i64> {
        self.site_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Choose the site. Both rosters are emptied since eligibility depends on the site.
    pub fn select_site(&mut self, site_id: i64) {
        if self.total_lines() > 0 {
            log::debug!(
                "[composer] site changed to #{}, dropping {} roster line(s)",
                site_id,
                self.total_lines()
            );
        }
        self.site_id = Some(site_id);
        self.shifts = ShiftsInput::default();
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
    }

    /// Agents belonging to the selected site, in the order they were supplied
    pub fn site_agents(&self) -> Vec<&Agent> {
        match self.site_id {
            Some(site_id) => self.agents.iter().filter(|a| a.site.id == site_id).collect(),
            None => Vec::new(),
        }
    }

    pub fn roster(&self, shift: ShiftType) -> &[PlanningAgentInput] {
        match shift {
            ShiftType::Morning => &self.shifts.morning.agents,
            ShiftType::Evening => &self.shifts.evening.agents,
        }
    }

    fn roster_mut(&mut self, shift: ShiftType) -> &mut Vec<PlanningAgentInput> {
        match shift {
            ShiftType::Morning => &mut self.shifts.morning.agents,
            ShiftType::Evening => &mut self.shifts.evening.agents,
        }
    }

    fn total_lines(&self) -> usize {
        self.shifts.morning.agents.len() + self.shifts.evening.agents.len()
    }

    fn ids_in(&self, shift: ShiftType) -> HashSet<i64> {
        self.roster(shift).iter().map(|a| a.agent_id).collect()
    }

    /// Append a WORKED line for the first site agent not yet rostered.
    ///
    /// Returns the index of the new line.
    pub fn add_agent_to_shift(&mut self, shift: ShiftType) -> Result<usize, ComposerError> {
        let site_agents = self.site_agents();
        if site_agents.is_empty() {
            return Err(ComposerError::NoEligibleAgents);
        }

        let mut used = self.ids_in(shift.other());
        used.extend(self.ids_in(shift));

        let agent_id = site_agents
            .iter()
            .map(|a| a.id)
            .find(|id| !used.contains(id))
            .ok_or(ComposerError::AllAgentsAssigned)?;

        let roster = self.roster_mut(shift);
        roster.push(PlanningAgentInput::worked(agent_id));
        log::debug!("[composer] agent #{} added to {}", agent_id, shift);
        Ok(roster.len() - 1)
    }

    /// Replace one field of one roster line
    pub fn update_agent_field(
        &mut self,
        shift: ShiftType,
        index: usize,
        update: AgentFieldUpdate,
    ) -> Result<(), ComposerError> {
        if index >= self.roster(shift).len() {
            return Err(ComposerError::InvalidIndex { shift, index });
        }

        if let AgentFieldUpdate::Agent(agent_id) = update {
            if self.ids_in(shift.other()).contains(&agent_id) {
                return Err(ComposerError::AgentInOtherShift {
                    agent_id,
                    shift: shift.other(),
                });
            }
            let duplicate = self
                .roster(shift)
                .iter()
                .enumerate()
                .any(|(i, a)| i != index && a.agent_id == agent_id);
            if duplicate {
                return Err(ComposerError::DuplicateInShift { agent_id, shift });
            }
        }

        let line = &mut self.roster_mut(shift)[index];
        match update {
            AgentFieldUpdate::Agent(agent_id) => line.agent_id = agent_id,
            AgentFieldUpdate::Status(status) => line.status = status,
            AgentFieldUpdate::Reason(reason) => {
                line.reason = reason.filter(|r| !r.trim().is_empty())
            }
            AgentFieldUpdate::Remplacant(remplacant_id) => line.remplacant_id = remplacant_id,
        }
        Ok(())
    }

    /// Remove a line; following lines move up
    pub fn remove_agent_from_shift(
        &mut self,
        shift: ShiftType,
        index: usize,
    ) -> Result<PlanningAgentInput, ComposerError> {
        let roster = self.roster_mut(shift);
        if index >= roster.len() {
            return Err(ComposerError::InvalidIndex { shift, index });
        }
        Ok(roster.remove(index))
    }

    /// Agents a picker may offer for a line of `shift`.
    ///
    /// Site agents minus those rostered on the other shift, keeping
    /// `current_agent_id` so an existing selection stays valid.
    pub fn available_agents_for(
        &self,
        shift: ShiftType,
        current_agent_id: Option<i64>,
    ) -> Vec<&Agent> {
        let taken = self.ids_in(shift.other());
        self.site_agents()
            .into_iter()
            .filter(|a| !taken.contains(&a.id) || Some(a.id) == current_agent_id)
            .collect()
    }

    /// Check the draft is submittable
    pub fn validate(&self) -> Result<(), ComposerError> {
        if self.site_id.is_none() || self.date.is_none() {
            return Err(ComposerError::MissingSiteOrDate);
        }
        if self.total_lines() == 0 {
            return Err(ComposerError::EmptyRosters);
        }

        let site_ids: HashSet<i64> = self.site_agents().iter().map(|a| a.id).collect();
        for shift in ShiftType::ALL {
            for line in self.roster(shift) {
                match (line.status, line.remplacant_id) {
                    (AttendanceStatus::Replacement, None) => {
                        return Err(ComposerError::MissingReplacement {
                            agent_id: line.agent_id,
                        });
                    }
                    (_, Some(remplacant_id))
                        if remplacant_id == line.agent_id || !site_ids.contains(&remplacant_id) =>
                    {
                        return Err(ComposerError::InvalidReplacement {
                            agent_id: line.agent_id,
                            remplacant_id,
                        });
                    }
                    (AttendanceStatus::Absent, _) if line.reason.is_none() => {
                        log::warn!(
                            "[composer] agent #{} marked absent on {} without a reason",
                            line.agent_id,
                            shift
                        );
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Validated creation payload
    pub fn build(&self, created_by: i64) -> Result<CreatePlanning, ComposerError> {
        self.validate()?;
        let (site_id, date) = self.site_and_date()?;
        Ok(CreatePlanning {
            site_id,
            date,
            shifts: self.shifts.clone(),
            created_by,
        })
    }

    /// Validated full-replacement patch for an existing planning
    pub fn into_update(self) -> Result<UpdatePlanning, ComposerError> {
        self.validate()?;
        let (site_id, date) = self.site_and_date()?;
        Ok(UpdatePlanning {
            site_id: Some(site_id),
            date: Some(date),
            shifts: Some(self.shifts),
        })
    }

    fn site_and_date(&self) -> Result<(i64, NaiveDate), ComposerError> {
        match (self.site_id, self.date) {
            (Some(site_id), Some(date)) => Ok((site_id, date)),
            _ => Err(ComposerError::MissingSiteOrDate),
        }
    }
}
