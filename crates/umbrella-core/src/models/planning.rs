//! Planning (daily shift roster) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two daily shifts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    #[serde(rename = "MORNING", alias = "morning")]
    Morning,
    #[serde(rename = "EVENING", alias = "evening")]
    Evening,
}

impl ShiftType {
    pub const ALL: [ShiftType; 2] = [ShiftType::Morning, ShiftType::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "MORNING",
            ShiftType::Evening => "EVENING",
        }
    }

    /// The opposite shift of the same day
    pub fn other(&self) -> ShiftType {
        match self {
            ShiftType::Morning => ShiftType::Evening,
            ShiftType::Evening => ShiftType::Morning,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MORNING" | "MATIN" => Ok(ShiftType::Morning),
            "EVENING" | "SOIR" => Ok(ShiftType::Evening),
            _ => Err(format!("Invalid shift: {}. Use MORNING or EVENING", s)),
        }
    }
}

/// Attendance status of one roster line
///
/// The aliases cover the lowercase French names used by older payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    #[serde(rename = "WORKED", alias = "present")]
    Worked,
    #[serde(rename = "ABSENT", alias = "absent")]
    Absent,
    #[serde(rename = "REST", alias = "repos")]
    Rest,
    #[serde(rename = "REPLACEMENT", alias = "permutation")]
    Replacement,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Worked => "WORKED",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Rest => "REST",
            AttendanceStatus::Replacement => "REPLACEMENT",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WORKED" | "PRESENT" => Ok(AttendanceStatus::Worked),
            "ABSENT" => Ok(AttendanceStatus::Absent),
            "REST" | "REPOS" => Ok(AttendanceStatus::Rest),
            "REPLACEMENT" | "PERMUTATION" => Ok(AttendanceStatus::Replacement),
            _ => Err(format!(
                "Invalid status: {}. Use WORKED, ABSENT, REST or REPLACEMENT",
                s
            )),
        }
    }
}

/// Denormalized agent identity carried in roster lines for display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentSummary {
    pub first_name: String,
    pub last_name: String,
    pub matricule: String,
}

/// One roster line of a stored planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningAgent {
    pub agent_id: i64,
    pub agent: Option<AgentSummary>,
    pub shift: ShiftType,
    pub status: AttendanceStatus,
    pub reason: Option<String>,
    pub remplacant_id: Option<i64>,
    pub remplacant: Option<AgentSummary>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShiftRoster {
    pub agents: Vec<PlanningAgent>,
}

/// Both rosters of a planning, keyed by shift name on the wire
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shifts {
    #[serde(rename = "MORNING")]
    pub morning: ShiftRoster,
    #[serde(rename = "EVENING")]
    pub evening: ShiftRoster,
}

impl Shifts {
    pub fn roster(&self, shift: ShiftType) -> &[PlanningAgent] {
        match shift {
            ShiftType::Morning => &self.morning.agents,
            ShiftType::Evening => &self.evening.agents,
        }
    }

    pub fn roster_mut(&mut self, shift: ShiftType) -> &mut Vec<PlanningAgent> {
        match shift {
            ShiftType::Morning => &mut self.morning.agents,
            ShiftType::Evening => &mut self.evening.agents,
        }
    }

    pub fn total_agents(&self) -> usize {
        self.morning.agents.len() + self.evening.agents.len()
    }
}

/// Site summary embedded in a planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningSite {
    pub id: i64,
    pub name: Option<String>,
    pub location: Option<String>,
}

/// One day's shift roster for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planning {
    pub id: i64,
    pub site_id: i64,
    pub site: Option<PlanningSite>,
    pub date: NaiveDate,
    pub shifts: Shifts,
    pub created_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Planning {
    pub fn site_name(&self) -> Option<&str> {
        self.site.as_ref().and_then(|s| s.name.as_deref())
    }

    /// True if the agent is rostered (or standing in) on either shift
    pub fn involves_agent(&self, agent_id: i64) -> bool {
        ShiftType::ALL.iter().any(|shift| {
            self.shifts
                .roster(*shift)
                .iter()
                .any(|a| a.agent_id == agent_id || a.remplacant_id == Some(agent_id))
        })
    }
}

/// Roster line as edited by the composer and sent on create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningAgentInput {
    pub agent_id: i64,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remplacant_id: Option<i64>,
}

impl PlanningAgentInput {
    /// New line with the default WORKED status
    pub fn worked(agent_id: i64) -> Self {
        Self {
            agent_id,
            status: AttendanceStatus::Worked,
            reason: None,
            remplacant_id: None,
        }
    }
}

impl From<&PlanningAgent> for PlanningAgentInput {
    fn from(agent: &PlanningAgent) -> Self {
        Self {
            agent_id: agent.agent_id,
            status: agent.status,
            reason: agent.reason.clone(),
            remplacant_id: agent.remplacant_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftInput {
    pub agents: Vec<PlanningAgentInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftsInput {
    #[serde(rename = "MORNING")]
    pub morning: ShiftInput,
    #[serde(rename = "EVENING")]
    pub evening: ShiftInput,
}

impl From<&Shifts> for ShiftsInput {
    fn from(shifts: &Shifts) -> Self {
        Self {
            morning: ShiftInput {
                agents: shifts.morning.agents.iter().map(Into::into).collect(),
            },
            evening: ShiftInput {
                agents: shifts.evening.agents.iter().map(Into::into).collect(),
            },
        }
    }
}

/// Create planning request (`POST /plannings`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlanning {
    pub site_id: i64,
    pub date: NaiveDate,
    pub shifts: ShiftsInput,
    pub created_by: i64,
}

/// Update planning request (`PUT /plannings/{id}`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdatePlanning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts: Option<ShiftsInput>,
}
