//! Payload shapes accepted for each entity and their normalization

use serde::Deserialize;
use serde_json::Value;

use super::{
    created_at_or_now, expect_object, optional_timestamp, parse_calendar_date, FlexBool, FlexId,
    FlexString, FromPayload, CREATED_AT_KEYS, UPDATED_AT_KEYS,
};
use crate::error::{Error, Result};
use crate::models::{
    Agent, AgentSummary, AttendanceStatus, Candidature, Planning, PlanningAgent, PlanningSite,
    Responsible, ShiftType, Shifts, Site, SiteRef, User,
};

fn text(value: Option<FlexString>) -> Option<String> {
    value.map(|s| s.0).filter(|s| !s.trim().is_empty())
}

// ============================================================================
// Shared nested shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResponsiblePayload {
    id: FlexId,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    matricule: Option<FlexString>,
}

/// `responsable` is an object on current endpoints and a display string on old ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsibleField {
    Embedded(ResponsiblePayload),
    Other(Value),
}

impl ResponsibleField {
    fn into_responsible(self) -> Option<Responsible> {
        match self {
            ResponsibleField::Embedded(r) => Some(Responsible {
                id: r.id.0,
                first_name: r.first_name.unwrap_or_default(),
                last_name: r.last_name.unwrap_or_default(),
                matricule: text(r.matricule),
            }),
            ResponsibleField::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SiteRefPayload {
    id: FlexId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "address")]
    location: Option<String>,
    #[serde(default)]
    responsable: Option<ResponsibleField>,
}

/// A site reference: bare id, numeric string, or embedded summary
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SiteField {
    Id(FlexId),
    Embedded(SiteRefPayload),
    Other(Value),
}

// ============================================================================
// Agent
// ============================================================================

#[derive(Debug, Deserialize)]
struct AgentPayload {
    id: FlexId,
    #[serde(default)]
    matricule: Option<FlexString>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<FlexString>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    status: Option<FlexBool>,
    #[serde(default)]
    is_active: Option<FlexBool>,
    #[serde(default)]
    site: Option<SiteField>,
    #[serde(default)]
    site_id: Option<FlexId>,
}

fn resolve_site(site: Option<SiteField>, site_id: Option<FlexId>) -> Option<SiteRef> {
    match site {
        Some(SiteField::Embedded(s)) => Some(SiteRef {
            id: s.id.0,
            name: s.name.unwrap_or_default(),
            location: s.location.unwrap_or_default(),
            responsable: s.responsable.and_then(ResponsibleField::into_responsible),
        }),
        Some(SiteField::Id(id)) => Some(SiteRef::from_id(id.0)),
        Some(SiteField::Other(_)) | None => site_id.map(|id| SiteRef::from_id(id.0)),
    }
}

impl FromPayload for Agent {
    const ENTITY: &'static str = "agent";

    fn from_payload(value: Value) -> Result<Self> {
        let obj = expect_object(&value, Self::ENTITY)?;
        let created_at = created_at_or_now(obj, Self::ENTITY);
        let updated_at = optional_timestamp(obj, &UPDATED_AT_KEYS, Self::ENTITY);

        let raw: AgentPayload = serde_json::from_value(value)?;
        let site = resolve_site(raw.site, raw.site_id)
            .ok_or_else(|| Error::internal(format!("agent #{} has no site", raw.id.0)))?;

        Ok(Agent {
            id: raw.id.0,
            matricule: text(raw.matricule).unwrap_or_default(),
            first_name: raw.first_name.unwrap_or_default(),
            last_name: raw.last_name.unwrap_or_default(),
            phone: text(raw.phone),
            email: raw.email,
            location: raw.location,
            status: raw.status.or(raw.is_active).map(|s| s.0).unwrap_or(true),
            site,
            created_at,
            updated_at,
        })
    }
}

// ============================================================================
// Site
// ============================================================================

#[derive(Debug, Deserialize)]
struct SitePayload {
    id: FlexId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "address")]
    location: Option<String>,
    #[serde(default)]
    responsable_id: Option<FlexId>,
    #[serde(default)]
    responsable: Option<ResponsibleField>,
    #[serde(default)]
    agents_count: Option<usize>,
    #[serde(default)]
    agents: Option<Vec<Value>>,
}

impl FromPayload for Site {
    const ENTITY: &'static str = "site";

    fn from_payload(value: Value) -> Result<Self> {
        let obj = expect_object(&value, Self::ENTITY)?;
        let created_at = optional_timestamp(obj, &CREATED_AT_KEYS, Self::ENTITY);

        let raw: SitePayload = serde_json::from_value(value)?;
        let responsable = raw
            .responsable
            .and_then(ResponsibleField::into_responsible);
        let responsable_id = raw
            .responsable_id
            .map(|id| id.0)
            .or_else(|| responsable.as_ref().map(|r| r.id));
        let agents_count = raw
            .agents_count
            .or_else(|| raw.agents.as_ref().map(Vec::len))
            .unwrap_or(0);

        Ok(Site {
            id: raw.id.0,
            name: raw.name.unwrap_or_default(),
            location: raw.location.unwrap_or_default(),
            responsable_id,
            responsable,
            agents_count,
            created_at,
        })
    }
}

// ============================================================================
// Planning
// ============================================================================

#[derive(Debug, Deserialize)]
struct AgentSummaryPayload {
    #[serde(default)]
    id: Option<FlexId>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    matricule: Option<FlexString>,
}

impl AgentSummaryPayload {
    fn into_summary(self) -> AgentSummary {
        AgentSummary {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            matricule: text(self.matricule).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanningAgentPayload {
    #[serde(default)]
    agent_id: Option<FlexId>,
    #[serde(default)]
    agent: Option<AgentSummaryPayload>,
    #[serde(default)]
    shift: Option<ShiftType>,
    #[serde(default)]
    status: Option<AttendanceStatus>,
    #[serde(default, alias = "motif")]
    reason: Option<String>,
    #[serde(default)]
    remplacant_id: Option<FlexId>,
    #[serde(default)]
    remplacant: Option<AgentSummaryPayload>,
}

impl PlanningAgentPayload {
    /// Normalize into a roster line; `bucket` is the shift the line was listed under
    fn into_agent(self, bucket: Option<ShiftType>) -> Result<PlanningAgent> {
        let agent_id = self
            .agent_id
            .or_else(|| self.agent.as_ref().and_then(|a| a.id))
            .ok_or_else(|| Error::internal("planning line has no agent_id"))?;
        let remplacant_id = self
            .remplacant_id
            .or_else(|| self.remplacant.as_ref().and_then(|a| a.id));
        let shift = bucket
            .or(self.shift)
            .ok_or_else(|| Error::internal(format!("planning line for agent #{} has no shift", agent_id.0)))?;

        Ok(PlanningAgent {
            agent_id: agent_id.0,
            agent: self.agent.map(AgentSummaryPayload::into_summary),
            shift,
            status: self.status.unwrap_or_default(),
            reason: self.reason.filter(|r| !r.trim().is_empty()),
            remplacant_id: remplacant_id.map(|id| id.0),
            remplacant: self.remplacant.map(AgentSummaryPayload::into_summary),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ShiftPayload {
    #[serde(default)]
    agents: Vec<PlanningAgentPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct ShiftsPayload {
    #[serde(default, rename = "MORNING", alias = "morning")]
    morning: Option<ShiftPayload>,
    #[serde(default, rename = "EVENING", alias = "evening")]
    evening: Option<ShiftPayload>,
}

#[derive(Debug, Deserialize)]
struct PlanningSitePayload {
    id: FlexId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "address")]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanningSiteField {
    Id(FlexId),
    Embedded(PlanningSitePayload),
}

#[derive(Debug, Deserialize)]
struct PlanningPayload {
    id: FlexId,
    #[serde(default)]
    site_id: Option<FlexId>,
    #[serde(default)]
    site: Option<PlanningSiteField>,
    date: String,
    #[serde(default)]
    shifts: Option<ShiftsPayload>,
    /// Flat roster with a per-line shift, as sent by older endpoints
    #[serde(default)]
    agents: Vec<PlanningAgentPayload>,
    #[serde(default)]
    created_by: Option<FlexId>,
}

impl FromPayload for Planning {
    const ENTITY: &'static str = "planning";

    fn from_payload(value: Value) -> Result<Self> {
        let obj = expect_object(&value, Self::ENTITY)?;
        let created_at = optional_timestamp(obj, &CREATED_AT_KEYS, Self::ENTITY);
        let updated_at = optional_timestamp(obj, &UPDATED_AT_KEYS, Self::ENTITY);

        let raw: PlanningPayload = serde_json::from_value(value)?;
        let date = parse_calendar_date(&raw.date).ok_or_else(|| {
            Error::internal(format!("planning #{} has invalid date {:?}", raw.id.0, raw.date))
        })?;

        let (site, embedded_site_id) = match raw.site {
            Some(PlanningSiteField::Embedded(s)) => (
                Some(PlanningSite {
                    id: s.id.0,
                    name: s.name,
                    location: s.location,
                }),
                Some(s.id.0),
            ),
            Some(PlanningSiteField::Id(id)) => (None, Some(id.0)),
            None => (None, None),
        };
        let site_id = raw
            .site_id
            .map(|id| id.0)
            .or(embedded_site_id)
            .ok_or_else(|| Error::internal(format!("planning #{} has no site", raw.id.0)))?;

        let mut shifts = Shifts::default();
        let nested = raw.shifts.unwrap_or_default();
        for (shift, payload) in [
            (ShiftType::Morning, nested.morning),
            (ShiftType::Evening, nested.evening),
        ] {
            for line in payload.unwrap_or_default().agents {
                shifts.roster_mut(shift).push(line.into_agent(Some(shift))?);
            }
        }
        for line in raw.agents {
            let agent = line.into_agent(None)?;
            shifts.roster_mut(agent.shift).push(agent);
        }

        Ok(Planning {
            id: raw.id.0,
            site_id,
            site,
            date,
            shifts,
            created_by: raw.created_by.map(|id| id.0),
            created_at,
            updated_at,
        })
    }
}

// ============================================================================
// Candidature
// ============================================================================

#[derive(Debug, Deserialize)]
struct CandidaturePayload {
    id: FlexString,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<FlexString>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl FromPayload for Candidature {
    const ENTITY: &'static str = "candidature";

    fn from_payload(value: Value) -> Result<Self> {
        let obj = expect_object(&value, Self::ENTITY)?;
        let created_at = created_at_or_now(obj, Self::ENTITY);

        let raw: CandidaturePayload = serde_json::from_value(value)?;
        Ok(Candidature {
            id: raw.id.0,
            first_name: raw.first_name.unwrap_or_default(),
            last_name: raw.last_name.unwrap_or_default(),
            phone: text(raw.phone),
            email: raw.email,
            location: raw.location,
            status: raw.status.filter(|s| !s.trim().is_empty()),
            created_at,
        })
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RolesField {
    List(Vec<String>),
    Text(String),
}

impl RolesField {
    fn into_roles(self) -> Vec<String> {
        let roles = match self {
            RolesField::List(list) => list,
            RolesField::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        roles
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: FlexId,
    #[serde(default)]
    matricule: Option<FlexString>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<FlexString>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    roles: Option<RolesField>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    is_locked: Option<FlexBool>,
}

impl FromPayload for User {
    const ENTITY: &'static str = "user";

    fn from_payload(value: Value) -> Result<Self> {
        let obj = expect_object(&value, Self::ENTITY)?;
        let created_at = optional_timestamp(obj, &CREATED_AT_KEYS, Self::ENTITY);

        let raw: UserPayload = serde_json::from_value(value)?;
        let roles = raw
            .roles
            .or(raw.role.map(RolesField::Text))
            .map(RolesField::into_roles)
            .unwrap_or_default();

        Ok(User {
            id: raw.id.0,
            matricule: text(raw.matricule),
            first_name: raw.first_name.unwrap_or_default(),
            last_name: raw.last_name.unwrap_or_default(),
            email: raw.email,
            phone: text(raw.phone),
            location: raw.location,
            roles,
            is_locked: raw.is_locked.map(|b| b.0).unwrap_or(false),
            created_at,
        })
    }
}
