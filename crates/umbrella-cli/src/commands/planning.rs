//! Planning commands
//!
//! Roster lines are given on the command line as
//! `AGENT_ID[:STATUS[:REMPLACANT_ID|REASON]]`, e.g. `12`, `12:ABSENT:Malade`
//! or `12:REPLACEMENT:15`.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::{
    AgentFieldUpdate, AgentSummary, AttendanceStatus, Planning, PlanningAgent, PlanningComposer,
    ShiftType,
};

use super::{parse_date, truncate, Context};
use crate::output::{or_dash, note, print_list, print_record, success, OutputFormat};

#[derive(Subcommand)]
pub enum PlanningAction {
    /// List plannings (at most one filter)
    List {
        /// Only plannings of this site
        #[arg(short, long, conflicts_with_all = ["agent", "date"])]
        site: Option<i64>,

        /// Only plannings involving this agent
        #[arg(short, long, conflicts_with = "date")]
        agent: Option<i64>,

        /// Only plannings of this date (YYYY-MM-DD, today, tomorrow)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show a planning with both rosters
    Show {
        /// Planning ID
        id: i64,
    },

    /// Create a planning for one site and day
    Create {
        /// Site ID
        #[arg(short, long)]
        site: i64,

        /// Date (YYYY-MM-DD, today, tomorrow)
        #[arg(short, long)]
        date: String,

        /// Morning roster line, repeatable: AGENT_ID[:STATUS[:REMPLACANT_ID|REASON]]
        #[arg(short, long = "morning")]
        morning: Vec<String>,

        /// Evening roster line, repeatable: AGENT_ID[:STATUS[:REMPLACANT_ID|REASON]]
        #[arg(short, long = "evening")]
        evening: Vec<String>,
    },

    /// Update a planning; a shift given on the command line replaces that whole roster
    Update {
        /// Planning ID
        id: i64,

        /// New date (YYYY-MM-DD, today, tomorrow)
        #[arg(short, long)]
        date: Option<String>,

        /// Morning roster line, repeatable: AGENT_ID[:STATUS[:REMPLACANT_ID|REASON]]
        #[arg(short, long = "morning")]
        morning: Vec<String>,

        /// Evening roster line, repeatable: AGENT_ID[:STATUS[:REMPLACANT_ID|REASON]]
        #[arg(short, long = "evening")]
        evening: Vec<String>,
    },

    /// Delete a planning
    Delete {
        /// Planning ID
        id: i64,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Planning row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct PlanningRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Site")]
    pub site: String,
    #[tabled(rename = "Matin")]
    pub morning: usize,
    #[tabled(rename = "Soir")]
    pub evening: usize,
}

impl From<&Planning> for PlanningRow {
    fn from(p: &Planning) -> Self {
        Self {
            id: p.id,
            date: p.date.format("%Y-%m-%d").to_string(),
            site: match p.site_name() {
                Some(name) => truncate(name, 30),
                None => format!("#{}", p.site_id),
            },
            morning: p.shifts.morning.agents.len(),
            evening: p.shifts.evening.agents.len(),
        }
    }
}

/// Roster line row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct PlanningLineRow {
    #[tabled(rename = "Shift")]
    pub shift: String,
    #[tabled(rename = "Agent")]
    pub agent: String,
    #[tabled(rename = "Matricule")]
    pub matricule: String,
    #[tabled(rename = "Statut")]
    pub status: String,
    #[tabled(rename = "Motif")]
    pub reason: String,
    #[tabled(rename = "Remplaçant")]
    pub remplacant: String,
}

fn summary_name(summary: Option<&AgentSummary>, id: i64) -> String {
    match summary {
        Some(s) => format!("{} {}", s.first_name, s.last_name).trim().to_string(),
        None => format!("#{}", id),
    }
}

impl From<&PlanningAgent> for PlanningLineRow {
    fn from(line: &PlanningAgent) -> Self {
        Self {
            shift: line.shift.to_string(),
            agent: summary_name(line.agent.as_ref(), line.agent_id),
            matricule: or_dash(line.agent.as_ref().map(|a| a.matricule.as_str())),
            status: line.status.to_string(),
            reason: or_dash(line.reason.as_deref()),
            remplacant: match line.remplacant_id {
                Some(id) => summary_name(line.remplacant.as_ref(), id),
                None => "-".to_string(),
            },
        }
    }
}

/// One roster line parsed from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLine {
    pub agent_id: i64,
    pub status: AttendanceStatus,
    pub reason: Option<String>,
    pub remplacant_id: Option<i64>,
}

impl FromStr for RosterLine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let agent_id = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("Empty roster line"))?
            .parse::<i64>()
            .map_err(|_| anyhow!("Invalid agent id in '{}'", s))?;

        let status = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => AttendanceStatus::from_str(raw).map_err(|e| anyhow!(e))?,
            None => AttendanceStatus::Worked,
        };

        let extra = parts.next().map(str::trim).filter(|p| !p.is_empty());
        let (reason, remplacant_id) = match (status, extra) {
            (AttendanceStatus::Replacement, Some(raw)) => {
                let id = raw
                    .parse::<i64>()
                    .map_err(|_| anyhow!("Invalid replacement agent id in '{}'", s))?;
                (None, Some(id))
            }
            (_, extra) => (extra.map(str::to_string), None),
        };

        Ok(Self {
            agent_id,
            status,
            reason,
            remplacant_id,
        })
    }
}

pub async fn execute(ctx: &Context, action: PlanningAction) -> Result<()> {
    match action {
        PlanningAction::List { site, agent, date } => list_plannings(ctx, site, agent, date).await,
        PlanningAction::Show { id } => show_planning(ctx, id).await,
        PlanningAction::Create {
            site,
            date,
            morning,
            evening,
        } => create_planning(ctx, site, &date, morning, evening).await,
        PlanningAction::Update {
            id,
            date,
            morning,
            evening,
        } => update_planning(ctx, id, date.as_deref(), morning, evening).await,
        PlanningAction::Delete { id, force } => delete_planning(ctx, id, force).await,
    }
}

async fn list_plannings(
    ctx: &Context,
    site: Option<i64>,
    agent: Option<i64>,
    date: Option<String>,
) -> Result<()> {
    ctx.require_user().await?;
    let plannings = match (site, agent, date) {
        (Some(site_id), _, _) => ctx.services.plannings.by_site(site_id).await?,
        (None, Some(agent_id), _) => ctx.services.plannings.by_agent(agent_id).await?,
        (None, None, Some(date)) => ctx.services.plannings.by_date(parse_date(&date)?).await?,
        (None, None, None) => {
            ctx.services.plannings.fetch_all().await?;
            ctx.services.plannings.items().await
        }
    };

    let rows: Vec<PlanningRow> = plannings.iter().map(PlanningRow::from).collect();
    print_list(&rows, ctx.format)
}

async fn show_planning(ctx: &Context, id: i64) -> Result<()> {
    ctx.require_user().await?;
    let planning = ctx.services.plannings.fetch_one(id).await?;

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&planning)?);
        return Ok(());
    }

    print_record(&PlanningRow::from(&planning), ctx.format)?;
    let lines: Vec<PlanningLineRow> = ShiftType::ALL
        .iter()
        .flat_map(|shift| planning.shifts.roster(*shift))
        .map(PlanningLineRow::from)
        .collect();
    print_list(&lines, ctx.format)
}

/// Append parsed roster lines to one shift of the draft
fn fill_shift(
    composer: &mut PlanningComposer,
    shift: ShiftType,
    raw_lines: Vec<String>,
) -> Result<()> {
    let site_id = composer
        .site_id()
        .ok_or_else(|| anyhow!("Aucun site sélectionné"))?;

    for raw in raw_lines {
        let line: RosterLine = raw.parse()?;
        if !composer.site_agents().iter().any(|a| a.id == line.agent_id) {
            anyhow::bail!("L'agent #{} n'appartient pas au site #{}", line.agent_id, site_id);
        }

        let index = composer
            .add_agent_to_shift(shift)
            .map_err(umbrella_core::Error::from)?;
        let edits = [
            AgentFieldUpdate::Agent(line.agent_id),
            AgentFieldUpdate::Status(line.status),
            AgentFieldUpdate::Reason(line.reason),
            AgentFieldUpdate::Remplacant(line.remplacant_id),
        ];
        for edit in edits {
            composer
                .update_agent_field(shift, index, edit)
                .map_err(umbrella_core::Error::from)?;
        }
    }
    Ok(())
}

fn clear_shift(composer: &mut PlanningComposer, shift: ShiftType) -> Result<()> {
    while !composer.roster(shift).is_empty() {
        composer
            .remove_agent_from_shift(shift, 0)
            .map_err(umbrella_core::Error::from)?;
    }
    Ok(())
}

async fn create_planning(
    ctx: &Context,
    site_id: i64,
    date: &str,
    morning: Vec<String>,
    evening: Vec<String>,
) -> Result<()> {
    let user = ctx.require_user().await?;
    let date = parse_date(date)?;

    ctx.services.agents.fetch_all().await?;
    let mut composer = ctx.services.composer().await;
    composer.select_site(site_id);
    composer.set_date(date);

    fill_shift(&mut composer, ShiftType::Morning, morning)?;
    fill_shift(&mut composer, ShiftType::Evening, evening)?;

    let payload = composer.build(user.id).map_err(umbrella_core::Error::from)?;
    let planning = ctx.services.plannings.create(&payload).await?;
    success(
        &format!("Planning #{} créé pour le {}", planning.id, planning.date),
        ctx.quiet,
    );
    if !ctx.quiet {
        print_record(&PlanningRow::from(&planning), ctx.format)?;
    }
    Ok(())
}

async fn update_planning(
    ctx: &Context,
    id: i64,
    date: Option<&str>,
    morning: Vec<String>,
    evening: Vec<String>,
) -> Result<()> {
    if date.is_none() && morning.is_empty() && evening.is_empty() {
        anyhow::bail!("Aucune modification fournie");
    }
    let date = date.map(parse_date).transpose()?;
    ctx.require_user().await?;

    let planning = ctx.services.plannings.fetch_one(id).await?;
    ctx.services.agents.fetch_all().await?;
    let mut composer =
        PlanningComposer::from_planning(ctx.services.agents.items().await, &planning);
    if let Some(date) = date {
        composer.set_date(date);
    }

    // Empty every replaced roster before refilling; agents may move between shifts
    let replaced: Vec<(ShiftType, Vec<String>)> =
        [(ShiftType::Morning, morning), (ShiftType::Evening, evening)]
            .into_iter()
            .filter(|(_, lines)| !lines.is_empty())
            .collect();
    for (shift, _) in &replaced {
        clear_shift(&mut composer, *shift)?;
    }
    for (shift, lines) in replaced {
        fill_shift(&mut composer, shift, lines)?;
    }

    let patch = composer.into_update().map_err(umbrella_core::Error::from)?;
    let planning = ctx.services.plannings.update(id, &patch).await?;
    success(
        &format!("Planning #{} mis à jour ({})", planning.id, planning.date),
        ctx.quiet,
    );
    if !ctx.quiet {
        print_record(&PlanningRow::from(&planning), ctx.format)?;
    }
    Ok(())
}

async fn delete_planning(ctx: &Context, id: i64, force: bool) -> Result<()> {
    ctx.require_user().await?;
    if !force {
        let planning = ctx.services.plannings.fetch_one(id).await?;
        note("Planning à supprimer :", ctx.quiet);
        print_record(&PlanningRow::from(&planning), ctx.format)?;
        note("\nUse --force to confirm deletion", ctx.quiet);
        return Ok(());
    }

    ctx.services.plannings.delete(id).await?;
    success(&format!("Planning #{} supprimé", id), ctx.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use umbrella_core::models::ShiftRoster;
    use umbrella_core::{Agent, Shifts, SiteRef};

    fn agent(id: i64, site_id: i64) -> Agent {
        Agent {
            id,
            matricule: format!("UIS-{:03}", id),
            first_name: "Agent".to_string(),
            last_name: format!("{}", id),
            phone: None,
            email: None,
            location: None,
            status: true,
            site: SiteRef {
                id: site_id,
                name: format!("Site {}", site_id),
                location: String::new(),
                responsable: None,
            },
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn line(agent_id: i64, shift: ShiftType) -> PlanningAgent {
        PlanningAgent {
            agent_id,
            agent: None,
            shift,
            status: AttendanceStatus::Worked,
            reason: None,
            remplacant_id: None,
            remplacant: None,
        }
    }

    fn stored_planning() -> Planning {
        Planning {
            id: 40,
            site_id: 3,
            site: None,
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            shifts: Shifts {
                morning: ShiftRoster {
                    agents: vec![line(1, ShiftType::Morning)],
                },
                evening: ShiftRoster {
                    agents: vec![line(2, ShiftType::Evening)],
                },
            },
            created_by: Some(1),
            created_at: None,
            updated_at: None,
        }
    }

    fn roster_ids(composer: &PlanningComposer, shift: ShiftType) -> Vec<i64> {
        composer.roster(shift).iter().map(|l| l.agent_id).collect()
    }

    #[test]
    fn test_fill_shift_applies_line_fields() {
        let mut composer = PlanningComposer::new(vec![agent(1, 3), agent(2, 3), agent(5, 3)]);
        composer.select_site(3);
        fill_shift(
            &mut composer,
            ShiftType::Evening,
            vec!["5".to_string(), "1:ABSENT:Malade".to_string()],
        )
        .unwrap();
        let roster = composer.roster(ShiftType::Evening);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].agent_id, 5);
        assert_eq!(roster[1].agent_id, 1);
        assert_eq!(roster[1].status, AttendanceStatus::Absent);
        assert_eq!(roster[1].reason.as_deref(), Some("Malade"));
    }

    #[test]
    fn test_fill_shift_rejects_agent_of_other_site() {
        let mut composer = PlanningComposer::new(vec![agent(1, 3), agent(9, 4)]);
        composer.select_site(3);
        let err = fill_shift(&mut composer, ShiftType::Morning, vec!["9".to_string()]).unwrap_err();
        assert!(err.to_string().contains("n'appartient pas au site #3"));
        assert!(composer.roster(ShiftType::Morning).is_empty());
    }

    #[test]
    fn test_replaced_rosters_allow_swapping_shifts() {
        let mut composer =
            PlanningComposer::from_planning(vec![agent(1, 3), agent(2, 3)], &stored_planning());
        clear_shift(&mut composer, ShiftType::Morning).unwrap();
        clear_shift(&mut composer, ShiftType::Evening).unwrap();
        fill_shift(&mut composer, ShiftType::Morning, vec!["2".to_string()]).unwrap();
        fill_shift(&mut composer, ShiftType::Evening, vec!["1".to_string()]).unwrap();

        assert_eq!(roster_ids(&composer, ShiftType::Morning), vec![2]);
        assert_eq!(roster_ids(&composer, ShiftType::Evening), vec![1]);
        let patch = composer.into_update().unwrap();
        assert_eq!(patch.site_id, Some(3));
        assert_eq!(patch.shifts.unwrap().morning.agents[0].agent_id, 2);
    }

    #[test]
    fn test_untouched_shift_is_kept_from_stored_planning() {
        let mut composer = PlanningComposer::from_planning(
            vec![agent(1, 3), agent(2, 3), agent(6, 3)],
            &stored_planning(),
        );
        clear_shift(&mut composer, ShiftType::Morning).unwrap();
        fill_shift(&mut composer, ShiftType::Morning, vec!["6".to_string()]).unwrap();
        assert_eq!(roster_ids(&composer, ShiftType::Morning), vec![6]);
        assert_eq!(roster_ids(&composer, ShiftType::Evening), vec![2]);
    }

    #[test]
    fn test_roster_line_defaults_to_worked() {
        let line: RosterLine = "12".parse().unwrap();
        assert_eq!(
            line,
            RosterLine {
                agent_id: 12,
                status: AttendanceStatus::Worked,
                reason: None,
                remplacant_id: None,
            }
        );
    }

    #[test]
    fn test_roster_line_absent_keeps_reason_with_colons() {
        let line: RosterLine = "7:absent:Malade: certificat fourni".parse().unwrap();
        assert_eq!(line.status, AttendanceStatus::Absent);
        assert_eq!(line.reason.as_deref(), Some("Malade: certificat fourni"));
        assert_eq!(line.remplacant_id, None);
    }

    #[test]
    fn test_roster_line_replacement_reads_remplacant() {
        let line: RosterLine = "7:REPLACEMENT:15".parse().unwrap();
        assert_eq!(line.status, AttendanceStatus::Replacement);
        assert_eq!(line.remplacant_id, Some(15));
        assert_eq!(line.reason, None);

        let line: RosterLine = "7:REPLACEMENT".parse().unwrap();
        assert_eq!(line.remplacant_id, None);
    }

    #[test]
    fn test_roster_line_rejects_garbage() {
        assert!("".parse::<RosterLine>().is_err());
        assert!("abc".parse::<RosterLine>().is_err());
        assert!("7:LATE".parse::<RosterLine>().is_err());
        assert!("7:REPLACEMENT:someone".parse::<RosterLine>().is_err());
    }

    #[test]
    fn test_line_row_falls_back_to_ids() {
        let line = PlanningAgent {
            agent_id: 4,
            agent: None,
            shift: ShiftType::Evening,
            status: AttendanceStatus::Replacement,
            reason: None,
            remplacant_id: Some(9),
            remplacant: Some(AgentSummary {
                first_name: "Awa".to_string(),
                last_name: "Ndiaye".to_string(),
                matricule: "UIS-009".to_string(),
            }),
        };
        let row = PlanningLineRow::from(&line);
        assert_eq!(row.agent, "#4");
        assert_eq!(row.matricule, "-");
        assert_eq!(row.shift, "EVENING");
        assert_eq!(row.remplacant, "Awa Ndiaye");
    }
}
