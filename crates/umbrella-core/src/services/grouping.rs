//! Agents-by-site grouping
//!
//! Partitions a flat agent list into one group per site, ordered by site
//! name the way a French reader expects (case and accents ignored).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Agent, SiteRef};

/// Agents of one site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteGroup {
    pub site: SiteRef,
    pub agents: Vec<Agent>,
    pub agents_count: usize,
}

/// Group agents by their site id, keeping input order inside each group.
pub fn group_agents_by_site(agents: &[Agent]) -> Vec<SiteGroup> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<SiteGroup> = Vec::new();

    for agent in agents {
        let slot = *index.entry(agent.site.id).or_insert_with(|| {
            groups.push(SiteGroup {
                site: agent.site.clone(),
                agents: Vec::new(),
                agents_count: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        // A bare id reference may come first; adopt the richer summary later
        if group.site.name.is_empty() && !agent.site.name.is_empty() {
            group.site = agent.site.clone();
        }
        group.agents.push(agent.clone());
        group.agents_count = group.agents.len();
    }

    groups.sort_by(|a, b| compare_site_names(&a.site, &b.site));
    groups
}

fn compare_site_names(a: &SiteRef, b: &SiteRef) -> Ordering {
    collation_key(&a.name)
        .cmp(&collation_key(&b.name))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Case- and accent-insensitive sort key for Latin text
pub fn collation_key(s: &str) -> String {
    s.trim().chars().flat_map(fold_char).collect()
}

fn fold_char(c: char) -> Vec<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        'œ' | 'Œ' => return vec!['o', 'e'],
        'æ' | 'Æ' => return vec!['a', 'e'],
        other => return other.to_lowercase().collect(),
    };
    vec![base]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn site(id: i64, name: &str) -> SiteRef {
        SiteRef {
            id,
            name: name.to_string(),
            location: "Douala".to_string(),
            responsable: None,
        }
    }

    fn agent(id: i64, site: SiteRef) -> Agent {
        Agent {
            id,
            matricule: format!("UMB-{}", id),
            first_name: "Agent".to_string(),
            last_name: id.to_string(),
            phone: None,
            email: None,
            location: None,
            status: true,
            site,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(group_agents_by_site(&[]).is_empty());
    }

    #[test]
    fn test_every_agent_lands_in_exactly_one_group() {
        let b = site(2, "Bravo");
        let a = site(1, "alpha");
        let agents = vec![
            agent(1, b.clone()),
            agent(2, a.clone()),
            agent(3, b.clone()),
            agent(4, a.clone()),
            agent(5, b.clone()),
        ];

        let groups = group_agents_by_site(&agents);

        assert_eq!(groups.len(), 2);
        let total: usize = groups.iter().map(|g| g.agents.len()).sum();
        assert_eq!(total, agents.len());
        for g in &groups {
            assert_eq!(g.agents_count, g.agents.len());
            assert!(g.agents.iter().all(|a| a.site.id == g.site.id));
        }
        // input order kept inside a group
        let bravo: Vec<i64> = groups[1].agents.iter().map(|a| a.id).collect();
        assert_eq!(bravo, vec![1, 3, 5]);
    }

    #[test]
    fn test_groups_sorted_by_name_ignoring_case_and_accents() {
        let agents = vec![
            agent(1, site(1, "Zone portuaire")),
            agent(2, site(2, "Étoile")),
            agent(3, site(3, "entrepôt")),
            agent(4, site(4, "Bonabéri")),
        ];

        let names: Vec<String> = group_agents_by_site(&agents)
            .into_iter()
            .map(|g| g.site.name)
            .collect();

        assert_eq!(names, vec!["Bonabéri", "entrepôt", "Étoile", "Zone portuaire"]);
    }

    #[test]
    fn test_bare_site_reference_is_enriched() {
        let agents = vec![agent(1, SiteRef::from_id(7)), agent(2, site(7, "Akwa"))];
        let groups = group_agents_by_site(&agents);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].site.name, "Akwa");
        assert_eq!(groups[0].agents_count, 2);
    }

    #[test]
    fn test_collation_key() {
        assert_eq!(collation_key(" Œuvre Élevée "), "oeuvre elevee");
    }
}
