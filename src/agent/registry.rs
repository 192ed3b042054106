//! Static catalog of the investigation agents.

use crate::models::AgentId;

/// Display metadata for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDefinition {
    pub id: AgentId,
    pub name: &'static str,
    pub title: &'static str,
}

/// Every agent in registry order; the adjudicator comes last.
static AGENTS: [AgentDefinition; 5] = [
    AgentDefinition {
        id: AgentId::Accountant,
        name: "accountant",
        title: "The Forensic Accountant",
    },
    AgentDefinition {
        id: AgentId::Legal,
        name: "legal advisor",
        title: "The Legal Hunter",
    },
    AgentDefinition {
        id: AgentId::Skeptic,
        name: "skeptic",
        title: "The Competitive Skeptic",
    },
    AgentDefinition {
        id: AgentId::Bloodhound,
        name: "bloodhound",
        title: "The Bloodhound",
    },
    AgentDefinition {
        id: AgentId::Justice,
        name: "chief justice",
        title: "The Chief Justice",
    },
];

static PRIMARY_AGENTS: [AgentId; 4] = [
    AgentId::Accountant,
    AgentId::Legal,
    AgentId::Skeptic,
    AgentId::Bloodhound,
];

/// Primary agents in run order.
pub fn primary_agents() -> &'static [AgentId] {
    &PRIMARY_AGENTS
}

/// The agent that adjudicates over all primary results.
pub fn adjudicator() -> AgentId {
    AgentId::Justice
}

/// All agent definitions in display order.
#[allow(dead_code)] // Lookup by id goes through `definition`
pub fn definitions() -> &'static [AgentDefinition] {
    &AGENTS
}

/// Display metadata for `id`.
pub fn definition(id: AgentId) -> &'static AgentDefinition {
    // AGENTS is indexed in AgentId declaration order.
    &AGENTS[id as usize]
}
