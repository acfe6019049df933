//! Roster of council agents and the optional debate panel.
//!
//! Registration order matters: opinions come back from a round in the
//! order the agents were registered, so the roster is a vector, not a
//! map.

use crate::roles::LlmAgent;
use std::fmt;
use std::sync::Arc;
use stock_council_core::{Agent, AnalysisConfig, DebateConfig};
use stock_council_llm::LlmClient;
use tracing::debug;

/// Ordered collection of voting agents.
#[derive(Default)]
pub struct AgentRoster {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRoster {
    #[must_use]
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Registers an agent. A duplicate role replaces the earlier agent
    /// in place, keeping its position in the order.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let role = agent.role().to_string();
        match self.agents.iter().position(|a| a.role() == role) {
            Some(index) => {
                self.agents[index] = agent;
                debug!(role = %role, "replaced registered agent");
            }
            None => {
                self.agents.push(agent);
                debug!(role = %role, "registered agent");
            }
        }
    }

    /// Looks up an agent by role.
    #[must_use]
    pub fn get(&self, role: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.role() == role)
    }

    /// Role names in registration order.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.role()).collect()
    }

    /// Agents in registration order.
    #[must_use]
    pub fn agents(&self) -> &[Arc<dyn Agent>] {
        &self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl fmt::Debug for AgentRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRoster")
            .field("roles", &self.roles())
            .finish()
    }
}

/// The three debate-round agents. The judge is built at weight zero;
/// it influences the vote only through its reweight directives.
pub struct DebatePanel {
    pub bull: Arc<dyn Agent>,
    pub bear: Arc<dyn Agent>,
    pub judge: Arc<dyn Agent>,
}

impl DebatePanel {
    #[must_use]
    pub fn new(bull: Arc<dyn Agent>, bear: Arc<dyn Agent>, judge: Arc<dyn Agent>) -> Self {
        Self { bull, bear, judge }
    }
}

impl fmt::Debug for DebatePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebatePanel")
            .field("bull", &self.bull.role())
            .field("bear", &self.bear.role())
            .field("judge", &self.judge.role())
            .finish()
    }
}

/// Builds the configured analyst roster, skipping disabled roles.
#[must_use]
pub fn build_roster(cfg: &AnalysisConfig, client: &Arc<dyn LlmClient>) -> AgentRoster {
    let mut roster = AgentRoster::new();
    for role in cfg.roles.iter().filter(|r| r.enabled) {
        roster.register(Arc::new(LlmAgent::new(
            &role.role,
            role.weight,
            Arc::clone(client),
        )));
    }
    roster
}

/// Builds the bull, bear, and judge agents for the debate round.
#[must_use]
pub fn build_debate_panel(cfg: &DebateConfig, client: &Arc<dyn LlmClient>) -> DebatePanel {
    DebatePanel::new(
        Arc::new(LlmAgent::new("bull", cfg.bull_weight, Arc::clone(client))),
        Arc::new(LlmAgent::new("bear", cfg.bear_weight, Arc::clone(client))),
        Arc::new(LlmAgent::new("judge", 0.0, Arc::clone(client))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use stock_council_core::{AgentContext, AgentOpinion, RoleConfig, Verdict};
    use stock_council_llm::{CompletionRequest, Result as LlmResult};

    struct Fixed {
        role: &'static str,
        weight: f64,
    }

    #[async_trait]
    impl Agent for Fixed {
        fn role(&self) -> &str {
            self.role
        }

        fn weight(&self) -> f64 {
            self.weight
        }

        async fn evaluate(&self, _ctx: &AgentContext) -> Result<AgentOpinion> {
            AgentOpinion::new(self.role, Verdict::Hold, 0.5, self.weight)
        }
    }

    fn fixed(role: &'static str, weight: f64) -> Arc<dyn Agent> {
        Arc::new(Fixed { role, weight })
    }

    struct SilentClient;

    #[async_trait]
    impl LlmClient for SilentClient {
        async fn complete(&self, _request: &CompletionRequest) -> LlmResult<String> {
            Ok("VERDICT: HOLD\nCONFIDENCE: 0.5".to_string())
        }

        fn model(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut roster = AgentRoster::new();
        roster.register(fixed("fundamental", 1.0));
        roster.register(fixed("technical", 1.0));
        roster.register(fixed("risk", 0.6));
        assert_eq!(roster.roles(), vec!["fundamental", "technical", "risk"]);
    }

    #[test]
    fn duplicate_role_replaces_in_place() {
        let mut roster = AgentRoster::new();
        roster.register(fixed("fundamental", 1.0));
        roster.register(fixed("technical", 1.0));
        roster.register(fixed("fundamental", 2.0));
        assert_eq!(roster.roles(), vec!["fundamental", "technical"]);
        let replaced = roster.get("fundamental").unwrap();
        assert!((replaced.weight() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn get_unknown_role_is_none() {
        let roster = AgentRoster::new();
        assert!(roster.get("fundamental").is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn build_roster_skips_disabled_roles() {
        let cfg = AnalysisConfig {
            roles: vec![
                RoleConfig::new("fundamental", 1.0),
                RoleConfig {
                    role: "news".to_string(),
                    weight: 0.8,
                    enabled: false,
                },
                RoleConfig::new("risk", 0.6),
            ],
            ..AnalysisConfig::default()
        };
        let client: Arc<dyn LlmClient> = Arc::new(SilentClient);
        let roster = build_roster(&cfg, &client);
        assert_eq!(roster.roles(), vec!["fundamental", "risk"]);
    }

    #[test]
    fn debate_panel_judge_never_votes() {
        let client: Arc<dyn LlmClient> = Arc::new(SilentClient);
        let panel = build_debate_panel(&DebateConfig::default(), &client);
        assert_eq!(panel.judge.role(), "judge");
        assert!((panel.judge.weight() - 0.0).abs() < f64::EPSILON);
        assert!((panel.bull.weight() - 0.7).abs() < f64::EPSILON);
    }
}
