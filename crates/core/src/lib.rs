pub mod agent;
pub mod config;
pub mod config_loader;
pub mod market;
pub mod types;

pub use agent::{Agent, AgentContext};
pub use config::{
    AnalysisConfig, AppConfig, BacktestConfig, DataConfig, DebateConfig, LedgerConfig, LlmConfig,
    RoleConfig,
};
pub use config_loader::ConfigLoader;
pub use market::Market;
pub use types::{AgentOpinion, PricePoint, Recommendation, Verdict, VoteScores};
