use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The two sales pipelines tracked on kanban boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    Leads,
    Opportunities,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Leads => "leads",
            Pipeline::Opportunities => "opportunities",
        }
    }

    /// Singular display noun used in notifications ("Lead moved to ...").
    pub fn noun(&self) -> &'static str {
        match self {
            Pipeline::Leads => "Lead",
            Pipeline::Opportunities => "Opportunity",
        }
    }

    pub fn all() -> &'static [Pipeline] {
        &[Pipeline::Leads, Pipeline::Opportunities]
    }

    /// Looks up a stage id of this pipeline.
    pub fn stage_info(&self, stage: &str) -> Result<StageInfo, String> {
        match self {
            Pipeline::Leads => stage.parse::<LeadStage>().map(|s| StageInfo::of(&s)),
            Pipeline::Opportunities => stage.parse::<OpportunityStage>().map(|s| StageInfo::of(&s)),
        }
    }

    /// All stages of this pipeline in column order.
    pub fn stages(&self) -> Vec<StageInfo> {
        match self {
            Pipeline::Leads => LeadStage::all().iter().map(StageInfo::of).collect(),
            Pipeline::Opportunities => OpportunityStage::all().iter().map(StageInfo::of).collect(),
        }
    }

    pub fn first_stage(&self) -> StageInfo {
        match self {
            Pipeline::Leads => StageInfo::of(&LeadStage::first()),
            Pipeline::Opportunities => StageInfo::of(&OpportunityStage::first()),
        }
    }
}

/// Untyped view of a stage, for code that only knows the pipeline at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub score_weight: i64,
}

impl StageInfo {
    fn of<S: PipelineStage>(stage: &S) -> Self {
        Self {
            id: stage.as_str(),
            title: stage.title(),
            score_weight: stage.score_weight(),
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Pipeline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leads" => Ok(Pipeline::Leads),
            "opportunities" => Ok(Pipeline::Opportunities),
            _ => Err(format!("Invalid pipeline: {}", s)),
        }
    }
}

/// A fixed, ordered set of stages making up one pipeline.
///
/// The order of [`PipelineStage::all`] is the column order on the board.
pub trait PipelineStage:
    Copy
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = String>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const PIPELINE: Pipeline;

    fn all() -> &'static [Self];

    fn as_str(&self) -> &'static str;

    fn title(&self) -> &'static str;

    /// Weight used for the server-side derived score of a card in this stage.
    fn score_weight(&self) -> i64;

    fn first() -> Self {
        Self::all()[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    New,
    Contacted,
    Qualified,
    Unqualified,
    Converted,
}

impl PipelineStage for LeadStage {
    const PIPELINE: Pipeline = Pipeline::Leads;

    fn all() -> &'static [Self] {
        &[
            LeadStage::New,
            LeadStage::Contacted,
            LeadStage::Qualified,
            LeadStage::Unqualified,
            LeadStage::Converted,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            LeadStage::New => "new",
            LeadStage::Contacted => "contacted",
            LeadStage::Qualified => "qualified",
            LeadStage::Unqualified => "unqualified",
            LeadStage::Converted => "converted",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            LeadStage::New => "New",
            LeadStage::Contacted => "Contacted",
            LeadStage::Qualified => "Qualified",
            LeadStage::Unqualified => "Unqualified",
            LeadStage::Converted => "Converted",
        }
    }

    fn score_weight(&self) -> i64 {
        match self {
            LeadStage::New => 10,
            LeadStage::Contacted => 25,
            LeadStage::Qualified => 60,
            LeadStage::Unqualified => 0,
            LeadStage::Converted => 100,
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeadStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStage::New),
            "contacted" => Ok(LeadStage::Contacted),
            "qualified" => Ok(LeadStage::Qualified),
            "unqualified" => Ok(LeadStage::Unqualified),
            "converted" => Ok(LeadStage::Converted),
            _ => Err(format!("Invalid lead stage: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStage {
    Discovery,
    DemoScheduled,
    ProposalSent,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl PipelineStage for OpportunityStage {
    const PIPELINE: Pipeline = Pipeline::Opportunities;

    fn all() -> &'static [Self] {
        &[
            OpportunityStage::Discovery,
            OpportunityStage::DemoScheduled,
            OpportunityStage::ProposalSent,
            OpportunityStage::Negotiation,
            OpportunityStage::ClosedWon,
            OpportunityStage::ClosedLost,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            OpportunityStage::Discovery => "discovery",
            OpportunityStage::DemoScheduled => "demo_scheduled",
            OpportunityStage::ProposalSent => "proposal_sent",
            OpportunityStage::Negotiation => "negotiation",
            OpportunityStage::ClosedWon => "closed_won",
            OpportunityStage::ClosedLost => "closed_lost",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            OpportunityStage::Discovery => "Discovery",
            OpportunityStage::DemoScheduled => "Demo Scheduled",
            OpportunityStage::ProposalSent => "Proposal Sent",
            OpportunityStage::Negotiation => "Negotiation",
            OpportunityStage::ClosedWon => "Closed Won",
            OpportunityStage::ClosedLost => "Closed Lost",
        }
    }

    fn score_weight(&self) -> i64 {
        match self {
            OpportunityStage::Discovery => 10,
            OpportunityStage::DemoScheduled => 30,
            OpportunityStage::ProposalSent => 50,
            OpportunityStage::Negotiation => 75,
            OpportunityStage::ClosedWon => 100,
            OpportunityStage::ClosedLost => 0,
        }
    }
}

impl fmt::Display for OpportunityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpportunityStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(OpportunityStage::Discovery),
            "demo_scheduled" => Ok(OpportunityStage::DemoScheduled),
            "proposal_sent" => Ok(OpportunityStage::ProposalSent),
            "negotiation" => Ok(OpportunityStage::Negotiation),
            "closed_won" => Ok(OpportunityStage::ClosedWon),
            "closed_lost" => Ok(OpportunityStage::ClosedLost),
            _ => Err(format!("Invalid opportunity stage: {}", s)),
        }
    }
}

/// One board column. Columns are configuration and never change during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column<S> {
    pub stage: S,
    pub title: &'static str,
}

pub fn columns<S: PipelineStage>() -> Vec<Column<S>> {
    S::all()
        .iter()
        .map(|stage| Column {
            stage: *stage,
            title: stage.title(),
        })
        .collect()
}
