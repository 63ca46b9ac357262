pub mod card;
pub mod error;
pub mod mutation;
pub mod stage;

pub use card::{Card, CardDetails, CardId, CardRow, StageTransition};
pub use error::PipelineError;
pub use mutation::MutationResponse;
pub use stage::{
    columns, Column, LeadStage, OpportunityStage, Pipeline, PipelineStage, StageInfo,
};
