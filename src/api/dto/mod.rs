pub mod cards;

pub use cards::{
    BoardResponse, ColumnResponse, CreateCardRequest, MoveStageRequest, PipelineResponse,
};
