//! Positions module - position records, partial updates and the merge engine.

mod merge_engine;
mod positions_model;

#[cfg(test)]
mod merge_engine_tests;

pub use merge_engine::{merge_position, merge_positions};
pub use positions_model::{
    Aggregation, AggregationPatch, AverageCost, AverageCostPatch, AverageCostSource, DayChange,
    DayChangePatch, Performance, PerformancePatch, PositionPatch, PositionRecord,
};
