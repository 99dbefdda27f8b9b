use crate::{metric::MetricError, shape::ShapeError, stack::StackError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `shape` module")]
    Shape(#[from] ShapeError),
    #[error("Error in the `metric` module")]
    Metric(#[from] MetricError),
    #[error("Error in the `stack` module")]
    Stack(#[from] StackError),
}
