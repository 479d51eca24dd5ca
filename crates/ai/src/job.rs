use tillpoint_core::StoreId;

use crate::error::AiError;
use crate::insight::Insight;

/// A store-scoped inference unit.
///
/// Jobs consume snapshots via their `Input` type. This crate stays
/// storage-agnostic: inputs are provided by callers (infra services).
pub trait AiJob: Send + Sync {
    type Input: Send + Sync;
    type Output;

    /// The store this job belongs to.
    fn store_id(&self) -> StoreId;

    /// The input snapshot the job will run inference on.
    fn input(&self) -> &Self::Input;

    /// Execute inference. Must not mutate domain state.
    fn run(&self) -> Result<Self::Output, AiError>;

    /// Headline figure for a whole output.
    fn insight(&self, output: &Self::Output) -> Insight;
}
