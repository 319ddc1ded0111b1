mod compounding;
mod error;
mod growth;
mod sampler;
pub mod summary;
mod types;
mod withdrawal;

pub use compounding::{compound_step, compound_step_all};
pub use error::{SimError, SimResult};
pub use growth::run_growth_simulation;
pub use sampler::MatrixSampler;
pub use types::{
    BalanceTrajectory, DisplayUnit, GrowthParams, SimulationMatrix, SolvencyBand,
    WithdrawalParams,
};
pub use withdrawal::{WITHDRAWAL_NOISE_STDEV, run_withdrawal_simulation};
