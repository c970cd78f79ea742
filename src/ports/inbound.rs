//! Inbound port. The binary calls into the application.

use crate::domain::{DomainError, SweepConfig};
use crate::usecases::SweepReport;

/// Input port: run one retention sweep.
#[async_trait::async_trait]
pub trait SweepPort: Send + Sync {
    /// Sweep every configured channel. Resolves on completion, fails on the
    /// first fatal error; channels not reached yet stay untouched.
    async fn sweep(&self, config: &SweepConfig) -> Result<SweepReport, DomainError>;
}
