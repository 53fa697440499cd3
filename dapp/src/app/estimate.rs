//! Output-token quote for a candidate input amount.

use tracing::{debug, warn};

use crate::app::state::StateHandle;
use crate::core::error::Result;
use crate::services::amount::Amount;
use crate::services::contracts::SaleContract;

#[derive(Clone)]
pub struct Estimator {
    sale: SaleContract,
    state: StateHandle,
}

impl Estimator {
    pub fn new(sale: SaleContract, state: StateHandle) -> Self {
        Self { sale, state }
    }

    /// Quote `amount_text` against `tokensForInput` and publish the result.
    ///
    /// Empty, zero and negative input is a no-op returning `Ok(None)`. Unparseable input is
    /// a `Validation` error. A failed quote returns a `ReadFailure`. In every case but success
    /// the previous estimate stays in place.
    pub async fn estimate(&self, amount_text: &str) -> Result<Option<Amount>> {
        let text = amount_text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some(magnitude) = text.strip_prefix('-') {
            magnitude.parse::<Amount>()?;
            return Ok(None);
        }
        let amount: Amount = text.parse()?;
        if amount.is_zero() {
            return Ok(None);
        }

        match self.sale.tokens_for_input(amount).await {
            Ok(output) => {
                debug!(input = %amount, output = %output, "Estimate updated");
                self.state
                    .update(|s| s.draft.estimated_output = Some(output));
                Ok(Some(output))
            }
            Err(e) => {
                let e = e.into_read_failure("tokensForInput");
                warn!(input = %amount, error = %e, "Estimate failed, keeping previous value");
                Err(e)
            }
        }
    }
}
