//! Epoch validation for usage reports.
//!
//! Epochs are strictly increasing and non-zero per entity. The validator runs
//! against the record as it stands *including* earlier items of the same
//! batch, which is what rejects duplicate epochs within one batch.

use tally_primitives::{EntityId, Epoch};

use crate::{LedgerError, UsageRecord};

/// Check that `epoch` may be reported for `entity` given its current record.
pub fn validate_epoch(
    entity: EntityId,
    record: &UsageRecord,
    epoch: Epoch,
) -> Result<(), LedgerError> {
    let max_reported = record.max_reported_epoch();
    if epoch == 0 || epoch <= max_reported {
        return Err(LedgerError::InvalidEpoch { entity, epoch, max_reported });
    }
    Ok(())
}

/// Check that the parallel batch arrays all have the same length.
///
/// Returns the common length.
pub fn validate_batch_lengths(
    entities: usize,
    epochs: usize,
    primary: usize,
    secondary: usize,
) -> Result<usize, LedgerError> {
    if entities != epochs || entities != primary || entities != secondary {
        return Err(LedgerError::InvalidUsageAmount { entities, epochs, primary, secondary });
    }
    Ok(entities)
}
