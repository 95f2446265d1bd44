//! Participant-population restriction policy
//!
//! Filtering by a membership list that covers the whole participant universe
//! costs more than omitting the filter, so a restriction is only planned when
//! it actually narrows the population. An empty candidate list always plans a
//! restriction that matches nothing.

use phenoportal_diagnostics::Result;
use phenoportal_model::{Filter, ParticipantCounter};

/// Decide the participant restriction for a candidate population
///
/// - `None` candidates: no restriction
/// - empty candidates: restriction matching nothing
/// - fewer candidates than the universe: membership restriction
/// - otherwise: no restriction
pub fn restriction(path: &str, candidates: Option<&[String]>, universe: u64) -> Option<Filter> {
    let candidates = candidates?;
    if candidates.is_empty() || (candidates.len() as u64) < universe {
        Some(Filter::is_in(path, candidates.iter().cloned()))
    } else {
        None
    }
}

/// Plan a restriction, counting the universe only when the answer depends on it
pub async fn plan_restriction(
    counter: &dyn ParticipantCounter,
    path: &str,
    candidates: Option<&[String]>,
) -> Result<Option<Filter>> {
    let universe = match candidates {
        None => return Ok(None),
        Some([]) => 0,
        Some(_) => counter.estimated_count().await?,
    };
    let planned = restriction(path, candidates, universe);
    log::debug!(
        "population of {} against universe {}: {}",
        candidates.map_or(0, <[String]>::len),
        universe,
        if planned.is_some() { "restricted" } else { "unrestricted" }
    );
    Ok(planned)
}
