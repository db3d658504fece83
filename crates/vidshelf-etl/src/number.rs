//! Episode numbering.
//!
//! For every season with un-numbered staged records, numbering resumes
//! after the highest episode the catalog already holds for that season and
//! proceeds in upload-date order. Seasons without pending records are never
//! touched, which is what keeps committed numbers stable across runs.

use vidshelf_core::{Episode, Season, VideoStore};

use crate::error::{OrganizeError, OrganizeResult};

/// The block of episode numbers handed out in one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonAssignment {
    pub season: Season,
    pub first: Episode,
    pub last: Episode,
}

impl SeasonAssignment {
    pub fn count(&self) -> usize {
        (self.last - self.first + 1) as usize
    }
}

/// Number every pending record in `staging`, anchored on `catalog`.
pub fn assign_episodes(
    catalog: &impl VideoStore,
    staging: &mut impl VideoStore,
) -> OrganizeResult<Vec<SeasonAssignment>> {
    let seasons = staging
        .seasons_needing_numbering()
        .map_err(|e| OrganizeError::store("listing seasons to number", e))?;
    log::info!("Number of seasons to update: {}", seasons.len());

    let mut assignments = Vec::with_capacity(seasons.len());

    for season in seasons {
        let highest = catalog
            .highest_episode(season)
            .map_err(|e| OrganizeError::store(format!("highest episode of {season}"), e))?;
        let pending = staging
            .records_needing_numbering(season)
            .map_err(|e| OrganizeError::store(format!("pending records of {season}"), e))?;

        log::info!(
            "Updating season {season}: {} new videos after episode {highest}",
            pending.len()
        );

        let first = highest + 1;
        let mut next = first;
        for mut record in pending {
            record
                .assign_episode(next)
                .map_err(|e| OrganizeError::store(format!("numbering {}", record.id), e))?;
            staging
                .update(&record)
                .map_err(|e| OrganizeError::store(format!("staging update of {}", record.id), e))?;
            log::debug!("Assigned {record}");
            next += 1;
        }

        if next > first {
            assignments.push(SeasonAssignment {
                season,
                first,
                last: next - 1,
            });
        }
    }

    Ok(assignments)
}
