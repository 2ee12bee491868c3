//! Catalog-wide consistency sweep.
//!
//! Asks for recommendations for every title (or the first `sample`) and
//! records anything that breaks the recommender's guarantees.

use std::collections::HashSet;

use tracing::{info, instrument};

use recommender::Recommender;

/// A single broken guarantee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Title that was queried
    pub title: String,
    pub reason: String,
}

/// Outcome of [`run_check`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub tested: usize,
    /// Titles whose result was empty (expected only for one-movie catalogs)
    pub empty: usize,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the sweep over the first `sample` titles (all when `None`)
#[instrument(skip(recommender))]
pub fn run_check(recommender: &Recommender, sample: Option<usize>, top_n: usize) -> CheckReport {
    let store = recommender.store();
    let movies = store.movies();
    let limit = sample.map_or(movies.len(), |n| n.min(movies.len()));
    let catalog: HashSet<&str> = movies.iter().map(|m| m.title.as_str()).collect();
    let expected_len = top_n.min(movies.len().saturating_sub(1));

    info!("Checking {} of {} titles (top_n: {})", limit, movies.len(), top_n);

    let mut report = CheckReport::default();

    for (position, movie) in movies.iter().enumerate().take(limit) {
        report.tested += 1;

        let recs = match recommender.try_recommend(&movie.title, top_n) {
            Ok(recs) => recs,
            Err(err) => {
                report.failures.push(CheckFailure {
                    title: movie.title.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if recs.is_empty() {
            report.empty += 1;
        }

        let mut fail = |reason: String| {
            report.failures.push(CheckFailure {
                title: movie.title.clone(),
                reason,
            })
        };

        // Duplicate titles resolve to their first occurrence; only judge that one
        let queried = store.position_of(&movie.title).unwrap_or(position);

        if recs.len() != expected_len {
            fail(format!("Expected {} recommendations, got {}", expected_len, recs.len()));
        }
        for rec in &recs {
            if rec.position == queried {
                fail("Recommended the query movie itself".to_string());
            }
            if !catalog.contains(rec.title.as_str()) {
                fail(format!("Recommended movie not found in dataset: {}", rec.title));
            }
        }
        if recs.windows(2).any(|pair| pair[0].score < pair[1].score) {
            fail("Scores are not in descending order".to_string());
        }
    }

    info!(
        "Check finished: tested={}, empty={}, failures={}",
        report.tested,
        report.empty,
        report.failures.len()
    );
    report
}
