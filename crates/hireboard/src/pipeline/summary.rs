use serde::Serialize;

use super::Stage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelEntry {
    pub stage: Stage,
    pub count: usize,
    /// Share of all candidates, 0–100 with one decimal place.
    pub percentage: f64,
}

/// Stage counts and funnel for one company's candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub funnel: Vec<FunnelEntry>,
}

impl PipelineSummary {
    pub fn from_stages<I>(stages: I) -> Self
    where
        I: IntoIterator<Item = Stage>,
    {
        let mut counts = [0usize; 6];
        for stage in stages {
            if let Some(slot) = Stage::ALL.iter().position(|known| *known == stage) {
                counts[slot] += 1;
            }
        }

        let total = counts.iter().sum();
        let funnel = Stage::ALL
            .iter()
            .zip(counts)
            .map(|(stage, count)| FunnelEntry {
                stage: *stage,
                count,
                percentage: percentage(count, total),
            })
            .collect();

        Self { total, funnel }
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.funnel
            .iter()
            .find(|entry| entry.stage == stage)
            .map_or(0, |entry| entry.count)
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}
