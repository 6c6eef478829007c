use std::sync::Arc;

use df_structure::IndexRange;
use df_structure::IndexRangeList;
use df_structure::Interaction;
use df_structure::{Energy, e_is_inf, e_sum};

use df_energy::EnergyWindow;

use crate::OutputConstraint;
use crate::OutputHandler;
use crate::PredictError;
use crate::ReportOverlap;

/// A site candidate in window-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SiteCandidate {
    pub i1: usize,
    pub j1: usize,
    pub i2: usize,
    pub j2: usize,
    pub energy: Energy,
}

/// Bounded list of the best site candidates seen during a fill pass,
/// sorted by energy; ties keep the first candidate encountered in DP
/// order and suppress exact duplicates.
#[derive(Debug)]
pub(crate) struct OptimaList {
    candidates: Vec<SiteCandidate>,
    capacity: usize,
    max_e: Energy,
}

impl OptimaList {
    pub(crate) fn new(max_e: Energy, capacity: usize) -> Self {
        OptimaList { candidates: Vec::with_capacity(capacity.min(1024)), capacity, max_e }
    }

    pub(crate) fn update(&mut self, i1: usize, j1: usize, i2: usize, j2: usize, energy: Energy) {
        if self.capacity == 0 || e_is_inf(energy) || energy >= self.max_e {
            return;
        }
        if self.candidates.len() == self.capacity
            && energy >= self.candidates.last().map(|c| c.energy).unwrap_or(self.max_e)
        {
            return;
        }
        let candidate = SiteCandidate { i1, j1, i2, j2, energy };
        // insert after all equal-energy candidates, earlier DP order wins
        let pos = self.candidates.partition_point(|c| c.energy <= energy);
        let run_start = self.candidates.partition_point(|c| c.energy < energy);
        if self.candidates[run_start..pos].iter().any(|c| *c == candidate) {
            return;
        }
        self.candidates.insert(pos, candidate);
        self.candidates.truncate(self.capacity);
    }

    pub(crate) fn best(&self) -> Option<&SiteCandidate> {
        self.candidates.first()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, SiteCandidate> {
        self.candidates.iter()
    }
}

/// The S1/S2 spans already reported, window-local, used to enforce the
/// overlap policy.
#[derive(Debug, Default)]
pub(crate) struct ReportedRanges {
    pub r1: IndexRangeList,
    pub r2: IndexRangeList,
}

impl ReportedRanges {
    pub(crate) fn new() -> Self {
        ReportedRanges::default()
    }

    /// Whether a site with the given local spans may still be reported.
    pub(crate) fn admits(&self, site1: &IndexRange, site2: &IndexRange) -> bool {
        !self.r1.overlaps(site1) && !self.r2.overlaps(site2)
    }

    /// Records the spans of a reported site according to the policy.
    pub(crate) fn record(
        &mut self,
        policy: ReportOverlap,
        site1: IndexRange,
        site2: IndexRange,
    ) {
        match policy {
            ReportOverlap::Both => {}
            ReportOverlap::Seq1 => self.r2.insert(site2),
            ReportOverlap::Seq2 => self.r1.insert(site1),
            ReportOverlap::None => {
                self.r1.insert(site1);
                self.r2.insert(site2);
            }
        }
    }
}

/// Upper report bound: below max_e and within delta_e of the mfe.
pub(crate) fn report_bound(ocon: &OutputConstraint, mfe: Energy) -> Energy {
    ocon.max_e.min(e_sum(mfe, ocon.delta_e))
}

/// Local S1/S2 spans of a candidate.
pub(crate) fn candidate_site(candidate: &SiteCandidate) -> (IndexRange, IndexRange) {
    (
        IndexRange::new(candidate.i1, candidate.j1),
        IndexRange::new(candidate.i2, candidate.j2),
    )
}

/// An interaction holding only the candidate's left boundary pair; trace
/// backs fill in the remaining pairs.
pub(crate) fn boundary_interaction(
    window: &EnergyWindow,
    candidate: &SiteCandidate,
) -> Interaction {
    let s1 = Arc::clone(window.energy().accessibility1().sequence());
    let s2 = Arc::clone(window.energy().accessibility2().origin().sequence());
    let mut interaction = Interaction::new(s1, s2);
    interaction.base_pairs.push(window.base_pair(candidate.i1, candidate.i2));
    interaction.energy = candidate.energy;
    interaction
}

/// The empty "no interaction found" report.
pub(crate) fn report_none(window: &EnergyWindow, out: &mut dyn OutputHandler) {
    let s1 = Arc::clone(window.energy().accessibility1().sequence());
    let s2 = Arc::clone(window.energy().accessibility2().origin().sequence());
    out.add_interaction(&Interaction::new(s1, s2));
}

/// Greedy top-K reporting over the candidates collected during the fill
/// pass: candidates are visited by increasing energy, filtered by the
/// overlap policy, traced, and handed to the output.
pub(crate) fn report_candidates<T>(
    optima: &OptimaList,
    window: &EnergyWindow,
    ocon: &OutputConstraint,
    out: &mut dyn OutputHandler,
    mut trace: T,
) -> Result<(), PredictError>
where
    T: FnMut(&SiteCandidate, &mut Interaction) -> Result<(), PredictError>,
{
    if ocon.report_max == 0 {
        return Ok(());
    }
    let mfe = match optima.best() {
        Some(best) => best.energy,
        None => {
            report_none(window, out);
            return Ok(());
        }
    };
    let bound = report_bound(ocon, mfe);

    let mut reported = ReportedRanges::new();
    let mut count = 0;
    for candidate in optima.iter() {
        if count >= ocon.report_max {
            break;
        }
        if candidate.energy > bound || candidate.energy >= ocon.max_e {
            break;
        }
        let (site1, site2) = candidate_site(candidate);
        if !reported.admits(&site1, &site2) {
            continue;
        }
        let mut interaction = boundary_interaction(window, candidate);
        trace(candidate, &mut interaction)?;
        if !interaction.is_valid() {
            return Err(PredictError::TraceFailure(format!(
                "invalid interaction for candidate {}-{} x {}-{}",
                candidate.i1, candidate.j1, candidate.i2, candidate.j2
            )));
        }
        out.add_interaction(&interaction);
        reported.record(ocon.report_overlap, site1, site2);
        count += 1;
    }

    if count == 0 {
        report_none(window, out);
    }
    Ok(())
}
