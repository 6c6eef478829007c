use df_structure::Interaction;
use df_structure::InteractionRange;
use df_structure::{Energy, E_INF};

/// How reported interactions may overlap each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOverlap {
    /// Any overlap allowed; requires full suboptimal enumeration.
    Both,
    /// Overlap allowed in sequence 1 only.
    Seq1,
    /// Overlap allowed in sequence 2 only.
    Seq2,
    /// Reported sites are disjoint in both sequences.
    None,
}

/// Constraints on what a prediction reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConstraint {
    /// Maximal number of reported interactions.
    pub report_max: usize,
    /// Overlap policy among reported interactions.
    pub report_overlap: ReportOverlap,
    /// Only interactions with energy below this bound are reported.
    pub max_e: Energy,
    /// Only interactions within mfe + delta_e are reported.
    pub delta_e: Energy,
}

impl Default for OutputConstraint {
    fn default() -> Self {
        OutputConstraint {
            report_max: 1,
            report_overlap: ReportOverlap::Both,
            max_e: 0,
            delta_e: E_INF,
        }
    }
}


/// Sink for predicted interactions. The empty interaction serves as the
/// "no interaction found" report.
pub trait OutputHandler {
    fn add_interaction(&mut self, interaction: &Interaction);

    fn add_range(&mut self, range: &InteractionRange);

    /// Number of reports received so far.
    fn reported(&self) -> usize;
}


/// Plain collector keeping every report for downstream consumers.
#[derive(Debug, Default)]
pub struct InteractionCollector {
    pub interactions: Vec<Interaction>,
    pub ranges: Vec<InteractionRange>,
}

impl InteractionCollector {
    pub fn new() -> Self {
        InteractionCollector::default()
    }

    /// The collected interactions that are not the no-interaction report.
    pub fn found(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.iter().filter(|i| !i.is_empty())
    }
}

impl OutputHandler for InteractionCollector {
    fn add_interaction(&mut self, interaction: &Interaction) {
        self.interactions.push(interaction.clone());
    }

    fn add_range(&mut self, range: &InteractionRange) {
        self.ranges.push(range.clone());
    }

    fn reported(&self) -> usize {
        self.interactions.len() + self.ranges.len()
    }
}


/// Forwards every interaction as its lossy range summary to a chained
/// handler; ranges pass through unchanged.
pub struct RangeOnly<'a> {
    next: &'a mut dyn OutputHandler,
}

impl<'a> RangeOnly<'a> {
    pub fn new(next: &'a mut dyn OutputHandler) -> Self {
        RangeOnly { next }
    }
}

impl OutputHandler for RangeOnly<'_> {
    fn add_interaction(&mut self, interaction: &Interaction) {
        if interaction.is_empty() {
            // forward the no-interaction report unchanged
            self.next.add_interaction(interaction);
        } else {
            self.next.add_range(&InteractionRange::from(interaction));
        }
    }

    fn add_range(&mut self, range: &InteractionRange) {
        self.next.add_range(range);
    }

    fn reported(&self) -> usize {
        self.next.reported()
    }
}
