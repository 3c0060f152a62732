use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::time::Instant;

use crate::config::CallerConfig;
use crate::error::{FocalError, InputIssue};
use crate::focal::arm::{aggregate_arms, arm_status_index, ArmSummary};
use crate::focal::cytoband::{resolve_cytobands, CytobandCall};
use crate::focal::gene::{resolve_genes, GeneFocal};
use crate::focal::{combine, FocalCall, MissingJoinKey, RegionType};
use crate::input::{validate_inputs, GeneCall, RegionStat};
use crate::output::{FocalOutput, OutputCollector, RunSummary};

/// Result from PipelineRunner::run().
pub struct PipelineResult {
    pub output: FocalOutput,
    /// Every (sample, arm) aggregate, neutral included
    pub arms: Vec<ArmSummary>,
    /// Every classified cytoband, before surfacing
    pub cytobands: Vec<CytobandCall>,
}

/// Rows belonging to one sample
#[derive(Debug, Default)]
struct SampleInputs {
    regions: Vec<RegionStat>,
    genes: Vec<GeneCall>,
}

/// Per-sample stage outputs, concatenated after the partition map
#[derive(Debug, Default)]
struct SampleResult {
    arms: Vec<ArmSummary>,
    classified: Vec<CytobandCall>,
    surfaced: Vec<CytobandCall>,
    genes: Vec<GeneFocal>,
    gene_candidates: usize,
    neutral_genes: usize,
    missing: Vec<MissingJoinKey>,
}

struct StepTimer {
    total_start: Instant,
    step_start: Instant,
}

impl StepTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            total_start: now,
            step_start: now,
        }
    }
    fn start(&mut self, name: &str) {
        info!("===== [STAGE] {} =====", name);
        self.step_start = Instant::now();
    }
    fn end(&self) {
        let now = Instant::now();
        info!("----- Stage Time: {:.2?} -----", now.duration_since(self.step_start));
        info!("----- Total Time: {:.2?} -----", now.duration_since(self.total_start));
    }
}

pub struct PipelineRunner<'a> {
    regions: Vec<RegionStat>,
    genes: Vec<GeneCall>,
    config: Option<&'a CallerConfig>,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(regions: Vec<RegionStat>, genes: Vec<GeneCall>) -> Self {
        Self {
            regions,
            genes,
            config: None,
        }
    }

    pub fn with_config(mut self, config: &'a CallerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn run(self) -> Result<PipelineResult, FocalError> {
        let default_config = CallerConfig::default();
        let config = self.config.unwrap_or(&default_config);
        let mut timer = StepTimer::new();

        // Thresholds are checked before any row is touched
        config.validate()?;
        info!(
            "Starting focal resolution (status_threshold={}, uncallable_threshold={})",
            config.thresholds.status_threshold, config.thresholds.uncallable_threshold
        );

        timer.start("Validate inputs");
        let inputs = validate_inputs(self.regions, self.genes, config.input_policy)?;
        let region_rows = inputs.regions.len();
        let gene_rows = inputs.genes.len();
        info!("{} region rows, {} gene rows accepted", region_rows, gene_rows);
        timer.end();

        timer.start("Resolve samples");
        let partitions = partition_by_sample(inputs.regions, inputs.genes);
        let n_samples = partitions.len();
        let results: Vec<SampleResult> = if config.parallel {
            partitions
                .par_iter()
                .map(|p| resolve_sample(p, config))
                .collect()
        } else {
            partitions.iter().map(|p| resolve_sample(p, config)).collect()
        };
        info!("Resolved {} samples", n_samples);
        timer.end();

        timer.start("Combine");
        let mut merged = SampleResult::default();
        for r in results {
            merged.arms.extend(r.arms);
            merged.classified.extend(r.classified);
            merged.surfaced.extend(r.surfaced);
            merged.genes.extend(r.genes);
            merged.gene_candidates += r.gene_candidates;
            merged.neutral_genes += r.neutral_genes;
            merged.missing.extend(r.missing);
        }

        let calls = combine(&merged.arms, &merged.surfaced, &merged.genes);

        if !merged.missing.is_empty() {
            warn!("Excluded {} rows with no parent status", merged.missing.len());
            for m in merged.missing.iter().take(5) {
                warn!("  {}", m);
            }
        }

        let summary = build_summary(
            &calls,
            n_samples,
            region_rows,
            gene_rows,
            &merged,
            inputs.skipped,
        );
        info!(
            "{} focal calls: {} arm, {} cytoband, {} gene",
            calls.len(),
            summary.arm_calls,
            summary.cytoband_calls,
            summary.gene_calls
        );
        timer.end();

        let output = OutputCollector::new()
            .with_thresholds(config.thresholds)
            .with_calls(calls)
            .with_summary(summary)
            .build();

        Ok(PipelineResult {
            output,
            arms: merged.arms,
            cytobands: merged.classified,
        })
    }
}

/// Convenience wrapper: resolve both tables with `config` and return the output.
pub fn resolve(
    regions: Vec<RegionStat>,
    genes: Vec<GeneCall>,
    config: &CallerConfig,
) -> Result<FocalOutput, FocalError> {
    PipelineRunner::new(regions, genes)
        .with_config(config)
        .run()
        .map(|r| r.output)
}

/// Group rows by sample in first-seen order (regions first, then genes).
fn partition_by_sample(regions: Vec<RegionStat>, genes: Vec<GeneCall>) -> Vec<SampleInputs> {
    let mut by_sample: IndexMap<String, SampleInputs> = IndexMap::new();
    for r in regions {
        by_sample.entry(r.sample_id.clone()).or_default().regions.push(r);
    }
    for g in genes {
        by_sample.entry(g.sample_id.clone()).or_default().genes.push(g);
    }
    by_sample.into_values().collect()
}

/// Run the arm, cytoband and gene stages for one sample.
fn resolve_sample(inputs: &SampleInputs, config: &CallerConfig) -> SampleResult {
    let thresholds = &config.thresholds;

    let arms = aggregate_arms(&inputs.regions, thresholds);
    let bands = resolve_cytobands(&inputs.regions, &arms, thresholds);

    let arm_status = arm_status_index(&arms);
    let band_status = bands.band_status_index();
    let genes = resolve_genes(&inputs.genes, &arm_status, &band_status, &config.band_delimiter);

    let sample_id = inputs
        .regions
        .first()
        .map(|r| r.sample_id.as_str())
        .or_else(|| inputs.genes.first().map(|g| g.sample_id.as_str()));
    if let Some(sample_id) = sample_id {
        debug!(
            "{}: {} arms, {}/{} bands surfaced, {} genes surfaced from {} candidates",
            sample_id,
            arms.len(),
            bands.surfaced.len(),
            bands.classified.len(),
            genes.surfaced.len(),
            genes.candidates
        );
    }

    let mut missing = bands.missing;
    missing.extend(genes.missing);

    SampleResult {
        arms,
        classified: bands.classified,
        surfaced: bands.surfaced,
        genes: genes.surfaced,
        gene_candidates: genes.candidates,
        neutral_genes: genes.neutral_dropped,
        missing,
    }
}

fn build_summary(
    calls: &[FocalCall],
    samples: usize,
    region_rows: usize,
    gene_rows: usize,
    merged: &SampleResult,
    skipped_rows: Vec<InputIssue>,
) -> RunSummary {
    let count = |t: RegionType| calls.iter().filter(|c| c.region_type == t).count();
    RunSummary {
        samples,
        region_rows,
        gene_rows,
        gene_band_candidates: merged.gene_candidates,
        neutral_genes_dropped: merged.neutral_genes,
        arm_calls: count(RegionType::Arm),
        cytoband_calls: count(RegionType::Cytoband),
        gene_calls: count(RegionType::Gene),
        skipped_rows,
        missing_join_keys: merged.missing.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputPolicy, Thresholds};
    use crate::focal::{normalize, DominantStatus};
    use crate::input::GeneStatus;

    fn rows(output: &FocalOutput) -> Vec<(&str, RegionType, &str, DominantStatus)> {
        output
            .calls
            .iter()
            .map(|c| (c.sample_id.as_str(), c.region_type, c.region_id.as_str(), c.status))
            .collect()
    }

    fn sequential() -> CallerConfig {
        CallerConfig::default().with_parallel(false)
    }

    #[test]
    fn test_focal_band_under_neutral_arm() {
        let regions = vec![
            RegionStat::new("S1", "1p", "1p36", 1_000_000, 0.95, 0.0, 1.0),
            RegionStat::new("S1", "1p", "1p35", 3_000_000, 0.10, 0.0, 1.0),
        ];
        let result = PipelineRunner::new(regions, vec![]).with_config(&sequential()).run().unwrap();
        assert!((result.arms[0].loss_fraction - 0.3125).abs() < 1e-12);
        assert_eq!(result.arms[0].status, DominantStatus::Neutral);
        assert_eq!(
            rows(&result.output),
            vec![("S1", RegionType::Cytoband, "1p36", DominantStatus::Loss)]
        );
    }

    #[test]
    fn test_low_callable_band_is_uncallable() {
        let regions = vec![
            RegionStat::new("S1", "4q", "4q12", 1_000, 0.0, 0.0, 1.0),
            RegionStat::new("S1", "4q", "4q13", 1_000, 0.0, 0.0, 1.0),
            RegionStat::new("S1", "4q", "4q21", 10, 1.0, 0.0, 0.3),
        ];
        let result = PipelineRunner::new(regions, vec![]).with_config(&sequential()).run().unwrap();
        assert_eq!(result.cytobands[2].status, DominantStatus::Uncallable);
        assert_eq!(
            rows(&result.output),
            vec![("S1", RegionType::Cytoband, "4q21", DominantStatus::Uncallable)]
        );
    }

    #[test]
    fn test_gene_agreeing_with_loss_context_hidden() {
        let regions = vec![RegionStat::new("S1", "13q", "13q14.2", 1_000, 1.0, 0.0, 1.0)];
        let genes = vec![GeneCall::new("S1", "RB1", "13q14.2", "13q", GeneStatus::Loss)];
        let output = resolve(regions, genes, &sequential()).unwrap();
        // arm loss surfaces, band agrees with arm, gene agrees with both
        assert_eq!(rows(&output), vec![("S1", RegionType::Arm, "13q", DominantStatus::Loss)]);
    }

    #[test]
    fn test_gain_gene_in_loss_band_under_neutral_arm() {
        let regions = vec![
            RegionStat::new("S1", "8q", "8q24.21", 1_000, 0.95, 0.0, 1.0),
            RegionStat::new("S1", "8q", "8q22", 9_000, 0.0, 0.0, 1.0),
        ];
        let genes = vec![GeneCall::new("S1", "MYC", "8q24.21", "8q", GeneStatus::Gain)];
        let output = resolve(regions, genes, &sequential()).unwrap();
        assert_eq!(
            rows(&output),
            vec![
                ("S1", RegionType::Cytoband, "8q24.21", DominantStatus::Loss),
                ("S1", RegionType::Gene, "MYC", DominantStatus::Gain),
            ]
        );
    }

    #[test]
    fn test_boundary_threshold_not_loss() {
        for len in [13, 1_000, 2_000_001] {
            let regions = vec![RegionStat::new("S1", "1p", "1p36", len, 0.9, 0.0, 1.0)];
            let genes = vec![GeneCall::new("S1", "TP73", "1p36", "1p", GeneStatus::Loss)];
            let output = resolve(regions, genes, &sequential()).unwrap();
            // neutral arm and band; the loss gene surfaces on its own
            assert_eq!(
                rows(&output),
                vec![("S1", RegionType::Gene, "TP73", DominantStatus::Loss)],
                "length {}",
                len
            );
        }
    }

    #[test]
    fn test_threshold_misconfiguration_fails_fast() {
        // the malformed row would fail too; thresholds are reported first
        let regions = vec![RegionStat::new("S1", "1p", "1p36", 1_000, 2.0, 0.0, 1.0)];
        let config = CallerConfig {
            thresholds: Thresholds { status_threshold: 0.4, uncallable_threshold: 0.5 },
            ..Default::default()
        };
        let err = resolve(regions, vec![], &config).unwrap_err();
        assert!(matches!(err, FocalError::ThresholdMisconfiguration { .. }));
    }

    #[test]
    fn test_strict_policy_rejects_whole_input() {
        let regions = vec![
            RegionStat::new("S1", "1p", "1p36", 1_000, 1.0, 0.0, 1.0),
            RegionStat::new("S1", "1p", "1p35", 1_000, 0.8, 0.3, 1.0),
        ];
        let err = resolve(regions, vec![], &sequential()).unwrap_err();
        match err {
            FocalError::MalformedInput { issues } => assert_eq!(issues[0].row, 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_skip_policy_reports_dropped_rows() {
        let regions = vec![
            RegionStat::new("S1", "1p", "1p36", 1_000, 1.0, 0.0, 1.0),
            RegionStat::new("S1", "1p", "1p35", 1_000, 0.8, 0.3, 1.0),
        ];
        let config = sequential().with_input_policy(InputPolicy::Skip);
        let output = resolve(regions, vec![], &config).unwrap();
        let summary = output.summary.unwrap();
        assert_eq!(summary.skipped_rows.len(), 1);
        assert_eq!(summary.region_rows, 1);
        assert_eq!(output.calls.len(), 1);
        assert_eq!(output.calls[0].region_id, "1p");
    }

    #[test]
    fn test_missing_join_keys_counted() {
        let regions = vec![RegionStat::new("S1", "9p", "9p21.3", 1_000, 0.0, 0.0, 1.0)];
        let genes = vec![
            GeneCall::new("S1", "CDKN2A", "9p21.3", "9p", GeneStatus::Loss),
            GeneCall::new("S1", "PTEN", "10q23.31", "10q", GeneStatus::Loss),
            GeneCall::new("S9", "TP53", "17p13.1", "17p", GeneStatus::Loss),
        ];
        let output = resolve(regions, genes, &sequential()).unwrap();
        let summary = output.summary.as_ref().unwrap();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.missing_join_keys.len(), 2);
        assert_eq!(summary.missing_by_parent(RegionType::Arm), 2);
        assert_eq!(
            rows(&output),
            vec![("S1", RegionType::Gene, "CDKN2A", DominantStatus::Loss)]
        );
    }

    fn cohort() -> (Vec<RegionStat>, Vec<GeneCall>) {
        let mut regions = Vec::new();
        let mut genes = Vec::new();
        for s in 0..12 {
            let sample = format!("S{:02}", s);
            for (i, arm) in ["1p", "1q", "7q", "17p"].iter().enumerate() {
                for b in 0..4 {
                    let k = (s * 7 + i * 3 + b) % 10;
                    let loss = if k < 3 { 0.95 } else { 0.05 * k as f64 };
                    let gain = if k == 9 { 0.93 } else { 0.0 };
                    let (loss, gain) = if gain > 0.0 { (0.0, gain) } else { (loss, gain) };
                    let callable = if k == 5 { 0.2 } else { 1.0 };
                    regions.push(RegionStat::new(
                        &sample,
                        arm,
                        &format!("{}{}", arm, 11 + b),
                        1_000_000 + (b as u64) * 250_000,
                        loss,
                        gain,
                        callable,
                    ));
                }
                let status = if (s + i) % 2 == 0 { GeneStatus::Loss } else { GeneStatus::Gain };
                genes.push(GeneCall::new(
                    &sample,
                    &format!("G{}", i),
                    &format!("{}11-{}12", arm, arm),
                    arm,
                    status,
                ));
            }
        }
        (regions, genes)
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (regions, genes) = cohort();
        let seq = resolve(regions.clone(), genes.clone(), &sequential()).unwrap();
        let par = resolve(regions, genes, &CallerConfig::default().with_parallel(true)).unwrap();
        assert_eq!(seq.calls, par.calls);
        assert_eq!(seq.summary, par.summary);
        assert!(!seq.calls.is_empty());
    }

    #[test]
    fn test_output_invariants_on_cohort() {
        let (regions, genes) = cohort();
        let output = resolve(regions, genes, &sequential()).unwrap();
        assert!(output.calls.iter().all(|c| c.status != DominantStatus::Neutral));

        let mut seen = std::collections::HashSet::new();
        for c in &output.calls {
            assert!(seen.insert((c.sample_id.clone(), c.region_type, c.region_id.clone())));
        }

        let again: Vec<FocalCall> = normalize(output.calls.clone());
        assert_eq!(again, output.calls);
    }

    #[test]
    fn test_summary_counts_match_calls() {
        let (regions, genes) = cohort();
        let n_regions = regions.len();
        let output = resolve(regions, genes, &sequential()).unwrap();
        let summary = output.summary.as_ref().unwrap();
        let by_type = output.counts_by_type();
        assert_eq!(summary.samples, 12);
        assert_eq!(summary.region_rows, n_regions);
        assert_eq!(summary.gene_band_candidates, 12 * 4 * 2);
        assert_eq!(summary.arm_calls, by_type.get(&RegionType::Arm).copied().unwrap_or(0));
        assert_eq!(summary.gene_calls, by_type.get(&RegionType::Gene).copied().unwrap_or(0));
        assert!(summary.missing_join_keys.is_empty());
    }
}
