//! Per-session factor evaluation.

use std::collections::BTreeSet;

use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{debug, info, warn};
use xsection_panel::{FactorPanel, ReturnPanel};
use xsection_primitives::{AggregateStat, Date, FactorName, Horizon, RegressionResult, ResultKey};

use crate::{
    CrossSectionFit, CrossSectionRegressor, EvalConfig, FactorTransformer, JoinedCrossSection,
    ModelError, QuantileAnalytics, TransformedCrossSection, aggregate, analyze,
};

/// A (factor, horizon, session) group excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGroup {
    /// Group key.
    pub key: ResultKey,
    /// Why the group was skipped.
    pub reason: String,
}

/// Output of one evaluation run.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Regression results sorted by key.
    pub results: Vec<RegressionResult>,
    /// Skipped groups sorted by key.
    pub skipped: Vec<SkippedGroup>,
    /// Transformed factor cross-sections, sorted by factor then session.
    pub transformed: Vec<TransformedCrossSection>,
    /// Horizons evaluated.
    pub horizons: Vec<Horizon>,
}

/// Fit details of a single (factor, horizon, session) group.
#[derive(Debug, Clone)]
pub struct SessionFit {
    /// Group key.
    pub key: ResultKey,
    /// Transformed factor cross-section.
    pub transformed: TransformedCrossSection,
    /// Rows entering the fit.
    pub joined: JoinedCrossSection,
    /// Fit result.
    pub fit: CrossSectionFit,
}

impl SessionFit {
    /// Regression result row of this fit.
    #[must_use]
    pub fn result(&self) -> RegressionResult {
        RegressionResult {
            session_end: self.key.session_end,
            factor: self.key.factor.clone(),
            horizon: self.key.horizon,
            loading: self.fit.estimate.slope,
            t_value: self.fit.estimate.t_value,
            sample_count: self.joined.len(),
            ic: self.fit.ic,
        }
    }
}

#[derive(Debug, Default)]
struct TaskOutput {
    results: Vec<RegressionResult>,
    skipped: Vec<SkippedGroup>,
    transformed: Option<TransformedCrossSection>,
}

/// Evaluates every factor of a factor panel against a return panel.
///
/// For each (factor, session) the raw cross-section is robustified and
/// standardized once, then joined with the returns of each horizon and
/// fitted. Groups that are degenerate or fail to fit are skipped and
/// logged; any other error aborts the run.
#[derive(Debug)]
pub struct FactorEvaluator {
    config: EvalConfig,
    transformer: FactorTransformer,
    regressor: CrossSectionRegressor,
}

impl FactorEvaluator {
    /// Create a new evaluator.
    ///
    /// # Errors
    /// Returns `ModelError::Config` if the configuration is invalid.
    pub fn new(config: EvalConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let transformer = FactorTransformer::new(config.outlier, config.drop_zero_values);
        let regressor = CrossSectionRegressor::for_model(config.model, config.huber);
        Ok(Self { config, transformer, regressor })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EvalConfig {
        &self.config
    }

    fn horizons(&self, returns: &ReturnPanel) -> Vec<Horizon> {
        if self.config.horizons.is_empty() {
            returns.horizons().into_iter().collect()
        } else {
            let mut horizons = self.config.horizons.clone();
            horizons.sort_unstable();
            horizons.dedup();
            horizons
        }
    }

    /// Transform one (factor, session) and fit it against every horizon.
    fn run_task(
        &self,
        factors: &FactorPanel,
        returns: &ReturnPanel,
        horizons: &[Horizon],
        factor: &FactorName,
        session_end: Date,
    ) -> Result<TaskOutput, ModelError> {
        let mut out = TaskOutput::default();
        let Some(xs) = factors.cross_section(session_end, factor) else {
            return Ok(out);
        };

        let transformed = match self.transformer.transform(factor, &xs) {
            Ok(t) => t,
            Err(e) if e.is_recoverable() => {
                for &horizon in horizons {
                    if returns.group(horizon, session_end).is_some() {
                        out.skipped.push(skip(factor, horizon, session_end, &e));
                    }
                }
                return Ok(out);
            }
            Err(e) => return Err(e),
        };

        for &horizon in horizons {
            let Some(group) = returns.group(horizon, session_end) else { continue };
            let joined = JoinedCrossSection::join(&transformed, self.config.model.is_weighted(), |s| {
                group.get(s).map(|obs| (obs.excess_return, obs.weight))
            });
            // no complete row: nothing to report for this group
            if joined.is_empty() {
                continue;
            }
            match self.regressor.fit(&joined.factor, &joined.excess_return, &joined.weights) {
                Ok(fit) => {
                    debug!(%factor, %horizon, %session_end, n = joined.len(), t = fit.estimate.t_value, "fitted");
                    out.results.push(RegressionResult {
                        session_end,
                        factor: factor.clone(),
                        horizon,
                        loading: fit.estimate.slope,
                        t_value: fit.estimate.t_value,
                        sample_count: joined.len(),
                        ic: fit.ic,
                    });
                }
                Err(e) if e.is_recoverable() => out.skipped.push(skip(factor, horizon, session_end, &e)),
                Err(e) => return Err(e),
            }
        }
        out.transformed = Some(transformed);
        Ok(out)
    }

    /// Evaluate every (factor, horizon, session) group.
    ///
    /// Sessions run on a pool of `workers` threads when more than one is
    /// configured. Rows are merged and sorted by key afterwards.
    ///
    /// # Errors
    /// Returns the first non-recoverable error of any group.
    pub fn evaluate(
        &self,
        factors: &FactorPanel,
        returns: &ReturnPanel,
    ) -> Result<Evaluation, ModelError> {
        let horizons = self.horizons(returns);
        let tasks: Vec<(&FactorName, Date)> = factors
            .factors()
            .iter()
            .flat_map(|f| factors.sessions().map(move |d| (f, d)))
            .collect();
        info!(
            factors = factors.factors().len(),
            sessions = factors.n_sessions(),
            horizons = horizons.len(),
            model = %self.config.model,
            outlier = %self.config.outlier,
            workers = self.config.workers,
            "evaluating factors"
        );

        let run = |&(factor, session_end): &(&FactorName, Date)| {
            self.run_task(factors, returns, &horizons, factor, session_end)
        };
        let outputs: Vec<TaskOutput> = if self.config.workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|e| ModelError::Config(format!("failed to build worker pool: {e}")))?;
            pool.install(|| tasks.par_iter().map(run).collect::<Result<_, _>>())?
        } else {
            tasks.iter().map(run).collect::<Result<_, _>>()?
        };

        let mut evaluation = Evaluation { horizons, ..Default::default() };
        for out in outputs {
            evaluation.results.extend(out.results);
            evaluation.skipped.extend(out.skipped);
            evaluation.transformed.extend(out.transformed);
        }
        evaluation.results.sort_by_key(RegressionResult::key);
        evaluation.skipped.sort_by(|a, b| a.key.cmp(&b.key));
        evaluation.transformed.sort_by(|a, b| (&a.factor, a.session_end).cmp(&(&b.factor, b.session_end)));

        info!(
            results = evaluation.results.len(),
            skipped = evaluation.skipped.len(),
            "evaluation finished"
        );
        Ok(evaluation)
    }

    /// Fit a single (factor, horizon, session) group and return its details.
    ///
    /// # Errors
    /// Returns `ModelError::DegenerateGroup` if the factor or session is
    /// absent, no complete row remains or the group cannot be fitted, and
    /// propagates other fit errors.
    pub fn evaluate_session(
        &self,
        factors: &FactorPanel,
        returns: &ReturnPanel,
        factor: &FactorName,
        horizon: Horizon,
        session_end: Date,
    ) -> Result<SessionFit, ModelError> {
        let key = ResultKey::new(factor.clone(), horizon, session_end);
        let xs = factors.cross_section(session_end, factor).ok_or_else(|| {
            ModelError::DegenerateGroup(format!("no {factor} values on {session_end}"))
        })?;
        let group = returns.group(horizon, session_end).ok_or_else(|| {
            ModelError::DegenerateGroup(format!("no {horizon} returns on {session_end}"))
        })?;

        let transformed = self.transformer.transform(factor, &xs)?;
        let joined = JoinedCrossSection::join(&transformed, self.config.model.is_weighted(), |s| {
            group.get(s).map(|obs| (obs.excess_return, obs.weight))
        });
        if joined.is_empty() {
            return Err(ModelError::DegenerateGroup(format!(
                "no complete row for {factor} {horizon} on {session_end}"
            )));
        }
        let fit = self.regressor.fit(&joined.factor, &joined.excess_return, &joined.weights)?;
        Ok(SessionFit { key, transformed, joined, fit })
    }

    /// Significance summary of an evaluation with the configured thresholds.
    #[must_use]
    pub fn summarize(&self, evaluation: &Evaluation) -> Vec<AggregateStat> {
        aggregate(&evaluation.results, self.config.t_threshold, self.config.ic_threshold)
    }

    /// Quantile analytics of every factor of an evaluation.
    ///
    /// Empty when no binning is configured.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for invalid bucket edges.
    pub fn quantiles(
        &self,
        evaluation: &Evaluation,
        returns: &ReturnPanel,
    ) -> Result<Vec<QuantileAnalytics>, ModelError> {
        let Some(binning) = &self.config.binning else {
            return Ok(Vec::new());
        };
        let factors: BTreeSet<&FactorName> = evaluation.transformed.iter().map(|t| &t.factor).collect();
        factors
            .into_iter()
            .map(|f| analyze(f, &evaluation.transformed, returns, &evaluation.horizons, binning))
            .collect()
    }
}

fn skip(factor: &FactorName, horizon: Horizon, session_end: Date, err: &ModelError) -> SkippedGroup {
    warn!(%factor, %horizon, %session_end, error = %err, "skipping group");
    SkippedGroup { key: ResultKey::new(factor.clone(), horizon, session_end), reason: err.to_string() }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use polars::prelude::*;
    use rstest::rstest;
    use xsection_math::OutlierMethod;
    use xsection_primitives::ReturnRecord;

    use super::*;
    use crate::{BinningConfig, ModelType, Quantiles};

    fn d(day: u32, month: u32) -> Date {
        Date::from_ymd_opt(2024, month, day).unwrap()
    }

    /// Five entities over three month ends; excess return is linear in the
    /// factor for 1m and inversely related for 3m.
    fn panels() -> (FactorPanel, ReturnPanel) {
        let sessions = [d(31, 1), d(29, 2), d(28, 3)];
        let symbols = ["A", "B", "C", "D", "E"];
        let mut sym_col = Vec::new();
        let mut date_col = Vec::new();
        let mut value_col = Vec::new();
        let mut records = Vec::new();
        for (k, &date) in sessions.iter().enumerate() {
            for (i, s) in symbols.iter().enumerate() {
                let value = (i as f64 + 1.0) * (k as f64 + 1.0);
                sym_col.push(*s);
                date_col.push(date.format("%Y%m%d").to_string());
                value_col.push(value);
                let weight = 1e9 * (i as f64 + 1.0);
                records.push(ReturnRecord::new((*s).into(), date, Horizon(1), 0.5 + 0.1 * value, weight));
                records.push(ReturnRecord::new((*s).into(), date, Horizon(3), (5 - i) as f64 + 0.01 * k as f64, weight));
            }
        }
        let df = df! {
            "symbol" => sym_col,
            "session_end" => date_col,
            "PAT_M" => value_col,
        }
        .unwrap();
        (FactorPanel::from_frame(&df, None).unwrap(), ReturnPanel::from_records(records))
    }

    #[rstest]
    #[case(ModelType::Ols, 1)]
    #[case(ModelType::Wls, 1)]
    #[case(ModelType::Rlm, 1)]
    #[case(ModelType::Wls, 4)]
    fn evaluates_every_group(#[case] model: ModelType, #[case] workers: usize) {
        let (factors, returns) = panels();
        let config = EvalConfig { model, workers, ..Default::default() };
        let evaluator = FactorEvaluator::new(config).unwrap();
        let evaluation = evaluator.evaluate(&factors, &returns).unwrap();

        assert_eq!(evaluation.horizons, vec![Horizon(1), Horizon(3)]);
        assert_eq!(evaluation.results.len(), 6);
        assert!(evaluation.skipped.is_empty());
        assert_eq!(evaluation.transformed.len(), 3);

        let keys: Vec<ResultKey> = evaluation.results.iter().map(RegressionResult::key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        for r in evaluation.results.iter().filter(|r| r.horizon == Horizon(1)) {
            assert!(r.loading > 0.0);
            assert_relative_eq!(r.ic, 1.0);
            assert_eq!(r.sample_count, 5);
        }
        for r in evaluation.results.iter().filter(|r| r.horizon == Horizon(3)) {
            assert!(r.loading < 0.0);
            assert_relative_eq!(r.ic, -1.0);
        }

        let summary = evaluator.summarize(&evaluation);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].n_sessions, 3);
        assert_relative_eq!(summary[0].ic_mean, 1.0);
    }

    #[test]
    fn single_entity_sessions_are_degenerate() {
        let df = df! {
            "symbol" => &["A", "A"],
            "session_end" => &["20240131", "20240229"],
            "PAT_M" => &[1.5, 2.5],
        }
        .unwrap();
        let factors = FactorPanel::from_frame(&df, None).unwrap();
        let returns = ReturnPanel::from_records([
            ReturnRecord::new("A".into(), d(31, 1), Horizon(1), 1.0, 1e9),
            ReturnRecord::new("A".into(), d(29, 2), Horizon(1), -1.0, 1e9),
        ]);

        let evaluator = FactorEvaluator::new(EvalConfig::default()).unwrap();
        let evaluation = evaluator.evaluate(&factors, &returns).unwrap();

        assert!(evaluation.results.is_empty());
        assert_eq!(evaluation.skipped.len(), 2);
        assert!(evaluation.skipped.iter().all(|s| s.reason.starts_with("degenerate group")));
        assert!(evaluator.summarize(&evaluation).is_empty());

        let err = evaluator
            .evaluate_session(&factors, &returns, &"PAT_M".into(), Horizon(1), d(31, 1))
            .unwrap_err();
        assert!(matches!(err, ModelError::DegenerateGroup(_)));
    }

    #[rstest]
    #[case(ModelType::Wls, 3)]
    #[case(ModelType::Ols, 4)]
    #[case(ModelType::Rlm, 4)]
    fn missing_weights_exclude_rows(#[case] model: ModelType, #[case] expected: usize) {
        let (factors, _) = panels();
        let records = ["A", "B", "C", "D", "E"].iter().enumerate().map(|(i, s)| {
            let weight = if i == 0 { 0.0 } else if i == 1 { f64::NAN } else { 1e9 };
            ReturnRecord::new((*s).into(), d(31, 1), Horizon(1), i as f64, weight)
        });
        let returns = ReturnPanel::from_records(records);

        // a zero weight only excludes the row from the weighted fit
        let evaluator = FactorEvaluator::new(EvalConfig { model, ..Default::default() }).unwrap();
        let fit = evaluator
            .evaluate_session(&factors, &returns, &"PAT_M".into(), Horizon(1), d(31, 1))
            .unwrap();
        assert_eq!(fit.joined.len(), expected);
        assert_eq!(fit.result().sample_count, expected);
        assert_eq!(fit.key, ResultKey::new("PAT_M".into(), Horizon(1), d(31, 1)));
    }

    #[test]
    fn configured_horizons_limit_evaluation() {
        let (factors, returns) = panels();
        let config = EvalConfig { horizons: vec![Horizon(3)], outlier: OutlierMethod::Mad, ..Default::default() };
        let evaluation = FactorEvaluator::new(config).unwrap().evaluate(&factors, &returns).unwrap();
        assert!(evaluation.results.iter().all(|r| r.horizon == Horizon(3)));
        assert_eq!(evaluation.results.len(), 3);
    }

    #[test]
    fn quantiles_follow_binning_config() {
        let (factors, returns) = panels();
        let evaluator = FactorEvaluator::new(EvalConfig::default()).unwrap();
        let evaluation = evaluator.evaluate(&factors, &returns).unwrap();
        assert!(evaluator.quantiles(&evaluation, &returns).unwrap().is_empty());

        let config = EvalConfig {
            binning: Some(BinningConfig { quantiles: Some(Quantiles::Count(5)), bins: None, lag: 1 }),
            ..Default::default()
        };
        let evaluator = FactorEvaluator::new(config).unwrap();
        let evaluation = evaluator.evaluate(&factors, &returns).unwrap();
        let analytics = evaluator.quantiles(&evaluation, &returns).unwrap();
        assert_eq!(analytics.len(), 1);
        // standardized ranks never change across sessions
        assert!(analytics[0].turnover.iter().all(|t| t.turnover == 0.0));
        assert!(analytics[0].spread.iter().all(|s| s.horizon != Horizon(1) || s.spread > 0.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EvalConfig { workers: 0, ..Default::default() };
        assert!(matches!(FactorEvaluator::new(config), Err(ModelError::Config(_))));
    }
}
