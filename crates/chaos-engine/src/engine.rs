use crate::anomaly::{self, EmittedLine, LineShape};
use crate::error::ChaosError;
use crate::record::AnomalyRecord;
use crate::selection::{line_rng, select_lines};
use corpus_core::{AnomalyKind, ChaosAmount, ChaosConfig, Delimiters, LoadFileFormat, TextEncoding};
use corpus_generator::ItemSeeder;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Per-run fault injector.
///
/// Built once before the first line is written; the writer then passes every
/// data line through [`ChaosEngine::intercept`] in ascending order.
#[derive(Debug)]
pub struct ChaosEngine {
    plan: BTreeMap<u64, AnomalyKind>,
    kinds: Vec<AnomalyKind>,
    seeder: ItemSeeder,
    delimiters: Delimiters,
    encoding: TextEncoding,
    records: Vec<AnomalyRecord>,
}

impl ChaosEngine {
    /// Resolve the enabled types and select the lines to corrupt.
    ///
    /// `total` is the number of data lines; `run_seed` is used when the
    /// configuration has no seed of its own.
    pub fn new(
        config: &ChaosConfig,
        format: LoadFileFormat,
        delimiters: Delimiters,
        encoding: TextEncoding,
        total: u64,
        run_seed: u64,
    ) -> Result<Self, ChaosError> {
        if !format.is_line_oriented() {
            return Err(ChaosError::UnsupportedFormat(format));
        }
        if let Some(kind) = config.types.iter().find(|k| !k.applies_to(format)) {
            return Err(ChaosError::InapplicableType {
                kind: *kind,
                format,
            });
        }

        let mut kinds = if config.types.is_empty() {
            AnomalyKind::defaults_for(format)
        } else {
            let mut kinds = config.types.clone();
            kinds.sort();
            kinds.dedup();
            kinds
        };
        if delimiters.quote.is_none() && kinds.contains(&AnomalyKind::Quotes) {
            kinds.retain(|k| *k != AnomalyKind::Quotes);
            if config.types.contains(&AnomalyKind::Quotes) {
                warn!("Quote delimiter is none; 'quotes' anomalies are disabled");
            }
        }
        if kinds.is_empty() {
            warn!("No applicable anomaly types remain; chaos mode will not modify any line");
        }

        let amount = config.amount.resolve(total);
        if let ChaosAmount::Count(requested) = config.amount {
            if requested > total {
                warn!(
                    "Chaos amount {} exceeds {} data lines; clamped to {}",
                    requested, total, amount
                );
            }
        }

        let seed = config.seed.unwrap_or(run_seed);
        let plan = select_lines(total, amount, &kinds, seed);
        info!(
            "Chaos mode: {} of {} lines selected ({}), seed {}",
            plan.len(),
            total,
            kinds
                .iter()
                .map(AnomalyKind::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            seed
        );

        Ok(Self {
            plan,
            kinds,
            seeder: ItemSeeder::new(seed),
            delimiters,
            encoding,
            records: Vec::new(),
        })
    }

    /// Number of lines that will be corrupted.
    pub fn planned(&self) -> u64 {
        self.plan.len() as u64
    }

    /// Selected lines and their anomaly types, ascending.
    pub fn plan(&self) -> &BTreeMap<u64, AnomalyKind> {
        &self.plan
    }

    pub fn enabled_kinds(&self) -> &[AnomalyKind] {
        &self.kinds
    }

    /// Pass one formatted data line through the engine.
    pub fn intercept(&mut self, line_index: u64, line: String) -> EmittedLine {
        let Some(kind) = self.plan.get(&line_index).copied() else {
            return EmittedLine::Text(line);
        };
        let (_, mut rng) = line_rng(&self.seeder, line_index, self.kinds.len());
        let shape = LineShape {
            column: self.delimiters.column,
            quote: self.delimiters.quote,
            eol: self.delimiters.eol.as_str(),
            encoding: self.encoding,
        };
        let corruption = anomaly::apply(kind, &line, &shape, &mut rng);
        debug!(
            "Line {}: {} anomaly, {}",
            line_index, kind, corruption.description
        );
        self.records.push(AnomalyRecord {
            line_index,
            kind,
            description: corruption.description,
        });
        corruption.line
    }

    /// Anomalies injected so far, in line order.
    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnomalyRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(amount: &str, types: &[AnomalyKind]) -> ChaosConfig {
        ChaosConfig {
            amount: amount.parse().unwrap(),
            types: types.to_vec(),
            seed: None,
        }
    }

    fn engine(config: &ChaosConfig, format: LoadFileFormat, total: u64) -> ChaosEngine {
        ChaosEngine::new(
            config,
            format,
            Delimiters::for_format(format),
            TextEncoding::Utf8,
            total,
            42,
        )
        .unwrap()
    }

    fn run(engine: &mut ChaosEngine, total: u64, line: &str) -> Vec<EmittedLine> {
        (1..=total)
            .map(|i| engine.intercept(i, line.to_string()))
            .collect()
    }

    const DAT_LINE: &str = "\u{FE}DOC00000001\u{FE}\u{14}\u{FE}folder_001/DOC00000001.pdf\u{FE}\u{14}\u{FE}2\u{FE}";

    #[test]
    fn test_ten_percent_of_hundred() {
        let mut e = engine(&config("10%", &[]), LoadFileFormat::Dat, 100);
        assert_eq!(e.planned(), 10);
        let lines = run(&mut e, 100, DAT_LINE);
        let changed = lines
            .iter()
            .filter(|l| l.as_text() != Some(DAT_LINE))
            .count();
        assert_eq!(changed, 10);
        assert_eq!(e.records().len(), 10);
        let indices: Vec<u64> = e.records().iter().map(|r| r.line_index).collect();
        let mut sorted = indices.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(indices, sorted);
    }

    #[test]
    fn test_exact_count() {
        for total in [5, 100, 1000] {
            let mut e = engine(&config("5", &[]), LoadFileFormat::Dat, total);
            run(&mut e, total, DAT_LINE);
            assert_eq!(e.records().len(), 5);
        }
    }

    #[test]
    fn test_amount_clamped() {
        let e = engine(&config("50", &[]), LoadFileFormat::Dat, 20);
        assert_eq!(e.planned(), 20);
    }

    #[test]
    fn test_subset_respected() {
        let subset = [AnomalyKind::Eol, AnomalyKind::Columns];
        let mut e = engine(&config("50%", &subset), LoadFileFormat::Csv, 200);
        run(&mut e, 200, "\"a\",\"b\",\"c\"");
        assert!(e.records().iter().all(|r| subset.contains(&r.kind)));
    }

    #[test]
    fn test_opt_defaults_exclude_quotes() {
        let e = engine(&config("10", &[]), LoadFileFormat::Opt, 100);
        assert!(!e.enabled_kinds().contains(&AnomalyKind::Quotes));
        assert!(e.enabled_kinds().contains(&AnomalyKind::OptPagecount));
    }

    #[test]
    fn test_quotes_only_without_quote_selects_nothing() {
        let delimiters = Delimiters {
            quote: None,
            ..Delimiters::for_format(LoadFileFormat::Dat)
        };
        let e = ChaosEngine::new(
            &config("10", &[AnomalyKind::Quotes]),
            LoadFileFormat::Dat,
            delimiters,
            TextEncoding::Utf8,
            100,
            1,
        )
        .unwrap();
        assert_eq!(e.planned(), 0);
    }

    #[test]
    fn test_rejects_xml_and_inapplicable_types() {
        let xml = ChaosEngine::new(
            &config("1", &[]),
            LoadFileFormat::Xml,
            Delimiters::for_format(LoadFileFormat::Xml),
            TextEncoding::Utf8,
            10,
            1,
        );
        assert!(matches!(xml, Err(ChaosError::UnsupportedFormat(_))));

        let opt_on_dat = ChaosEngine::new(
            &config("1", &[AnomalyKind::OptBoundary]),
            LoadFileFormat::Dat,
            Delimiters::for_format(LoadFileFormat::Dat),
            TextEncoding::Utf8,
            10,
            1,
        );
        assert!(matches!(opt_on_dat, Err(ChaosError::InapplicableType { .. })));
    }

    #[test]
    fn test_same_seed_same_corruption() {
        let cfg = ChaosConfig {
            seed: Some(7),
            ..config("20%", &[])
        };
        let mut a = engine(&cfg, LoadFileFormat::Dat, 50);
        let mut b = engine(&cfg, LoadFileFormat::Dat, 50);
        assert_eq!(run(&mut a, 50, DAT_LINE), run(&mut b, 50, DAT_LINE));
        assert_eq!(a.into_records(), b.into_records());
    }
}
