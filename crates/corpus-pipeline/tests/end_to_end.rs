use chaos_engine::field_separators;
use corpus_archive::inspect::{read_entry, ArchiveListing};
use corpus_core::{
    AnomalyKind, ChaosAmount, ChaosConfig, Distribution, FileType, GenerationRequest,
    LoadFileFormat,
};
use corpus_pipeline::{CorpusPipeline, OutputOptions, PipelineError, RunManifest, RunReport};
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter("corpus_pipeline=debug,chaos_engine=debug")
        .try_init()
        .ok();
}

async fn generate(
    request: GenerationRequest,
    dir: &Path,
    name: &str,
) -> Result<RunReport, PipelineError> {
    CorpusPipeline::new(request, OutputOptions::new(dir).with_name(name))?
        .run()
        .await
}

fn listing(path: &Path) -> ArchiveListing {
    let mut file = File::open(path).unwrap();
    ArchiveListing::read(&mut file).unwrap()
}

fn data_lines(path: &Path) -> Vec<String> {
    let text = String::from_utf8(fs::read(path).unwrap()).unwrap();
    text.split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_ten_items_ten_folders() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let first = TempDir::new()?;
    let second = TempDir::new()?;
    let request = GenerationRequest::new(10).with_folders(10).with_seed(42);

    let report = generate(request.clone(), first.path(), "corpus").await?;
    let entries = listing(&report.paths.archive);
    assert_eq!(entries.entries.len(), 10);
    for (i, name) in entries.names().iter().enumerate() {
        assert!(
            name.starts_with(&format!("folder_{:03}/", i + 1)),
            "entry {name} in the wrong folder"
        );
    }

    let lines = data_lines(&report.paths.load_file);
    assert_eq!(lines.len(), 11);
    assert!(lines[0].contains("DOCID"));
    assert!(lines[0].contains("FILEPATH"));

    let again = generate(request, second.path(), "corpus").await?;
    assert_eq!(fs::read(&report.paths.archive)?, fs::read(&again.paths.archive)?);
    assert_eq!(
        fs::read(&report.paths.load_file)?,
        fs::read(&again.paths.load_file)?
    );
    assert_eq!(report.seed, 42);
    Ok(())
}

#[tokio::test]
async fn test_output_independent_of_concurrency() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let serial = TempDir::new()?;
    let parallel = TempDir::new()?;
    let mut request = GenerationRequest::new(200)
        .with_folders(7)
        .with_seed(1234)
        .with_file_type(FileType::Mixed)
        .with_distribution(Distribution::Gaussian);
    request.extended_fields = true;
    request.extracted_text = true;
    request.attachment_rate = 0.5;

    let one = generate(request.clone().with_concurrency(1), serial.path(), "run").await?;
    let many = generate(request.with_concurrency(8), parallel.path(), "run").await?;

    assert_eq!(fs::read(&one.paths.archive)?, fs::read(&many.paths.archive)?);
    assert_eq!(fs::read(&one.paths.load_file)?, fs::read(&many.paths.load_file)?);
    assert_eq!(listing(&one.paths.archive).entries.len(), 400);
    assert!(many.metrics.reorder_high_water <= 16);
    Ok(())
}

#[tokio::test]
async fn test_exponential_single_folder() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let dir = TempDir::new()?;
    let request = GenerationRequest::new(5000)
        .with_folders(1)
        .with_seed(9)
        .with_distribution(Distribution::Exponential)
        .with_file_type(FileType::Txt)
        .with_concurrency(4);

    let report = generate(request, dir.path(), "exp").await?;
    let entries = listing(&report.paths.archive);
    assert_eq!(entries.entries.len(), 5000);
    assert!(entries.names().iter().all(|n| n.starts_with("folder_001/")));
    assert!(!entries.zip64);
    assert_eq!(report.metrics.items_written, 5000);
    Ok(())
}

#[tokio::test]
async fn test_chaos_percentage_and_count() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let dir = TempDir::new()?;
    let request = GenerationRequest::new(100).with_seed(77).with_chaos(ChaosConfig {
        amount: ChaosAmount::Percent(10.0),
        types: Vec::new(),
        seed: None,
    });
    let report = generate(request, dir.path(), "pct").await?;
    let chaos = report.manifest.chaos_mode.as_ref().unwrap();
    assert!(chaos.enabled);
    assert_eq!(chaos.total_anomalies, 10);
    let mut lines: Vec<u64> = chaos
        .injected_anomalies
        .iter()
        .map(|r| r.line_index)
        .collect();
    lines.dedup();
    assert_eq!(lines.len(), 10);
    assert!(lines.windows(2).all(|w| w[0] < w[1]));

    let on_disk = RunManifest::from_file(&report.paths.run_manifest)?;
    assert_eq!(on_disk.chaos_mode, report.manifest.chaos_mode);

    let request = GenerationRequest::new(30).with_seed(77).with_chaos(ChaosConfig {
        amount: ChaosAmount::Count(5),
        types: vec![AnomalyKind::MixedDelimiters],
        seed: Some(5),
    });
    let report = generate(request, dir.path(), "count").await?;
    let chaos = report.manifest.chaos_mode.unwrap();
    assert_eq!(chaos.total_anomalies, 5);
    assert!(chaos
        .injected_anomalies
        .iter()
        .all(|r| r.kind == AnomalyKind::MixedDelimiters));

    // a mixed-delimiters line has exactly one column separator fewer
    let lines = data_lines(&report.paths.load_file);
    let expected = field_separators(&lines[1], '\u{14}', Some('\u{fe}')).len();
    for record in &chaos.injected_anomalies {
        let line = &lines[record.line_index as usize];
        assert_eq!(
            field_separators(line, '\u{14}', Some('\u{fe}')).len(),
            expected - 1
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_target_size_within_tolerance() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let dir = TempDir::new()?;
    let target = 4 * 1024 * 1024;
    let mut request = GenerationRequest::new(120)
        .with_seed(3)
        .with_folders(4)
        .with_file_type(FileType::Mixed);
    request.target_size = Some(target);

    let report = generate(request, dir.path(), "sized").await?;
    let size = fs::metadata(&report.paths.archive)?.len() as f64;
    let error = (size - target as f64).abs() / target as f64;
    assert!(error < 0.10, "archive is {size} bytes for a {target} byte target");
    Ok(())
}

#[tokio::test]
async fn test_manifest_in_archive() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let dir = TempDir::new()?;
    let mut request = GenerationRequest::new(25)
        .with_seed(11)
        .with_format(LoadFileFormat::Csv);
    request.manifest_in_archive = true;

    let report = generate(request, dir.path(), "embedded").await?;
    assert!(!report.paths.load_file.exists());
    let mut file = File::open(&report.paths.archive)?;
    let entries = ArchiveListing::read(&mut file)?;
    assert_eq!(entries.entries.len(), 26);
    let last = entries.entries.last().unwrap();
    assert_eq!(last.name, "embedded.csv");
    let csv = String::from_utf8(read_entry(&mut file, last)?)?;
    assert_eq!(csv.lines().count(), 26);
    assert!(report.manifest.manifest_in_archive);
    Ok(())
}

#[tokio::test]
async fn test_opt_has_no_header() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let dir = TempDir::new()?;
    let request = GenerationRequest::new(12)
        .with_seed(4)
        .with_format(LoadFileFormat::Opt)
        .with_file_type(FileType::Tiff);
    let report = generate(request, dir.path(), "images").await?;
    let lines = data_lines(&report.paths.load_file);
    assert_eq!(lines.len(), 12);
    assert!(lines[0].starts_with("DOC00000001,VOL001,"));
    Ok(())
}

#[tokio::test]
async fn test_config_errors_leave_no_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("out");

    let err = CorpusPipeline::new(GenerationRequest::new(0), OutputOptions::new(&out))
        .err()
        .unwrap();
    assert!(matches!(err, PipelineError::Config(_)));

    let request = GenerationRequest::new(10)
        .with_format(LoadFileFormat::Xml)
        .with_chaos(ChaosConfig {
            amount: ChaosAmount::Count(1),
            types: Vec::new(),
            seed: None,
        });
    assert!(CorpusPipeline::new(request, OutputOptions::new(&out)).is_err());
    assert!(!out.exists());
    Ok(())
}

#[tokio::test]
async fn test_io_failure_removes_partials() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    // the output "directory" is a regular file
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"x")?;

    let request = GenerationRequest::new(5).with_seed(1);
    let result = generate(request, &blocker, "fail").await;
    assert!(matches!(result, Err(PipelineError::Io(_))));
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}
