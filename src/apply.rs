use crate::config::Config;
use crate::credentials::CredentialsProvider;
use crate::document::{Document, Insertion};
use crate::error::{ApplyError, Result};
use crate::filter;
use crate::integrations::google::DriveClient;
use crate::markers::{SubtaskMarker, last_review_line, note_line};
use crate::models::{ApplyReport, Decision, DecisionRecord, Outcome, Suggestion};
use crate::storage;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub struct RunOptions {
    /// Target file name as given on the command line; only logged.
    pub file: String,
    pub apply: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub backup_path: PathBuf,
    pub records_path: PathBuf,
    pub report: ApplyReport,
    pub uploaded: bool,
}

pub struct Placement<'a> {
    pub threshold: f64,
    pub match_floor: f64,
    pub source_model: &'a str,
    pub now: DateTime<Utc>,
}

/// Filters every suggestion and places accepted ones into `document`.
pub fn place_suggestions(
    document: &mut Document,
    suggestions: &[Suggestion],
    placement: &Placement<'_>,
) -> Result<(Vec<DecisionRecord>, ApplyReport)> {
    let mut records = Vec::with_capacity(suggestions.len());
    let mut report = ApplyReport::default();

    for suggestion in suggestions {
        let eval = filter::evaluate(suggestion, placement.threshold);
        tracing::debug!(
            original = %suggestion.original,
            title = %eval.title,
            similarity = eval.similarity,
            actionable = eval.actionable,
            decision = ?eval.decision,
            "evaluated suggestion"
        );

        let outcome = match eval.decision {
            Decision::Insert => place_one(document, suggestion, &eval.title, placement)?,
            skipped => Outcome::from(skipped),
        };
        report.record(outcome);

        records.push(DecisionRecord {
            original: suggestion.original.clone(),
            title: eval.title,
            similarity: eval.similarity,
            actionable: eval.actionable,
            decision: eval.decision,
            outcome,
        });
    }

    Ok((records, report))
}

fn place_one(
    document: &mut Document,
    suggestion: &Suggestion,
    title: &str,
    placement: &Placement<'_>,
) -> Result<Outcome> {
    let Some(found) = document.best_match(&suggestion.original, placement.match_floor) else {
        tracing::debug!(original = %suggestion.original, "no document line above match floor");
        return Ok(Outcome::SkippedNoMatch);
    };

    let marker = SubtaskMarker::new(
        &suggestion.original,
        title,
        placement.source_model,
        placement.now,
    );
    let comment = marker.to_comment()?;
    let outcome = match document.insert_after(found.index, note_line(title), comment) {
        Insertion::Inserted(at) => {
            tracing::info!(
                id = %marker.id,
                line = at,
                score = found.score,
                "placed subtask marker"
            );
            Outcome::Placed
        }
        Insertion::AlreadyPresent => {
            tracing::debug!(title, "marker already present near target line");
            Outcome::AlreadyPresent
        }
    };
    Ok(outcome)
}

/// One full pass: fetch, back up, annotate, record, and upload when asked.
pub fn run(
    config: &Config,
    credentials: &dyn CredentialsProvider,
    options: &RunOptions,
) -> Result<RunSummary> {
    let batch = storage::load_suggestions(&config.paths.suggestions)?;
    let entry = batch
        .file_suggestions
        .first()
        .ok_or(ApplyError::NoFileSuggestions)?;
    let now = Utc::now();

    let drive = DriveClient::connect(&config.drive, &credentials.load()?)?;
    let metadata = drive.fetch_metadata(&entry.file_id)?;
    tracing::info!(
        file = %options.file,
        file_id = %entry.file_id,
        remote_id = %metadata.id,
        remote_name = metadata.name.as_deref().unwrap_or(""),
        modified = metadata.modified_time.as_deref().unwrap_or(""),
        revision = metadata.head_revision_id.as_deref().unwrap_or(""),
        "fetched file metadata"
    );
    let content = drive.download(&entry.file_id)?;

    let backup_path =
        storage::write_backup(&config.paths.backups_dir(), &entry.file_id, &content, now)?;
    println!("Backup written to {}", backup_path.display());

    let mut document = Document::parse(&content);
    let placement = Placement {
        threshold: config.policy.threshold,
        match_floor: config.policy.match_floor,
        source_model: batch.source_model(entry, &config.policy.model),
        now,
    };
    let (records, report) = place_suggestions(&mut document, &entry.suggestions, &placement)?;
    document.stamp_header(last_review_line(
        now,
        &config.policy.model,
        batch.generated_at(entry),
    ));
    tracing::info!("{}", report.summary());

    let records_path =
        storage::write_records(&config.paths.records_dir(), &entry.file_id, &records, now)?;

    if options.apply {
        drive.upload(&entry.file_id, document.render(), metadata.upload_mime_type())?;
        println!("Applied, inserted {}", report.placed);
    } else {
        println!("Dry-run would insert {}", report.placed);
    }
    println!("Records -> {}", records_path.display());

    Ok(RunSummary {
        backup_path,
        records_path,
        report,
        uploaded: options.apply,
    })
}
