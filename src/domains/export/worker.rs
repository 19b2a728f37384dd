use std::sync::Arc;

use uuid::Uuid;

use crate::domains::export::registry::TaskRegistry;
use crate::domains::export::sheet::SheetRecord;
use crate::domains::export::types::ExportError;
use crate::domains::export::writer::ArtifactWriter;
use crate::domains::report::filter::FilterSpec;
use crate::domains::report::repository::ReportRepository;
use crate::domains::report::types::CellRecord;

/// Drive one export to a terminal state.
///
/// Never returns an error to the spawner: any failure is recorded on the
/// task and the partial artifact is removed. Either way the task ends
/// terminal, so pollers always converge.
pub(crate) async fn run(
    repo: Arc<dyn ReportRepository>,
    registry: Arc<TaskRegistry>,
    writer: Box<dyn ArtifactWriter>,
    task_id: Uuid,
    filter: FilterSpec,
    batch_size: i64,
) {
    let artifact_path = writer.path().to_path_buf();

    match run_inner(repo, &registry, writer, task_id, &filter, batch_size).await {
        Ok(()) => {
            registry.complete(task_id, artifact_path);
            log::info!("Export task {} completed", task_id);
        }
        Err(e) => {
            log::error!("Export task {} failed: {}", task_id, e);
            registry.fail(task_id, e.to_string());
            // Best-effort cleanup; the file may not exist yet.
            let _ = std::fs::remove_file(&artifact_path);
        }
    }
}

async fn run_inner(
    repo: Arc<dyn ReportRepository>,
    registry: &TaskRegistry,
    mut writer: Box<dyn ArtifactWriter>,
    task_id: Uuid,
    filter: &FilterSpec,
    batch_size: i64,
) -> Result<(), ExportError> {
    let total = repo.count_matching(filter).await?;
    let stats = repo.summary(filter).await?;

    writer.write_summary(total, &stats)?;
    writer.write_header(&CellRecord::headers())?;

    let mut offset: i64 = 0;
    loop {
        let batch = repo.fetch_batch(filter, offset, batch_size).await?;
        if batch.is_empty() {
            break;
        }

        for record in &batch {
            writer.append_row(&record.to_row())?;
        }
        offset += batch.len() as i64;

        // Capped at 99 until finalize succeeds; 100 means downloadable.
        if total > 0 {
            let pct = (offset * 100 / total).min(99) as u8;
            registry.set_progress(task_id, pct);
        }
    }

    writer.finalize()?;
    Ok(())
}
