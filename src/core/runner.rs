use crate::core::adapter::TranscodeAdapter;
use crate::core::error::ConversionError;
use crate::core::events::{EventSink, ProgressEvent, ProgressScope};
use crate::core::model::*;
use crate::core::paths::{derive_output_path, display_name};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the items of one job, strictly one after another.
pub struct BatchRunner {
    adapter: Arc<TranscodeAdapter>,
}

impl BatchRunner {
    pub fn new(adapter: Arc<TranscodeAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn run_batch(
        &self,
        inputs: &[PathBuf],
        out_dir: &Path,
        settings: &ConversionSettings,
        sink: &dyn EventSink,
    ) -> BatchResult {
        let total = inputs.len();
        let mut result = BatchResult::new(total);
        let mut items: Vec<ConversionJobItem> = inputs
            .iter()
            .map(|input| ConversionJobItem::new(input.clone(), derive_output_path(input, out_dir, &settings.output_format)))
            .collect();

        info!(total, backend = self.adapter.backend_name(), out_dir = %out_dir.display(), "batch started");

        for (i, item) in items.iter_mut().enumerate() {
            let name = display_name(&item.input_path);
            sink.log(format!("Processing {}/{}: {}", i + 1, total, name));

            match self.process_item(i, item, settings, sink).await {
                Ok(()) => {
                    result.succeeded_count += 1;
                    sink.log(format!("✓ Completed: {}", name));
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(input = %item.input_path.display(), error = %message, "item failed");
                    sink.log(format!("✗ Failed: {} - {}", name, message));
                    result.failed_items.push(FailedItem { input_path: item.input_path.clone(), error_message: message });
                }
            }

            sink.percent(ProgressScope::Overall, ((i + 1) * 100 / total) as u8);
        }

        let summary = result.summary();
        info!(succeeded = result.succeeded_count, failed = result.failed_count(), "batch finished");
        sink.log(summary);
        result
    }

    /// The non-batch path: same derivation and invocation, reported as a flag and message.
    pub async fn run_single(
        &self,
        input: &Path,
        out_dir: &Path,
        settings: &ConversionSettings,
        sink: &dyn EventSink,
    ) -> SingleOutcome {
        let mut item = ConversionJobItem::new(
            input.to_path_buf(),
            derive_output_path(input, out_dir, &settings.output_format),
        );

        match self.process_item(0, &mut item, settings, sink).await {
            Ok(()) => SingleOutcome { success: true, message: "Conversion successful!".to_string() },
            Err(e) => {
                warn!(input = %input.display(), error = %e, "conversion failed");
                SingleOutcome { success: false, message: format!("Conversion failed: {}", e) }
            }
        }
    }

    /// Converts one item. A panic below this point is caught here and turned
    /// into [`ConversionError::Fault`].
    async fn process_item(
        &self,
        index: usize,
        item: &mut ConversionJobItem,
        settings: &ConversionSettings,
        sink: &dyn EventSink,
    ) -> Result<(), ConversionError> {
        item.transition(ItemStatus::Running, None);
        emit_status(sink, index, item);

        let outcome = AssertUnwindSafe(self.adapter.convert(&item.input_path, &item.output_path, settings, sink))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(r) => r,
            Err(payload) => {
                let e = ConversionError::Fault(describe_panic(payload.as_ref()));
                sink.log(format!("Error: {}", e));
                Err(e)
            }
        };

        match &result {
            Ok(()) => item.transition(ItemStatus::Succeeded, None),
            Err(e) => item.transition(ItemStatus::Failed, Some(e.to_string())),
        };
        emit_status(sink, index, item);
        result
    }
}

fn emit_status(sink: &dyn EventSink, index: usize, item: &ConversionJobItem) {
    sink.emit(ProgressEvent::ItemStatus { index, input: item.input_path.clone(), status: item.status });
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::CollectingSink;
    use crate::plugins::registry::BackendContext;
    use crate::plugins::testing::ScriptedBackend;
    use std::collections::BTreeSet;

    fn runner(backend: Arc<ScriptedBackend>) -> BatchRunner {
        BatchRunner::new(Arc::new(TranscodeAdapter::new(backend, BackendContext::default())))
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/in/{}", n))).collect()
    }

    #[tokio::test]
    async fn one_corrupt_item_does_not_stop_the_batch() {
        let out = tempfile::tempdir().unwrap();
        let sink = CollectingSink::new();
        let inputs = paths(&["a.mov", "corrupt.avi", "c.mkv"]);

        let result = runner(Arc::new(ScriptedBackend::new()))
            .run_batch(&inputs, out.path(), &ConversionSettings::default(), &sink)
            .await;

        assert_eq!(result.total_count, 3);
        assert_eq!(result.succeeded_count, 2);
        assert_eq!(
            result.failed_items,
            vec![FailedItem { input_path: inputs[1].clone(), error_message: "moov atom not found".into() }]
        );

        let logs = sink.logs();
        assert_eq!(logs.first().map(String::as_str), Some("Processing 1/3: a.mov"));
        assert!(logs.contains(&"✓ Completed: a.mov".to_string()));
        assert!(logs.contains(&"✗ Failed: corrupt.avi - moov atom not found".to_string()));
        assert!(logs.contains(&"Processing 3/3: c.mkv".to_string()));
        assert_eq!(logs.last().map(String::as_str), Some("Batch conversion completed: 2/3 successful, 1 failed"));

        assert!(out.path().join("a.mp4").exists());
        assert!(out.path().join("c.mp4").exists());
    }

    #[tokio::test]
    async fn overall_progress_is_one_step_per_item() {
        let out = tempfile::tempdir().unwrap();
        let sink = CollectingSink::new();
        let inputs = paths(&["a.mov", "corrupt.avi", "c.mkv"]);

        runner(Arc::new(ScriptedBackend::new()))
            .run_batch(&inputs, out.path(), &ConversionSettings::default(), &sink)
            .await;

        assert_eq!(sink.percents(ProgressScope::Overall), vec![33, 66, 100]);
    }

    #[tokio::test]
    async fn counts_are_conserved_for_many_sizes() {
        for n in 1..=7usize {
            let out = tempfile::tempdir().unwrap();
            let sink = CollectingSink::new();
            let inputs: Vec<PathBuf> = (0..n)
                .map(|i| {
                    if i % 3 == 1 { PathBuf::from(format!("/in/corrupt{}.mp4", i)) } else { PathBuf::from(format!("/in/v{}.mp4", i)) }
                })
                .collect();

            let result = runner(Arc::new(ScriptedBackend::new()))
                .run_batch(&inputs, out.path(), &ConversionSettings::default(), &sink)
                .await;

            assert_eq!(result.succeeded_count + result.failed_items.len(), n);
            let expected: Vec<u8> = (1..=n).map(|k| (k * 100 / n) as u8).collect();
            assert_eq!(sink.percents(ProgressScope::Overall), expected);
        }
    }

    #[tokio::test]
    async fn panicking_backend_is_recorded_as_failure() {
        let out = tempfile::tempdir().unwrap();
        let sink = CollectingSink::new();
        let inputs = paths(&["panic.mov", "b.mov"]);

        let result = runner(Arc::new(ScriptedBackend::new()))
            .run_batch(&inputs, out.path(), &ConversionSettings::default(), &sink)
            .await;

        assert_eq!(result.succeeded_count, 1);
        assert_eq!(result.failed_items.len(), 1);
        assert_eq!(result.failed_items[0].error_message, "unexpected fault: decoder crashed on panic.mov");
        assert_eq!(sink.percents(ProgressScope::Overall), vec![50, 100]);
    }

    #[tokio::test]
    async fn rerun_gives_the_same_outcome() {
        let inputs = paths(&["a.mov", "corrupt.avi", "c.mkv", "corrupt2.webm"]);
        let mut outcomes = vec![];
        for _ in 0..2 {
            let out = tempfile::tempdir().unwrap();
            let result = runner(Arc::new(ScriptedBackend::new()))
                .run_batch(&inputs, out.path(), &ConversionSettings::default(), &CollectingSink::new())
                .await;
            let failed: BTreeSet<PathBuf> = result.failed_items.iter().map(|f| f.input_path.clone()).collect();
            outcomes.push((result.succeeded_count, failed));
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }

    #[tokio::test]
    async fn shared_stem_overwrites_and_both_succeed() {
        let out = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let inputs = paths(&["clip.mov", "clip.mkv"]);

        let result = runner(backend.clone())
            .run_batch(&inputs, out.path(), &ConversionSettings::default(), &CollectingSink::new())
            .await;

        assert_eq!(result.succeeded_count, 2);
        let calls = backend.calls();
        assert_eq!(calls[0].dest, calls[1].dest);
        assert_eq!(std::fs::read_to_string(out.path().join("clip.mp4")).unwrap(), "clip.mkv");
    }

    #[tokio::test]
    async fn settings_reach_every_item_unchanged() {
        let out = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let settings = ConversionSettings::new(".mkv", None, Some("2000k".into()), Some("libvpx-vp9".into())).unwrap();

        runner(backend.clone())
            .run_batch(&paths(&["a.mp4", "b.avi"]), out.path(), &settings, &CollectingSink::new())
            .await;

        for call in backend.calls() {
            assert_eq!(call.resolution, None);
            assert_eq!(call.bitrate.as_deref(), Some("2000k"));
            assert_eq!(call.codec.as_deref(), Some("libvpx-vp9"));
            assert_eq!(call.dest.extension().unwrap(), "mkv");
        }
    }

    #[tokio::test]
    async fn item_statuses_follow_the_lifecycle() {
        let out = tempfile::tempdir().unwrap();
        let sink = CollectingSink::new();
        runner(Arc::new(ScriptedBackend::new()))
            .run_batch(&paths(&["a.mov", "corrupt.avi"]), out.path(), &ConversionSettings::default(), &sink)
            .await;

        let statuses: Vec<(usize, ItemStatus)> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::ItemStatus { index, status, .. } => Some((index, status)),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                (0, ItemStatus::Running),
                (0, ItemStatus::Succeeded),
                (1, ItemStatus::Running),
                (1, ItemStatus::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn single_path_reports_flag_and_message() {
        let out = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let r = runner(backend.clone());

        let ok = r.run_single(Path::new("/in/a.mov"), out.path(), &ConversionSettings::default(), &CollectingSink::new()).await;
        assert_eq!(ok, SingleOutcome { success: true, message: "Conversion successful!".into() });
        assert_eq!(backend.calls()[0].dest, out.path().join("a.mp4"));

        let sink = CollectingSink::new();
        let bad = r.run_single(Path::new("/in/corrupt.mov"), out.path(), &ConversionSettings::default(), &sink).await;
        assert!(!bad.success);
        assert_eq!(bad.message, "Conversion failed: moov atom not found");
        assert!(sink.percents(ProgressScope::Overall).is_empty());
    }
}
