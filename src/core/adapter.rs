use crate::core::error::ConversionError;
use crate::core::events::{EventSink, ProgressScope};
use crate::core::model::ConversionSettings;
use crate::core::paths::display_name;
use crate::plugins::registry::{BackendContext, TranscodeBackend, TranscodeRequest};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Single-file conversion on top of a [`TranscodeBackend`]: status messages,
/// clamped and monotonic per-item progress, and errors returned as values.
pub struct TranscodeAdapter {
    backend: Arc<dyn TranscodeBackend>,
    ctx: BackendContext,
}

impl TranscodeAdapter {
    pub fn new(backend: Arc<dyn TranscodeBackend>, ctx: BackendContext) -> Self {
        Self { backend, ctx }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        settings: &ConversionSettings,
        sink: &dyn EventSink,
    ) -> Result<(), ConversionError> {
        sink.log(format!("Loading video: {}", display_name(input)));
        if let Some(r) = settings.resolution {
            sink.log(format!("Resizing to {}x{}", r.width, r.height));
        }
        sink.log(format!("Converting to {}", display_name(output)));

        let req = TranscodeRequest {
            source: input.to_path_buf(),
            dest: output.to_path_buf(),
            resolution: settings.resolution,
            bitrate: settings.bitrate.clone(),
            codec: settings.codec.clone(),
        };

        // Highest value forwarded so far; regressions are dropped, repeats pass.
        let high = AtomicU8::new(0);
        let on_progress = |pct: u8| {
            let pct = pct.min(100);
            if high.fetch_max(pct, Ordering::AcqRel) <= pct {
                sink.percent(ProgressScope::Item, pct);
            }
        };

        debug!(backend = self.backend.name(), ?req, "transcode");
        match self.backend.transcode(&req, &self.ctx, &on_progress).await {
            Ok(()) => {
                sink.log("Conversion completed successfully!".to_string());
                Ok(())
            }
            Err(e) => {
                sink.log(format!("Error: {}", e));
                Err(e)
            }
        }
    }
}
