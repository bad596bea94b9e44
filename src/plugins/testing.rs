//! Scripted backend for tests. Behaviour is chosen by the source file name:
//! `corrupt` fails, `panic` panics, `jitter` reports a regressing percentage,
//! anything else succeeds and writes the source name into the destination.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::error::ConversionError;
use crate::plugins::registry::{BackendContext, TranscodeBackend, TranscodeRequest};

#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<TranscodeRequest>>,
    delay: Duration,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<TranscodeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscodeBackend for ScriptedBackend {
    fn name(&self) -> &'static str { "scripted" }

    async fn transcode(
        &self,
        req: &TranscodeRequest,
        _ctx: &BackendContext,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), ConversionError> {
        self.calls.lock().unwrap().push(req.clone());
        let name = req.source.file_name().unwrap().to_string_lossy().to_string();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if name.contains("panic") {
            panic!("decoder crashed on {}", name);
        }
        if name.contains("corrupt") {
            on_progress(0);
            on_progress(40);
            return Err(ConversionError::Backend("moov atom not found".into()));
        }

        let steps: &[u8] = if name.contains("jitter") { &[0, 60, 30, 100] } else { &[0, 50, 50, 100] };
        for &p in steps {
            on_progress(p);
        }
        tokio::fs::write(&req.dest, name.as_bytes()).await?;
        Ok(())
    }
}
