use crate::request::CopyDirection;

/// Copy operation state machine stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    Resolve,
    ReadMetadata,
    EmitSequences,
    ParseSequences,
    PersistOrPackage,
    Done,
}

#[derive(Debug, Clone)]
pub struct CopyProgressEvent {
    pub direction: CopyDirection,
    pub stage: CopyStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl CopyProgressEvent {
    pub fn stage(
        direction: CopyDirection,
        stage: CopyStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            direction,
            stage,
            elapsed_wall_s,
            message,
        }
    }
}

pub type ProgressCallback<'a> = Option<&'a mut dyn FnMut(CopyProgressEvent)>;

pub(crate) fn emit_progress(
    progress_cb: &mut ProgressCallback<'_>,
    direction: CopyDirection,
    stage: CopyStage,
    started: std::time::Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(CopyProgressEvent::stage(
            direction,
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}
