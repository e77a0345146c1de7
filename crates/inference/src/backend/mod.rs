use ndarray::{Array, IxDyn};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded model that maps a preprocessed input tensor to raw predictions.
///
/// `infer` takes `&self` so a single backend can serve concurrent requests;
/// implementations own whatever synchronization their runtime needs.
pub trait InferenceBackend: Send + Sync {
    /// Run inference with a `[1, 3, H, W]` CPU array input
    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub predictions: ndarray::ArrayD<f32>, // [1, 4 + num_classes, num_anchors] cxcywh in input pixels + class scores
}

/// Lock a runtime handle, taking it over even if a previous holder panicked.
///
/// A failed run leaves no partial state in the session, so the next request
/// can use it as is.
pub(crate) fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Recovering session lock after a panicked inference run");
        PoisonError::into_inner(poisoned)
    })
}
