//! Seams for device capabilities the app consumes but does not own.

use async_trait::async_trait;

/// Outcome of an image-pick interaction.
///
/// Cancellation and permission denial are ordinary outcomes, not errors;
/// only `Failed` represents something going wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePick {
    /// The user chose an image; the URI is stored on the note verbatim.
    Selected(String),
    Cancelled,
    /// The platform permission (camera or photo library) was refused.
    Denied,
    Failed(String),
}

/// Access to the platform's photo library and camera.
///
/// Each call runs one complete interaction and resolves with its outcome;
/// there are no callbacks to unregister. Platform crates implement this
/// per OS; tests use scripted fakes.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick_from_library(&self) -> ImagePick;
    async fn capture_photo(&self) -> ImagePick;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Replays a fixed sequence of outcomes, from either entry point.
    pub struct ScriptedPicker {
        outcomes: Mutex<Vec<ImagePick>>,
    }

    impl ScriptedPicker {
        pub fn new(outcomes: Vec<ImagePick>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
            }
        }

        async fn next(&self) -> ImagePick {
            let mut outcomes = self.outcomes.lock().await;
            if outcomes.is_empty() {
                ImagePick::Cancelled
            } else {
                outcomes.remove(0)
            }
        }
    }

    #[async_trait]
    impl ImagePicker for ScriptedPicker {
        async fn pick_from_library(&self) -> ImagePick {
            self.next().await
        }

        async fn capture_photo(&self) -> ImagePick {
            self.next().await
        }
    }
}
