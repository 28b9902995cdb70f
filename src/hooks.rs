//! Pre/post publish notifications.
//!
//! Listeners are passed explicitly into a publish run and invoked synchronously, in
//! registration order, before and after each file is pushed. A failing listener
//! aborts the run like any other error.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PublishError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    PrePublish,
    PostPublish,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStage::PrePublish => f.write_str("pre_publish"),
            PublishStage::PostPublish => f.write_str("post_publish"),
        }
    }
}

/// A notification about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishEvent {
    pub stage: PublishStage,
    /// Name of the publisher type that sent the event.
    pub publisher: &'static str,
    pub filename: PathBuf,
}

type Listener = Box<dyn Fn(&PublishEvent) -> anyhow::Result<()> + Send + Sync>;

/// Listeners for the `pre_publish` and `post_publish` channels.
#[derive(Default)]
pub struct PublishHooks {
    pre_publish: Vec<Listener>,
    post_publish: Vec<Listener>,
}

impl PublishHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pre_publish<F>(mut self, listener: F) -> Self
    where
        F: Fn(&PublishEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_publish.push(Box::new(listener));
        self
    }

    pub fn on_post_publish<F>(mut self, listener: F) -> Self
    where
        F: Fn(&PublishEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_publish.push(Box::new(listener));
        self
    }

    pub(crate) fn emit(
        &self,
        stage: PublishStage,
        publisher: &'static str,
        filename: &Path,
    ) -> Result<(), PublishError> {
        let listeners = match stage {
            PublishStage::PrePublish => &self.pre_publish,
            PublishStage::PostPublish => &self.post_publish,
        };
        if listeners.is_empty() {
            return Ok(());
        }

        let event = PublishEvent {
            stage,
            publisher,
            filename: filename.to_path_buf(),
        };
        for listener in listeners {
            listener(&event).map_err(PublishError::Listener)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PublishHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishHooks")
            .field("pre_publish", &self.pre_publish.len())
            .field("post_publish", &self.post_publish.len())
            .finish()
    }
}
