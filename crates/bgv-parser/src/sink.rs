//! Where decoded elements go, and who gets told about progress.
//!
//! The decoder never mutates a [`Document`] directly. Every finished group
//! and graph is handed to a [`DocumentSink`] together with the path of the
//! folder it belongs in. A plain `Document` attaches synchronously; a
//! [`DeferredSink`] packages each attachment as a task for a caller-supplied
//! [`Executor`], e.g. a UI thread's queue.

use std::sync::{Arc, Mutex};

use tracing::error;

use bgv_model::{Document, FolderElement, FolderPath, ModelError};

use crate::parser::ParserState;

/// Receives decoded elements in stream order.
pub trait DocumentSink {
    /// Attaches `element` as the last child of the folder at `parent`.
    fn add_element(&mut self, parent: &FolderPath, element: FolderElement) -> Result<(), ModelError>;
}

impl DocumentSink for Document {
    fn add_element(&mut self, parent: &FolderPath, element: FolderElement) -> Result<(), ModelError> {
        self.add_element_at(parent, element).map(|_| ())
    }
}

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs deferred attachments.
///
/// Implementations must run tasks in submission order; element paths are
/// only valid if every earlier attachment has been applied.
pub trait Executor {
    fn execute(&self, task: Task);
}

impl<F> Executor for F
where
    F: Fn(Task),
{
    fn execute(&self, task: Task) {
        self(task)
    }
}

/// Runs every task inline on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateExecutor;

impl Executor for ImmediateExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}

/// Sink that attaches to a shared document through an executor.
///
/// Attachment failures surface inside the task, after the decoder has
/// moved on, so they are logged rather than returned.
pub struct DeferredSink<E> {
    document: Arc<Mutex<Document>>,
    executor: E,
}

impl<E: Executor> DeferredSink<E> {
    pub fn new(document: Arc<Mutex<Document>>, executor: E) -> Self {
        DeferredSink { document, executor }
    }

    /// The shared document tasks attach into.
    pub fn document(&self) -> &Arc<Mutex<Document>> {
        &self.document
    }
}

impl<E: Executor> DocumentSink for DeferredSink<E> {
    fn add_element(&mut self, parent: &FolderPath, element: FolderElement) -> Result<(), ModelError> {
        let document = Arc::clone(&self.document);
        let parent = parent.clone();
        self.executor.execute(Box::new(move || {
            let mut document = match document.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = document.add_element_at(&parent, element) {
                error!(parent = %parent, error = %e, "deferred attachment failed");
            }
        }));
        Ok(())
    }
}

/// Progress and cancellation hooks. All methods default to no-ops.
pub trait ParseMonitor {
    /// Called when the decoder starts work on a named element.
    fn set_state(&mut self, _state: &str) {}

    /// Called whenever the decoder moves between [`ParserState`]s.
    fn state_changed(&mut self, _state: ParserState) {}

    /// Called after each top-level graph with the running graph count.
    fn graph_parsed(&mut self, _count: usize) {}

    /// Polled at every record boundary; `true` stops the parse cleanly.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A monitor that observes nothing and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl ParseMonitor for NoopMonitor {}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bgv_model::{Graph, Group};

    use super::*;

    #[test]
    fn document_sink_attaches_synchronously() {
        let mut doc = Document::new();
        doc.add_element(&FolderPath::root(), FolderElement::Group(Group::new("g")))
            .unwrap();
        doc.add_element(&FolderPath::root().child(0), FolderElement::Graph(Graph::new("t")))
            .unwrap();
        assert_eq!(doc.all_graphs().len(), 1);
    }

    #[test]
    fn document_sink_rejects_missing_parent() {
        let mut doc = Document::new();
        let err = doc
            .add_element(&FolderPath::root().child(3), FolderElement::Graph(Graph::new("t")))
            .unwrap_err();
        assert!(matches!(err, ModelError::FolderNotFound { .. }));
    }

    #[test]
    fn deferred_sink_waits_for_executor() {
        let queue: RefCell<Vec<Task>> = RefCell::new(Vec::new());
        let document = Arc::new(Mutex::new(Document::new()));
        {
            let mut sink = DeferredSink::new(Arc::clone(&document), |task: Task| {
                queue.borrow_mut().push(task)
            });
            sink.add_element(&FolderPath::root(), FolderElement::Graph(Graph::new("a")))
                .unwrap();
            sink.add_element(&FolderPath::root(), FolderElement::Graph(Graph::new("b")))
                .unwrap();
        }
        assert!(document.lock().unwrap().all_graphs().is_empty());

        for task in queue.into_inner() {
            task();
        }
        let doc = document.lock().unwrap();
        let titles: Vec<_> = doc.all_graphs().iter().map(|g| g.title.clone()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn immediate_executor_runs_inline() {
        let document = Arc::new(Mutex::new(Document::new()));
        let mut sink = DeferredSink::new(Arc::clone(&document), ImmediateExecutor);
        sink.add_element(&FolderPath::root(), FolderElement::Graph(Graph::new("a")))
            .unwrap();
        assert_eq!(sink.document().lock().unwrap().all_graphs().len(), 1);
    }
}
