use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use super::ic_backend::{BackendError, ConversionBackend, ConversionSettings};
use super::ic_format::{ConvertPolicy, TargetFormat};
use super::ic_progress::Progress;
use super::ic_registry::{FileRegistry, FileStatus, SelectedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
}

/// The selection plus the run state. Only the orchestrator and the
/// registry operations below write file status.
#[derive(Debug, Default)]
pub struct Batch {
    files: FileRegistry,
    state: BatchState,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[SelectedFile] {
        self.files.files()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_converting(&self) -> bool {
        self.state == BatchState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == BatchState::Completed
    }

    /// Merges a new selection. Selecting files after a completed run starts a
    /// fresh batch. Ignored while a run is in progress.
    pub fn add_files(&mut self, incoming: Vec<SelectedFile>) -> usize {
        if self.is_converting() || incoming.is_empty() {
            return 0;
        }
        let added = self.files.add_files(incoming, self.is_complete());
        self.state = BatchState::Idle;
        added
    }

    pub fn remove_file(&mut self, path: &str) {
        if self.is_converting() {
            return;
        }
        self.files.remove_file(path);
    }

    pub fn clear_all(&mut self) {
        if self.is_converting() {
            return;
        }
        self.files.clear();
        self.state = BatchState::Idle;
    }

    pub fn progress(&self, target: TargetFormat, policy: ConvertPolicy) -> Progress {
        Progress::compute(self.files.files(), target, policy)
    }

    pub fn convertible_count(&self, target: TargetFormat, policy: ConvertPolicy) -> usize {
        self.files
            .files()
            .iter()
            .filter(|f| policy.can_convert(f, target))
            .count()
    }
}

/// Everything a run needs, captured once when it starts.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub target: TargetFormat,
    pub policy: ConvertPolicy,
    pub settings: ConversionSettings,
}

pub type SharedBatch = Arc<Mutex<Batch>>;

pub fn lock_batch(batch: &Mutex<Batch>) -> MutexGuard<'_, Batch> {
    batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives a run: one worker thread, one backend call per convertible file,
/// strictly in selection order.
pub struct Orchestrator {
    batch: SharedBatch,
    backend: Arc<dyn ConversionBackend>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ConversionBackend>) -> Self {
        Self {
            batch: Arc::new(Mutex::new(Batch::new())),
            backend,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Batch> {
        lock_batch(&self.batch)
    }

    /// Same as `Batch::clear_all`.
    pub fn reset(&self) {
        self.lock().clear_all();
    }

    /// Starts a run on a worker thread. Returns `None` without touching
    /// anything when a run is already in progress.
    pub fn start(&self, job: BatchJob) -> Option<JoinHandle<()>> {
        let paths = {
            let mut batch = self.lock();
            if batch.is_converting() {
                return None;
            }
            batch.state = BatchState::Running;

            let paths: Vec<String> = batch
                .files
                .files()
                .iter()
                .filter(|f| job.policy.can_convert(f, job.target))
                .map(|f| f.path.clone())
                .collect();
            for path in &paths {
                batch.files.set_status(path, FileStatus::Idle);
            }
            paths
        };

        let batch = Arc::clone(&self.batch);
        let backend = Arc::clone(&self.backend);
        Some(thread::spawn(move || {
            run_batch(&batch, backend.as_ref(), &job, &paths);
        }))
    }
}

fn run_batch(batch: &Mutex<Batch>, backend: &dyn ConversionBackend, job: &BatchJob, paths: &[String]) {
    log::info!("Converting {} files to {}", paths.len(), job.target.as_str());

    let mut failed = 0;
    for path in paths {
        lock_batch(batch).files.set_status(path, FileStatus::Converting);

        let status = convert_one(backend, job, path);
        if let FileStatus::Error(message) = &status {
            log::warn!("Failed to convert {}: {}", path, message);
            failed += 1;
        }

        lock_batch(batch).files.set_status(path, status);
    }

    lock_batch(batch).state = BatchState::Completed;
    log::info!("Conversion finished: {} succeeded, {} failed", paths.len() - failed, failed);
}

fn convert_one(backend: &dyn ConversionBackend, job: &BatchJob, path: &str) -> FileStatus {
    let request = [path.to_string()];
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        backend.convert_images(&request, job.target, &job.settings)
    }))
    .unwrap_or_else(|payload| Err(BackendError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(results) => match results.into_iter().find(|r| r.source_path == path) {
            Some(result) if result.success => FileStatus::Success,
            Some(result) => FileStatus::Error(result.error.unwrap_or_else(|| "Unknown error".to_string())),
            None => FileStatus::Error(BackendError::EmptyResponse(path.to_string()).to_string()),
        },
        Err(e) => FileStatus::Error(e.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_converter::ic_backend::ConversionResult;
    use crate::modules::image_converter::ic_format::ConflictResolution;
    use std::collections::HashMap;
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Clone)]
    enum Reply {
        Ok,
        Fail(&'static str),
        Throw(&'static str),
        Panic(&'static str),
        Nothing,
    }

    struct ScriptedBackend {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<(Vec<String>, ConversionSettings)>>,
    }

    impl ScriptedBackend {
        fn new(replies: &[(&str, Reply)]) -> Self {
            Self {
                replies: replies.iter().map(|(p, r)| (p.to_string(), r.clone())).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ConversionBackend for ScriptedBackend {
        fn convert_images(
            &self,
            paths: &[String],
            _target: TargetFormat,
            settings: &ConversionSettings,
        ) -> Result<Vec<ConversionResult>, BackendError> {
            self.calls.lock().unwrap().push((paths.to_vec(), settings.clone()));
            let path = &paths[0];
            match self.replies.get(path).cloned().unwrap_or(Reply::Ok) {
                Reply::Ok => Ok(vec![ConversionResult::succeeded(path.as_str(), "/out/file")]),
                Reply::Fail(message) => Ok(vec![ConversionResult::failed(path.as_str(), message)]),
                Reply::Throw(message) => Err(BackendError::Unavailable(message.to_string())),
                Reply::Panic(message) => panic!("{}", message),
                Reply::Nothing => Ok(vec![]),
            }
        }
    }

    /// Blocks every call until the test lets it through.
    struct GatedBackend {
        gate: Mutex<Receiver<()>>,
    }

    impl GatedBackend {
        fn new() -> (Self, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            (Self { gate: Mutex::new(rx) }, tx)
        }
    }

    impl ConversionBackend for GatedBackend {
        fn convert_images(
            &self,
            paths: &[String],
            _target: TargetFormat,
            _settings: &ConversionSettings,
        ) -> Result<Vec<ConversionResult>, BackendError> {
            let _ = self.gate.lock().unwrap().recv();
            Ok(vec![ConversionResult::succeeded(paths[0].as_str(), "/out/file")])
        }
    }

    fn job(target: TargetFormat) -> BatchJob {
        BatchJob {
            target,
            policy: ConvertPolicy::Strict,
            settings: ConversionSettings {
                output_path: "/out".to_string(),
                file_prefix: String::new(),
                conflict_resolution: ConflictResolution::Numbering,
                quality: 85,
                lossless: false,
            },
        }
    }

    fn files(paths: &[&str]) -> Vec<SelectedFile> {
        paths.iter().map(|p| SelectedFile::new(*p, 1)).collect()
    }

    fn statuses(orchestrator: &Orchestrator) -> Vec<Option<FileStatus>> {
        orchestrator.lock().files().iter().map(|f| f.status.clone()).collect()
    }

    #[test]
    fn test_mixed_outcomes_all_reach_terminal_state() {
        let backend = Arc::new(ScriptedBackend::new(&[
            ("/one.png", Reply::Ok),
            ("/two.png", Reply::Fail("decode error")),
            ("/three.png", Reply::Throw("ipc closed")),
        ]));
        let orchestrator = Orchestrator::new(backend.clone());
        orchestrator.lock().add_files(files(&["/one.png", "/two.png", "/three.png"]));

        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();

        let batch = orchestrator.lock();
        assert_eq!(batch.state(), BatchState::Completed);
        assert_eq!(batch.files()[0].status, Some(FileStatus::Success));
        assert_eq!(batch.files()[1].error(), Some("decode error"));
        assert_eq!(batch.files()[2].error(), Some("Backend unavailable: ipc closed"));
        assert_eq!(batch.progress(TargetFormat::Webp, ConvertPolicy::Strict).percent, 100);
    }

    #[test]
    fn test_calls_are_sequential_single_path_in_registry_order() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let orchestrator = Orchestrator::new(backend.clone());
        orchestrator.lock().add_files(files(&["/b.png", "/a.jpg", "/c.avif"]));

        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();

        let calls = backend.calls.lock().unwrap();
        let requested: Vec<Vec<String>> = calls.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            requested,
            vec![vec!["/b.png".to_string()], vec!["/a.jpg".to_string()], vec!["/c.avif".to_string()]]
        );
        assert!(calls.iter().all(|(_, s)| s.quality == 85 && s.output_path == "/out"));
    }

    #[test]
    fn test_non_convertible_files_are_untouched() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let orchestrator = Orchestrator::new(backend.clone());
        orchestrator.lock().add_files(files(&["/a.png", "/b.jpeg", "/c"]));

        orchestrator.start(job(TargetFormat::Jpg)).unwrap().join().unwrap();

        assert_eq!(statuses(&orchestrator), vec![Some(FileStatus::Success), None, None]);
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_panicking_backend_does_not_stall_the_run() {
        let backend = Arc::new(ScriptedBackend::new(&[("/a.png", Reply::Panic("codec exploded"))]));
        let orchestrator = Orchestrator::new(backend);
        orchestrator.lock().add_files(files(&["/a.png", "/b.png"]));

        orchestrator.start(job(TargetFormat::Avif)).unwrap().join().unwrap();

        let batch = orchestrator.lock();
        assert!(batch.is_complete());
        assert_eq!(batch.files()[0].error(), Some("Backend panicked: codec exploded"));
        assert_eq!(batch.files()[1].status, Some(FileStatus::Success));
    }

    #[test]
    fn test_missing_result_is_an_error() {
        let backend = Arc::new(ScriptedBackend::new(&[("/a.png", Reply::Nothing)]));
        let orchestrator = Orchestrator::new(backend);
        orchestrator.lock().add_files(files(&["/a.png"]));

        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();

        assert_eq!(
            orchestrator.lock().files()[0].error(),
            Some("Backend returned no result for /a.png")
        );
    }

    #[test]
    fn test_second_start_while_running_is_a_no_op() {
        let (backend, gate) = GatedBackend::new();
        let orchestrator = Orchestrator::new(Arc::new(backend));
        orchestrator.lock().add_files(files(&["/a.png", "/b.png"]));

        let handle = orchestrator.start(job(TargetFormat::Webp)).unwrap();
        assert!(orchestrator.lock().is_converting());

        let before = orchestrator.lock().files().to_vec();
        assert!(orchestrator.start(job(TargetFormat::Avif)).is_none());
        assert!(orchestrator.lock().is_converting());

        // Registry mutations are refused mid-run, so the snapshot can only
        // differ by the worker's own status updates.
        orchestrator.lock().add_files(files(&["/c.png"]));
        orchestrator.reset();
        let after: Vec<String> = orchestrator.lock().files().iter().map(|f| f.path.clone()).collect();
        let before: Vec<String> = before.iter().map(|f| f.path.clone()).collect();
        assert_eq!(after, before);

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        handle.join().unwrap();
        assert!(orchestrator.lock().is_complete());
    }

    #[test]
    fn test_reset_after_completion_starts_fresh_batch() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let orchestrator = Orchestrator::new(backend);
        orchestrator.lock().add_files(files(&["/a.png"]));
        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();
        assert!(orchestrator.lock().is_complete());

        orchestrator.reset();
        {
            let batch = orchestrator.lock();
            assert!(batch.files().is_empty());
            assert_eq!(batch.state(), BatchState::Idle);
        }

        orchestrator.lock().add_files(files(&["/b.png"]));
        let batch = orchestrator.lock();
        assert_eq!(batch.files().len(), 1);
        assert_eq!(batch.files()[0].status, None);
    }

    #[test]
    fn test_adding_after_completion_replaces_previous_results() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let orchestrator = Orchestrator::new(backend);
        orchestrator.lock().add_files(files(&["/a.png", "/b.png"]));
        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();

        let added = orchestrator.lock().add_files(files(&["/a.png"]));
        let batch = orchestrator.lock();
        assert_eq!(added, 1);
        assert_eq!(batch.state(), BatchState::Idle);
        assert_eq!(batch.files().len(), 1);
        assert_eq!(batch.files()[0].status, None);
    }

    #[test]
    fn test_rerun_retries_failed_files() {
        let backend = Arc::new(ScriptedBackend::new(&[("/a.png", Reply::Fail("disk full"))]));
        let orchestrator = Orchestrator::new(backend.clone());
        orchestrator.lock().add_files(files(&["/a.png"]));

        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();
        orchestrator.start(job(TargetFormat::Webp)).unwrap().join().unwrap();

        assert_eq!(backend.calls.lock().unwrap().len(), 2);
        assert_eq!(orchestrator.lock().files()[0].error(), Some("disk full"));
    }
}
