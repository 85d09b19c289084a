use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Idle,
    Converting,
    Success,
    Error(String),
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Success | FileStatus::Error(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Idle => "Waiting",
            FileStatus::Converting => "Converting",
            FileStatus::Success => "Done",
            FileStatus::Error(_) => "Failed",
        }
    }
}

/// A file queued by the user. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    /// `None` until the file takes part in a run.
    pub status: Option<FileStatus>,
}

impl SelectedFile {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = file_name_of(&path).to_string();
        Self {
            path,
            name,
            size,
            status: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            Some(FileStatus::Error(message)) => Some(message),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(FileStatus::is_terminal)
    }

    pub fn size_label(&self) -> Option<String> {
        if self.size == 0 {
            return None;
        }
        Some(format!("{:.1} KB", self.size as f64 / 1024.0))
    }
}

/// Final segment of a `/` or `\` separated path.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or("")
}

/// Merges incoming files into an ordered selection.
///
/// Existing entries keep their position and status; new paths are appended
/// in the order given. When the previous batch completed, the merge starts
/// from an empty selection instead.
pub fn merge_selection(
    existing: &[SelectedFile],
    incoming: Vec<SelectedFile>,
    just_completed: bool,
) -> Vec<SelectedFile> {
    let base: &[SelectedFile] = if just_completed { &[] } else { existing };
    let mut seen: HashSet<String> = base.iter().map(|f| f.path.clone()).collect();
    let mut next = base.to_vec();

    for file in incoming {
        if seen.insert(file.path.clone()) {
            next.push(file);
        }
    }

    next
}

#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Vec<SelectedFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&SelectedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Returns how many files were appended.
    pub fn add_files(&mut self, incoming: Vec<SelectedFile>, just_completed: bool) -> usize {
        let before = if just_completed { 0 } else { self.files.len() };
        self.files = merge_selection(&self.files, incoming, just_completed);
        self.files.len() - before
    }

    pub fn remove_file(&mut self, path: &str) {
        self.files.retain(|f| f.path != path);
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Returns false when no entry has this path.
    pub fn set_status(&mut self, path: &str, status: FileStatus) -> bool {
        match self.files.iter_mut().find(|f| f.path == path) {
            Some(file) => {
                file.status = Some(status);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(files: &[SelectedFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_name_is_last_segment() {
        assert_eq!(SelectedFile::new("/home/me/cat.png", 10).name, "cat.png");
        assert_eq!(SelectedFile::new("C:\\Users\\me\\dog.jpg", 10).name, "dog.jpg");
        assert_eq!(SelectedFile::new("plain.webp", 0).name, "plain.webp");
    }

    #[test]
    fn test_merge_preserves_order_and_skips_duplicates() {
        let existing = vec![SelectedFile::new("/a.png", 1), SelectedFile::new("/b.png", 2)];
        let incoming = vec![
            SelectedFile::new("/c.png", 3),
            SelectedFile::new("/a.png", 99),
            SelectedFile::new("/d.png", 4),
            SelectedFile::new("/c.png", 5),
        ];

        let merged = merge_selection(&existing, incoming, false);
        assert_eq!(paths(&merged), vec!["/a.png", "/b.png", "/c.png", "/d.png"]);
        assert_eq!(merged[0].size, 1);
        assert_eq!(merged[2].size, 3);
    }

    #[test]
    fn test_merge_after_completion_starts_fresh() {
        let existing = vec![SelectedFile::new("/a.png", 1)];
        let merged = merge_selection(&existing, vec![SelectedFile::new("/b.png", 2)], true);
        assert_eq!(paths(&merged), vec!["/b.png"]);
    }

    #[test]
    fn test_adding_existing_path_keeps_status() {
        let mut registry = FileRegistry::new();
        registry.add_files(vec![SelectedFile::new("/a.png", 1)], false);
        registry.set_status("/a.png", FileStatus::Error("decode error".into()));

        let added = registry.add_files(vec![SelectedFile::new("/a.png", 1)], false);
        assert_eq!(added, 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.files()[0].error(), Some("decode error"));
    }

    #[test]
    fn test_no_duplicates_after_repeated_additions() {
        let mut registry = FileRegistry::new();
        for round in 0..3 {
            let batch = (0..5)
                .map(|i| SelectedFile::new(format!("/img{}.png", (i + round) % 6), 0))
                .collect();
            registry.add_files(batch, false);
        }

        let unique: HashSet<&str> = paths(registry.files()).into_iter().collect();
        assert_eq!(registry.len(), 6);
        assert_eq!(unique.len(), 6);
        assert_eq!(registry.files()[0].path, "/img0.png");
        assert_eq!(registry.files()[5].path, "/img5.png");
    }

    #[test]
    fn test_remove_file_is_exact_and_tolerant() {
        let mut registry = FileRegistry::new();
        registry.add_files(vec![SelectedFile::new("/a.png", 1), SelectedFile::new("/ab.png", 1)], false);

        registry.remove_file("/a.png");
        assert_eq!(paths(registry.files()), vec!["/ab.png"]);

        registry.remove_file("/missing.png");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_status_on_missing_path() {
        let mut registry = FileRegistry::new();
        assert!(!registry.set_status("/nope.png", FileStatus::Success));
    }

    #[test]
    fn test_size_label() {
        assert_eq!(SelectedFile::new("/a.png", 0).size_label(), None);
        assert_eq!(SelectedFile::new("/a.png", 1536).size_label().as_deref(), Some("1.5 KB"));
    }
}
