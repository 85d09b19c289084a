use super::ic_format::{ConvertPolicy, TargetFormat};
use super::ic_registry::SelectedFile;

/// Display-only counters derived from the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub convertible: usize,
    pub completed: usize,
    pub percent: u8,
}

impl Progress {
    pub fn compute(files: &[SelectedFile], target: TargetFormat, policy: ConvertPolicy) -> Self {
        let convertible: Vec<&SelectedFile> = files
            .iter()
            .filter(|f| policy.can_convert(f, target))
            .collect();
        let completed = convertible.iter().filter(|f| f.is_terminal()).count();
        Self::from_counts(convertible.len(), completed)
    }

    pub fn from_counts(convertible: usize, completed: usize) -> Self {
        let percent = if convertible == 0 {
            0
        } else {
            (completed as f64 / convertible as f64 * 100.0).round() as u8
        };
        Self {
            convertible,
            completed,
            percent,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.percent as f32 / 100.0
    }

    pub fn label(&self) -> String {
        format!("{}/{} ({}%)", self.completed, self.convertible, self.percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_converter::ic_registry::FileStatus;

    fn file(path: &str, status: Option<FileStatus>) -> SelectedFile {
        let mut file = SelectedFile::new(path, 0);
        file.status = status;
        file
    }

    #[test]
    fn test_zero_convertible_is_zero_percent() {
        assert_eq!(Progress::from_counts(0, 0).percent, 0);
        let files = vec![file("/a.jpg", Some(FileStatus::Success))];
        let progress = Progress::compute(&files, TargetFormat::Jpg, ConvertPolicy::Strict);
        assert_eq!(progress, Progress::default());
    }

    #[test]
    fn test_half_done() {
        let files = vec![
            file("/a.png", Some(FileStatus::Success)),
            file("/b.png", Some(FileStatus::Error("boom".into()))),
            file("/c.png", Some(FileStatus::Converting)),
            file("/d.png", Some(FileStatus::Idle)),
            file("/e.jpg", Some(FileStatus::Success)),
        ];
        let progress = Progress::compute(&files, TargetFormat::Jpg, ConvertPolicy::Strict);
        assert_eq!(progress.convertible, 4);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percent, 50);
        assert_eq!(progress.label(), "2/4 (50%)");
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(Progress::from_counts(3, 1).percent, 33);
        assert_eq!(Progress::from_counts(3, 2).percent, 67);
        assert_eq!(Progress::from_counts(8, 1).percent, 13);
    }
}
