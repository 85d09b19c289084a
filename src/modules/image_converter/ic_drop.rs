use std::time::{Duration, Instant};
use super::ic_format::is_supported_input;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

// NUL never appears in a filesystem path.
const KEY_SEPARATOR: &str = "\0";

/// Rejects a drop notification that repeats the previous one within a short
/// window. Some platforms deliver the same drop twice in quick succession.
#[derive(Debug, Clone)]
pub struct DropFilter {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for DropFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl DropFilter {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn is_duplicate(&mut self, paths: &[String]) -> bool {
        self.is_duplicate_at(paths, Instant::now())
    }

    pub fn is_duplicate_at(&mut self, paths: &[String], now: Instant) -> bool {
        if paths.is_empty() {
            return false;
        }

        let key = paths.join(KEY_SEPARATOR);
        if let Some((last_key, at)) = &self.last {
            if *last_key == key && now.saturating_duration_since(*at) < self.window {
                return true;
            }
        }

        self.last = Some((key, now));
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragDropEvent {
    Over,
    Drop(Vec<String>),
    Cancel,
}

#[derive(Debug, Default)]
pub struct DropZone {
    dragging: bool,
    filter: DropFilter,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Builds the notification for one frame of window input. `hovering` is
    /// whether files are currently held over the window.
    pub fn event_from_input(&self, hovering: bool, dropped: Vec<String>) -> Option<DragDropEvent> {
        if !dropped.is_empty() {
            Some(DragDropEvent::Drop(dropped))
        } else if hovering {
            Some(DragDropEvent::Over)
        } else if self.dragging {
            Some(DragDropEvent::Cancel)
        } else {
            None
        }
    }

    /// Returns the image paths that should be resolved and added.
    pub fn handle_event(&mut self, event: DragDropEvent, disabled: bool) -> Option<Vec<String>> {
        self.handle_event_at(event, disabled, Instant::now())
    }

    pub fn handle_event_at(&mut self, event: DragDropEvent, disabled: bool, now: Instant) -> Option<Vec<String>> {
        match event {
            DragDropEvent::Over => {
                if !disabled {
                    self.dragging = true;
                }
                None
            }
            DragDropEvent::Cancel => {
                self.dragging = false;
                None
            }
            DragDropEvent::Drop(paths) => {
                self.dragging = false;
                if disabled {
                    return None;
                }

                let image_paths: Vec<String> = paths
                    .into_iter()
                    .filter(|p| is_supported_input(p))
                    .collect();
                if image_paths.is_empty() {
                    return None;
                }

                if self.filter.is_duplicate_at(&image_paths, now) {
                    log::debug!("Ignoring repeated drop of {} files", image_paths.len());
                    return None;
                }

                Some(image_paths)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_of(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_repeat_within_window_is_duplicate() {
        let mut filter = DropFilter::default();
        let start = Instant::now();
        let paths = paths_of(&["/a.png", "/b.png"]);

        assert!(!filter.is_duplicate_at(&paths, start));
        assert!(filter.is_duplicate_at(&paths, start + Duration::from_millis(100)));
        assert!(!filter.is_duplicate_at(&paths, start + Duration::from_millis(600)));
    }

    #[test]
    fn test_duplicate_does_not_refresh_window() {
        let mut filter = DropFilter::default();
        let start = Instant::now();
        let paths = paths_of(&["/a.png"]);

        assert!(!filter.is_duplicate_at(&paths, start));
        assert!(filter.is_duplicate_at(&paths, start + Duration::from_millis(400)));
        // Still measured from the first accepted drop.
        assert!(!filter.is_duplicate_at(&paths, start + Duration::from_millis(550)));
    }

    #[test]
    fn test_key_is_order_sensitive() {
        let mut filter = DropFilter::default();
        let now = Instant::now();
        assert!(!filter.is_duplicate_at(&paths_of(&["/a.png", "/b.png"]), now));
        assert!(!filter.is_duplicate_at(&paths_of(&["/b.png", "/a.png"]), now));
    }

    #[test]
    fn test_empty_paths_never_duplicate() {
        let mut filter = DropFilter::default();
        let now = Instant::now();
        assert!(!filter.is_duplicate_at(&[], now));
        assert!(!filter.is_duplicate_at(&[], now));
    }

    #[test]
    fn test_over_and_cancel_toggle_dragging() {
        let mut zone = DropZone::new();
        zone.handle_event(DragDropEvent::Over, false);
        assert!(zone.is_dragging());
        zone.handle_event(DragDropEvent::Cancel, false);
        assert!(!zone.is_dragging());

        zone.handle_event(DragDropEvent::Over, true);
        assert!(!zone.is_dragging());
    }

    #[test]
    fn test_drop_filters_unsupported_and_repeats() {
        let mut zone = DropZone::new();
        let now = Instant::now();
        zone.handle_event_at(DragDropEvent::Over, false, now);

        let accepted = zone.handle_event_at(
            DragDropEvent::Drop(paths_of(&["/a.png", "/notes.txt", "/b.JPG"])),
            false,
            now,
        );
        assert_eq!(accepted, Some(paths_of(&["/a.png", "/b.JPG"])));
        assert!(!zone.is_dragging());

        let repeated = zone.handle_event_at(
            DragDropEvent::Drop(paths_of(&["/a.png", "/notes.txt", "/b.JPG"])),
            false,
            now + Duration::from_millis(20),
        );
        assert_eq!(repeated, None);
    }

    #[test]
    fn test_drop_while_disabled_is_ignored() {
        let mut zone = DropZone::new();
        let accepted = zone.handle_event(DragDropEvent::Drop(paths_of(&["/a.png"])), true);
        assert_eq!(accepted, None);
        assert!(!zone.is_dragging());
    }

    #[test]
    fn test_event_from_input() {
        let mut zone = DropZone::new();
        assert_eq!(zone.event_from_input(false, vec![]), None);
        assert_eq!(zone.event_from_input(true, vec![]), Some(DragDropEvent::Over));

        zone.handle_event(DragDropEvent::Over, false);
        assert_eq!(zone.event_from_input(false, vec![]), Some(DragDropEvent::Cancel));
        assert_eq!(
            zone.event_from_input(false, paths_of(&["/a.png"])),
            Some(DragDropEvent::Drop(paths_of(&["/a.png"])))
        );
    }
}
