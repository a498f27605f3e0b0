/// Markers that flag a transcript line as non-speech or unwanted content
pub const DEFAULT_EXCLUSION_MARKERS: &[&str] = &["*", "(", ")", "[", "]"];

/// Literal-marker content filter for transcript lines
#[derive(Debug, Clone)]
pub struct ContentFilter {
    markers: Vec<String>,
}

impl ContentFilter {
    /// Build a filter from a list of markers. Matching is case-insensitive; empty markers
    /// are dropped.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|marker| marker.as_ref().to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
        }
    }

    /// Check whether a line contains any exclusion marker
    pub fn is_excluded(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_MARKERS)
    }
}
