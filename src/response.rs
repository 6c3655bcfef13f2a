const ERROR_PREFIX: &str = "ERROR: ";

/// Three ranked codes for one URL. Always exactly three slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub top_1: String,
    pub top_2: String,
    pub top_3: String,
}

impl ClassificationResult {
    /// Error marker in slot 1, slots 2 and 3 empty.
    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self {
            top_1: format!("{}{}", ERROR_PREFIX, detail),
            ..Default::default()
        }
    }

    pub fn slots(&self) -> [&str; 3] {
        [&self.top_1, &self.top_2, &self.top_3]
    }
}

/// First three lines of the model output, in order; missing ranks are empty.
pub fn parse(raw_output: &str) -> ClassificationResult {
    let mut lines = raw_output.trim().lines().map(str::to_string);
    ClassificationResult {
        top_1: lines.next().unwrap_or_default(),
        top_2: lines.next().unwrap_or_default(),
        top_3: lines.next().unwrap_or_default(),
    }
}
