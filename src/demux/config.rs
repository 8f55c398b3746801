//! Scanner configuration

/// Scanner configuration options
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Skip forward to the header's data offset when it is past the header
    pub skip_to_data_offset: bool,

    /// Stop after this many tags (None = read to end of stream)
    pub max_tags: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_to_data_offset: true,
            max_tags: None,
        }
    }
}

impl ScanConfig {
    /// Read tags immediately after the 9-byte header, ignoring the data offset
    pub fn ignore_data_offset(mut self) -> Self {
        self.skip_to_data_offset = false;
        self
    }

    /// Set the tag limit
    pub fn max_tags(mut self, max: usize) -> Self {
        self.max_tags = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert!(config.skip_to_data_offset);
        assert_eq!(config.max_tags, None);
    }

    #[test]
    fn test_builder() {
        let config = ScanConfig::default().ignore_data_offset().max_tags(10);
        assert!(!config.skip_to_data_offset);
        assert_eq!(config.max_tags, Some(10));
    }
}
