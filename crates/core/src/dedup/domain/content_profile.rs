use crate::shared::constants::{DEFAULT_BOUNDARY_THRESHOLD, DEFAULT_GENERAL_THRESHOLD};
use crate::shared::settings::DedupSettings;

/// Kind of programme a transcript comes from, detected from its channel and
/// title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentProfile {
    LiveStream,
    Podcast,
    News,
    Default,
}

impl ContentProfile {
    pub fn detect(channel: &str, title: &str) -> Self {
        let haystack = format!("{channel} {title}").to_lowercase();
        if haystack.contains("coffee break") || haystack.contains("live") {
            ContentProfile::LiveStream
        } else if haystack.contains("podcast") {
            ContentProfile::Podcast
        } else if haystack.contains("ข่าว") || haystack.contains("news") {
            ContentProfile::News
        } else {
            ContentProfile::Default
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentProfile::LiveStream => "live_stream",
            ContentProfile::Podcast => "podcast",
            ContentProfile::News => "news",
            ContentProfile::Default => "default",
        }
    }

    /// `(boundary, general)` thresholds, or `None` to keep configured values.
    ///
    /// Every named profile is conservative: transcripts serve as ground
    /// truth downstream, so only near-verbatim repeats may go.
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        match self {
            ContentProfile::LiveStream | ContentProfile::Podcast | ContentProfile::News => {
                Some((DEFAULT_BOUNDARY_THRESHOLD, DEFAULT_GENERAL_THRESHOLD))
            }
            ContentProfile::Default => None,
        }
    }

    pub fn apply(&self, settings: &DedupSettings) -> DedupSettings {
        let mut tuned = settings.clone();
        if let Some((boundary, general)) = self.thresholds() {
            tuned.boundary_threshold = boundary;
            tuned.general_threshold = general;
        }
        log::info!(
            "Using '{}' dedup profile (boundary={}, general={})",
            self.name(),
            tuned.boundary_threshold,
            tuned.general_threshold
        );
        tuned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::live("Money Coffee Break", "", ContentProfile::LiveStream)]
    #[case::live_title("", "LIVE ตลาดหุ้นวันนี้", ContentProfile::LiveStream)]
    #[case::podcast("Investor Podcast", "EP 12", ContentProfile::Podcast)]
    #[case::thai_news("", "ข่าวเช้า หุ้นไทย", ContentProfile::News)]
    #[case::fallback("Some Channel", "วิเคราะห์หุ้น", ContentProfile::Default)]
    fn test_detect(#[case] channel: &str, #[case] title: &str, #[case] expected: ContentProfile) {
        assert_eq!(ContentProfile::detect(channel, title), expected);
    }

    #[test]
    fn test_default_profile_keeps_configured_thresholds() {
        let settings = DedupSettings {
            boundary_threshold: 0.9,
            ..DedupSettings::default()
        };
        assert_eq!(ContentProfile::Default.apply(&settings), settings);
        assert_eq!(
            ContentProfile::News.apply(&settings).boundary_threshold,
            DEFAULT_BOUNDARY_THRESHOLD
        );
    }
}
