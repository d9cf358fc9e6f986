use skycast_weather::LocationError;

/// Alert shown when switching to current-location mode after a failed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPrompt {
    pub message: String,
    /// Blocked or missing location services get no retry offer
    pub can_retry: bool,
}

impl LocationPrompt {
    pub fn for_error(e: &LocationError) -> Self {
        if e.is_terminal() {
            Self {
                message: format!("無法獲取您的位置：{}", e),
                can_retry: false,
            }
        } else {
            Self {
                message: format!("無法獲取您的位置：{}\n要再試一次嗎？", e),
                can_retry: true,
            }
        }
    }
}
