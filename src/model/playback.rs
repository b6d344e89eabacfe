//! Playback state as seen by the UI

/// What the engine is doing for the centered page
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackInfo {
    pub playlist_index: Option<usize>,
    pub media_url: Option<String>,
    pub buffered_bytes: u64,
    pub is_playing: bool,
}

impl PlaybackInfo {
    pub fn for_item(playlist_index: usize, media_url: String, is_playing: bool) -> Self {
        Self {
            playlist_index: Some(playlist_index),
            media_url: Some(media_url),
            buffered_bytes: 0,
            is_playing,
        }
    }

    /// Record load progress; progress for any other item is ignored.
    pub fn update_buffered(&mut self, playlist_index: usize, bytes: u64) {
        if self.playlist_index == Some(playlist_index) {
            self.buffered_bytes = bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_for_other_items_is_ignored() {
        let mut info = PlaybackInfo::for_item(1, "u".to_string(), true);
        info.update_buffered(0, 500);
        assert_eq!(info.buffered_bytes, 0);
        info.update_buffered(1, 700);
        assert_eq!(info.buffered_bytes, 700);
    }
}
