/// Options for [`crate::Emitter`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EmitterConfig {
    /// Flush the stream after every frame so a consumer tailing a pipe sees
    /// each message as soon as it is emitted.
    pub flush_each_frame: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            flush_each_frame: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ReaderLimits {
    pub max_frame_bytes: usize,
    pub max_length_line_bytes: usize,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 16 * 1024 * 1024,
            max_length_line_bytes: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ReaderConfig {
    pub limits: ReaderLimits,
    /// Keep each frame's document text on the returned record.
    pub capture_raw: bool,
}
