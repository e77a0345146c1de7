/// Model input size (width, height) used when nothing else is configured.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Gray padding value for the letterbox border.
pub const LETTERBOX_COLOR: u8 = 114;
