/// Extension of every persisted frame.
pub const FRAME_EXTENSION: &str = "png";

/// File name for the `index`-th frame: at least two digits, zero padded.
/// e.g. "01.png", "09.png", "10.png", "123.png"
pub fn frame_file_name(index: u32) -> String {
    format!("{index:02}.{FRAME_EXTENSION}")
}
