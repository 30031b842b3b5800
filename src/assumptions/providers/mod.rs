pub mod file;
#[cfg(feature = "gemini")]
pub mod gemini;

pub use file::FileAssumptionProvider;
#[cfg(feature = "gemini")]
pub use gemini::GeminiAssumptionProvider;
