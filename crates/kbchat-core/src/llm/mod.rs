mod gemini;
mod safety;
mod stream;
mod traits;

pub use gemini::GeminiClient;
pub use safety::{HarmBlockThreshold, HarmCategory, SafetySetting};
pub use stream::FragmentStream;
pub use traits::*;
