pub mod post;
pub mod settings;
pub mod term;
pub mod trend;

pub use post::PostEvent;
pub use settings::{PinnedWord, Settings, TrendAnnotation};
pub use term::{ExtractedTerm, TermEvent, TermKind};
pub use trend::{RankedTrend, TrendingSnapshot};
