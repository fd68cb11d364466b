//! Quiz session engine and its presentation-facing types.

mod engine;
mod export;
mod presenter;
mod ticker;
mod view;

pub use engine::{NextOrSubmit, QuizEngine, Resume, StartReport, TickReport};
pub use export::{
    EXPORT_APP_NAME, EXPORT_VERSION, ExportMeta, ExportQuestion, ExportSummary, ResultsExport,
    export_file_name,
};
pub use presenter::{Cue, QuizPresenter, SilentPresenter};
pub use ticker::{TICK_PERIOD, Ticker};
pub use view::{ChoiceMark, ChoiceView, QuestionSnapshot, QuizState, TimerSnapshot};
