//! Step and operation labels.
//!
//! These are the data-free names of the workflow steps and of the operation
//! classes that talk to the generation service. The step *data* lives in
//! `app::workflow::Step`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Workflow step, in progression order.
///
/// State transitions:
/// - Capture -> Height -> Select -> Measure -> Generate -> Customize -> Result
/// - Select -> Generate (compose without measuring)
/// - Measure/Generate -> Select (gateway failure, or back)
/// - Customize -> Select (back, selection kept)
/// - Select -> Height (back, photo and selection kept)
/// - Height -> Capture (back), any -> Capture (start over)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Capture,
    Height,
    Select,
    Measure,
    Generate,
    Customize,
    Result,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Capture => "capture",
            StepKind::Height => "height",
            StepKind::Select => "select",
            StepKind::Measure => "measure",
            StepKind::Generate => "generate",
            StepKind::Customize => "customize",
            StepKind::Result => "result",
        }
    }

    /// Steps that only exist while a blocking gateway call is outstanding
    /// (Measure is interactive once the analysis has arrived).
    pub fn is_transitional(self) -> bool {
        matches!(self, StepKind::Generate)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation class. Each class owns one slot: at most one call of a class is
/// outstanding at a time (preview uses a request token instead of a lock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Preview,
    Analyze,
    Compose,
    Edit,
    CreateGarment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Preview => "preview",
            Operation::Analyze => "fit analysis",
            Operation::Compose => "composition",
            Operation::Edit => "edit",
            Operation::CreateGarment => "garment creation",
        };
        f.write_str(name)
    }
}
