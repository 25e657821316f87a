//! `calcdeck eval` and `calcdeck sci`.

use super::Output;
use crate::services::calculator;
use crate::services::scientific::{AngleMode, ScientificEngine};
use anyhow::Context;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Evaluation<'a> {
    expression: &'a str,
    result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    angle_mode: Option<AngleMode>,
}

/// Flags win over the configured mode
pub fn angle_mode(radians: bool, degrees: bool, configured: AngleMode) -> AngleMode {
    if radians {
        AngleMode::Radians
    } else if degrees {
        AngleMode::Degrees
    } else {
        configured
    }
}

pub fn run_eval(expression: &str, out: Output) -> anyhow::Result<()> {
    let result = calculator::evaluate(expression)
        .with_context(|| format!("cannot evaluate '{}'", expression))?;
    let evaluation = Evaluation {
        expression,
        result,
        angle_mode: None,
    };
    out.emit(&evaluation, || evaluation.result.clone())
}

pub fn run_sci(expression: &str, mode: AngleMode, out: Output) -> anyhow::Result<()> {
    let result = ScientificEngine::new()
        .evaluate(expression, mode)
        .with_context(|| format!("cannot evaluate '{}' in {} mode", expression, mode.label()))?;
    let evaluation = Evaluation {
        expression,
        result,
        angle_mode: Some(mode),
    };
    out.emit(&evaluation, || evaluation.result.clone())
}
