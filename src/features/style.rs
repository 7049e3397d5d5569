//! Style consistency: indentation and whitespace

use super::{Context, Feature, FeatureVector};
use rustc_hash::FxHashMap;

/// Positive indentation increases between consecutive code lines
pub(crate) struct IndentSteps(Vec<usize>);

impl IndentSteps {
    /// Most common step; ties go to the narrower width
    pub fn mode(&self) -> Option<usize> {
        let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
        for &step in &self.0 {
            *counts.entry(step).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(step, _)| step)
    }

    pub fn variance(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        let n = self.0.len() as f64;
        let mean = self.0.iter().sum::<usize>() as f64 / n;
        self.0
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n
    }
}

pub(crate) fn indent_steps(ctx: &Context<'_>) -> IndentSteps {
    let mut steps = Vec::new();
    let mut previous: Option<usize> = None;
    for (_, line) in ctx.view.code_lines() {
        let width = line.indent.width;
        if let Some(prev) = previous {
            if width > prev {
                steps.push(width - prev);
            }
        }
        previous = Some(width);
    }
    IndentSteps(steps)
}

pub(crate) fn extract(ctx: &Context<'_>, out: &mut FeatureVector) {
    let lines = &ctx.view.lines;
    if lines.is_empty() {
        return;
    }
    let total = lines.len() as f64;

    let steps = indent_steps(ctx);
    let mode = steps.mode();
    out.set(Feature::IndentWidthMode, mode.unwrap_or(0) as f64);
    out.set(Feature::IndentVariance, steps.variance());

    let indented: Vec<_> = ctx
        .view
        .code_lines()
        .map(|(_, l)| l.indent)
        .filter(|i| i.width > 0)
        .collect();
    if !indented.is_empty() {
        let tabbed = indented.iter().filter(|i| i.tabs).count();
        let prefer_tabs = tabbed * 2 > indented.len();
        let consistent = indented
            .iter()
            .filter(|i| {
                !i.is_mixed()
                    && i.tabs == prefer_tabs
                    && mode.map_or(true, |m| m > 0 && i.width % m == 0)
            })
            .count();
        out.set(
            Feature::IndentConsistency,
            consistent as f64 / indented.len() as f64,
        );
    }

    let trailing = lines
        .iter()
        .filter(|l| l.raw.ends_with([' ', '\t']))
        .count();
    out.set(Feature::TrailingWhitespaceRate, trailing as f64 / total);

    let blank = lines.iter().filter(|l| l.is_blank()).count();
    out.set(Feature::BlankLineRate, blank as f64 / total);
}

#[cfg(test)]
mod tests {
    use crate::features::{extract, Feature};
    use crate::models::Language;

    #[test]
    fn test_uniform_four_space_indent() {
        let code = "def f(a):\n    if a:\n        return 1\n    return 2\n";
        let fv = extract(code, Language::Python);
        assert_eq!(fv.get(Feature::IndentWidthMode), 4.0);
        assert_eq!(fv.get(Feature::IndentVariance), 0.0);
        assert_eq!(fv.get(Feature::IndentConsistency), 1.0);
    }

    #[test]
    fn test_irregular_indent() {
        let code = "def f(a):\n  if a:\n     return 1\n  x = 2\n  if x:\n   return x\n";
        let fv = extract(code, Language::Python);
        // Steps 2, 3, 1: mode breaks the tie toward the narrowest width
        assert_eq!(fv.get(Feature::IndentWidthMode), 1.0);
        assert!(fv.get(Feature::IndentVariance) > 0.5);
    }

    #[test]
    fn test_mixed_widths_lower_consistency() {
        let code = "def f(a):\n    if a:\n        return 1\n    x = 2\n    if x:\n          return x\n";
        let fv = extract(code, Language::Python);
        assert_eq!(fv.get(Feature::IndentWidthMode), 4.0);
        assert!(fv.get(Feature::IndentConsistency) < 1.0);
    }

    #[test]
    fn test_whitespace_rates() {
        let fv = extract("a = 1 \n\nb = 2\n   \n", Language::Python);
        assert_eq!(fv.get(Feature::TrailingWhitespaceRate), 0.5);
        assert_eq!(fv.get(Feature::BlankLineRate), 0.5);
    }
}
