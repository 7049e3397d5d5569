//! Comment patterns

use super::source::{CommentMarker, Placement};
use super::{Context, Feature, FeatureVector};
use rustc_hash::FxHashMap;

pub(crate) fn extract(ctx: &Context<'_>, out: &mut FeatureVector) {
    let lines = &ctx.view.lines;
    if lines.is_empty() {
        return;
    }

    let comments: Vec<_> = lines.iter().filter_map(|l| l.comment.as_ref()).collect();
    out.set(
        Feature::CommentRatio,
        comments.len() as f64 / lines.len() as f64,
    );
    if comments.is_empty() {
        return;
    }

    let total_len: usize = comments.iter().map(|c| c.len).sum();
    out.set(
        Feature::AvgCommentLength,
        total_len as f64 / comments.len() as f64,
    );

    let inline = comments
        .iter()
        .filter(|c| c.placement == Placement::Inline)
        .count() as f64
        / comments.len() as f64;
    out.set(Feature::InlineCommentRatio, inline);
    // Bernoulli variance of placement, scaled so an even split is 1.0
    out.set(Feature::CommentPlacementVariance, 4.0 * inline * (1.0 - inline));

    let mut markers: FxHashMap<CommentMarker, usize> = FxHashMap::default();
    for c in &comments {
        *markers.entry(c.marker).or_default() += 1;
    }
    let dominant = markers.values().copied().max().unwrap_or(0);
    out.set(
        Feature::CommentStyleConsistency,
        dominant as f64 / comments.len() as f64,
    );
}

#[cfg(test)]
mod tests {
    use crate::features::{extract, Feature};
    use crate::models::Language;

    #[test]
    fn test_no_comments_keeps_neutral_style() {
        let fv = extract("a = 1\nb = 2\n", Language::Python);
        assert_eq!(fv.get(Feature::CommentRatio), 0.0);
        assert_eq!(fv.get(Feature::CommentStyleConsistency), 0.5);
        assert_eq!(fv.get(Feature::AvgCommentLength), 0.0);
    }

    #[test]
    fn test_comment_ratio_and_placement() {
        let code = "// setup\nint a = 1; // one\nint b = 2;\n/* done */\n";
        let fv = extract(code, Language::C);
        assert_eq!(fv.get(Feature::CommentRatio), 0.75);
        let inline = 1.0 / 3.0;
        assert!((fv.get(Feature::InlineCommentRatio) - inline).abs() < 1e-9);
        assert!(
            (fv.get(Feature::CommentPlacementVariance) - 4.0 * inline * (1.0 - inline)).abs()
                < 1e-9
        );
        // Two slash comments, one block comment
        assert!((fv.get(Feature::CommentStyleConsistency) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_comment_length() {
        let fv = extract("# abcd\n# ab\nx = 1\n", Language::Python);
        assert_eq!(fv.get(Feature::AvgCommentLength), 3.0);
    }
}
