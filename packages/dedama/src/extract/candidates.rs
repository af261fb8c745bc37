//! Candidate filtering applied by every discovery strategy.

use std::collections::HashSet;

use crate::automation::query::Link;
use crate::types::config::{DiscoveryStrategy, SelectorSpec};
use crate::types::record::Candidate;

/// Turn raw links into candidates, preserving document order.
///
/// A link survives when it has a target, a label of at least
/// `spec.min_label_chars` characters free of noise tokens, a target not seen
/// earlier in the list, a target containing one of the strategy's href hints
/// (if it has any) and a label matching `spec.label_pattern` (if set).
pub fn filter_candidates(
    links: Vec<Link>,
    strategy: &DiscoveryStrategy,
    spec: &SelectorSpec,
) -> Vec<Candidate> {
    let noise: Vec<String> = spec.noise_tokens.iter().map(|t| t.to_lowercase()).collect();
    let mut seen = HashSet::new();

    links
        .into_iter()
        .filter_map(|link| {
            let target = link.href.filter(|h| !h.trim().is_empty())?;
            let label = link.text.trim();

            if label.is_empty() || label.chars().count() < spec.min_label_chars {
                return None;
            }
            let lowered = label.to_lowercase();
            if noise.iter().any(|token| lowered.contains(token.as_str())) {
                return None;
            }
            if !strategy.href_hints.is_empty()
                && !strategy.href_hints.iter().any(|hint| target.contains(hint.as_str()))
            {
                return None;
            }
            if let Some(pattern) = &spec.label_pattern {
                if !pattern.is_match(label) {
                    return None;
                }
            }
            if !seen.insert(target.clone()) {
                return None;
            }

            Some(Candidate::new(label, target))
        })
        .collect()
}
