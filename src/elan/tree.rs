/*!
 * Hierarchical view of tiers derived from their PARENT_REF links.
 */

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::model::{ElanDocument, Tier};
use crate::errors::ElanError;

/// A tier with the tiers that name it as their parent
#[derive(Debug, Clone, Serialize)]
pub struct TierNode<'a> {
    pub tier: &'a Tier,
    pub children: Vec<TierNode<'a>>,
}

impl TierNode<'_> {
    /// Number of tiers in this subtree, including this one
    pub fn tier_count(&self) -> usize {
        1 + self.children.iter().map(TierNode::tier_count).sum::<usize>()
    }
}

/// Group flat tiers into a forest below `root`.
///
/// With `root = None` the forest roots are the tiers without a parent.
/// Tiers whose parent does not exist are not reachable from any root.
/// Fails with `CyclicTierHierarchy` when any tier is its own ancestor.
pub fn tier_tree<'a>(tiers: &'a [Tier], root: Option<&str>) -> Result<Vec<TierNode<'a>>, ElanError> {
    check_for_cycles(tiers)?;
    let mut ancestors = Vec::new();
    children_of(tiers, root, &mut ancestors)
}

fn children_of<'a>(
    tiers: &'a [Tier],
    parent: Option<&str>,
    ancestors: &mut Vec<&'a str>,
) -> Result<Vec<TierNode<'a>>, ElanError> {
    let mut nodes = Vec::new();
    for tier in tiers.iter().filter(|t| t.parent_ref.as_deref() == parent) {
        // Duplicate tier ids can still loop even when the parent map is acyclic
        if ancestors.contains(&tier.id.as_str()) {
            return Err(ElanError::CyclicTierHierarchy {
                tier_id: tier.id.clone(),
            });
        }
        ancestors.push(&tier.id);
        let children = children_of(tiers, Some(&tier.id), ancestors)?;
        ancestors.pop();
        nodes.push(TierNode { tier, children });
    }
    Ok(nodes)
}

fn check_for_cycles(tiers: &[Tier]) -> Result<(), ElanError> {
    let parents: HashMap<&str, Option<&str>> = tiers
        .iter()
        .map(|t| (t.id.as_str(), t.parent_ref.as_deref()))
        .collect();

    for tier in tiers {
        let mut visited = HashSet::new();
        let mut current = Some(tier.id.as_str());
        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(ElanError::CyclicTierHierarchy {
                    tier_id: id.to_string(),
                });
            }
            current = parents.get(id).copied().flatten();
        }
    }
    Ok(())
}

impl ElanDocument {
    /// Tier forest of this document
    pub fn tier_tree(&self) -> Result<Vec<TierNode<'_>>, ElanError> {
        tier_tree(&self.tiers, None)
    }
}
