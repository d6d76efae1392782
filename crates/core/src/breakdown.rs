//! Hierarchical percentage breakdowns of line records
//!
//! A breakdown groups records by the first attribute, then recursively
//! groups every group by the remaining attributes. Each node's percentage is
//! relative to its parent's line count, so siblings always sum to 100.
//!
//! Groups are ordered by descending line count; groups with equal counts
//! keep the order in which their value was first seen.

use crate::error::{BlameError, BlameResult};
use crate::models::{Accessor, Attribute, LineRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One group in a breakdown tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownNode {
    /// Attribute value shared by every line in the group
    pub value: String,
    /// Number of lines in the group
    pub count: usize,
    /// Share of the parent's lines, 0-100
    pub percentage: f64,
    /// Groups by the next attribute (empty at the last level)
    pub children: Vec<BreakdownNode>,
}

/// A complete breakdown over an ordered attribute list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Attribute used at each depth
    pub attributes: Vec<Attribute>,
    /// Total number of lines
    pub total: usize,
    /// Top-level groups
    pub nodes: Vec<BreakdownNode>,
}

/// One ancestor (or leaf) step along a flattened path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelValue {
    pub value: String,
    pub percentage: f64,
}

/// One leaf path through a breakdown tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    /// Values and percentages from the top level down to the leaf
    pub levels: Vec<LevelValue>,
    /// Line count of the leaf group
    pub count: usize,
}

/// Build a breakdown of `records` over `attributes`
pub fn build_breakdown(records: &[LineRecord], attributes: &[Attribute]) -> BlameResult<Breakdown> {
    if attributes.is_empty() {
        return Err(BlameError::configuration(
            "a breakdown needs at least one attribute",
        ));
    }

    let accessors: Vec<Accessor> = attributes.iter().map(|a| a.accessor()).collect();
    let refs: Vec<&LineRecord> = records.iter().collect();

    Ok(Breakdown {
        attributes: attributes.to_vec(),
        total: records.len(),
        nodes: build_tree(&refs, &accessors),
    })
}

/// Group `records` by the first accessor and recurse with the rest
pub fn build_tree(records: &[&LineRecord], accessors: &[Accessor]) -> Vec<BreakdownNode> {
    let Some((accessor, rest)) = accessors.split_first() else {
        return Vec::new();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&LineRecord>)> = Vec::new();

    for &record in records {
        let value = accessor(record);
        match index.get(&value) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(value.clone(), groups.len());
                groups.push((value, vec![record]));
            }
        }
    }

    let total = records.len();
    let mut nodes: Vec<BreakdownNode> = groups
        .into_iter()
        .map(|(value, members)| BreakdownNode {
            count: members.len(),
            percentage: percentage(members.len(), total),
            children: build_tree(&members, rest),
            value,
        })
        .collect();

    // sort_by is stable, so ties stay in first-seen order
    nodes.sort_by(|a, b| b.count.cmp(&a.count));
    nodes
}

/// Share of `count` in `total`, as a percentage
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

impl Breakdown {
    /// Number of levels in the tree
    pub fn depth(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Project the tree into one row per leaf path.
    ///
    /// Percentages are copied from the nodes, never recomputed.
    pub fn flatten(&self) -> Vec<BreakdownRow> {
        let mut rows = Vec::new();
        let mut path = Vec::with_capacity(self.depth());
        for node in &self.nodes {
            flatten_node(node, &mut path, &mut rows);
        }
        rows
    }

    /// Rebuild a tree from flattened rows, keeping their percentages.
    ///
    /// Counts of inner nodes are the sums of their leaves.
    pub fn regroup(attributes: Vec<Attribute>, rows: &[BreakdownRow]) -> Breakdown {
        let total = rows.iter().map(|r| r.count).sum();
        let nodes = regroup_level(rows, 0);
        Breakdown {
            attributes,
            total,
            nodes,
        }
    }
}

fn flatten_node(node: &BreakdownNode, path: &mut Vec<LevelValue>, rows: &mut Vec<BreakdownRow>) {
    path.push(LevelValue {
        value: node.value.clone(),
        percentage: node.percentage,
    });

    if node.children.is_empty() {
        rows.push(BreakdownRow {
            levels: path.clone(),
            count: node.count,
        });
    } else {
        for child in &node.children {
            flatten_node(child, path, rows);
        }
    }

    path.pop();
}

fn regroup_level(rows: &[BreakdownRow], depth: usize) -> Vec<BreakdownNode> {
    let mut nodes: Vec<BreakdownNode> = Vec::new();
    let mut members: Vec<Vec<BreakdownRow>> = Vec::new();

    for row in rows {
        let Some(level) = row.levels.get(depth) else {
            continue;
        };
        match nodes.iter().position(|n| n.value == level.value) {
            Some(i) => {
                nodes[i].count += row.count;
                members[i].push(row.clone());
            }
            None => {
                nodes.push(BreakdownNode {
                    value: level.value.clone(),
                    count: row.count,
                    percentage: level.percentage,
                    children: Vec::new(),
                });
                members.push(vec![row.clone()]);
            }
        }
    }

    for (node, group) in nodes.iter_mut().zip(members) {
        node.children = regroup_level(&group, depth + 1);
    }
    nodes
}
