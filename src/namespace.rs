// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Namespace tree: turns the flat set of group/variable records returned
//! by the endpoint into a hierarchical, path-addressable tree, with
//! absolute/relative path resolution and prefix completion (spec.md §4.7).
//!
//! Nodes are arena-indexed by `gid`/`vid` (never an owning child→parent
//! reference) so the `pid` back-edges used for path ascent can't create a
//! reference cycle (spec.md §9 design note).

use std::collections::BTreeMap;

use crate::types::{GroupInfo, VariableInfo};

/// Root group id. Dense ids start at 1; index 0 is the "not found"
/// sentinel.
pub const ROOT_GID: u32 = 1;

/// Sentinel returned by path resolution on any lookup failure.
pub const NOT_FOUND: u32 = 0;

/// One group's position in the tree: its own metadata plus the keys of
/// its immediate children.
#[derive(Debug, Clone, Default)]
struct GroupNode {
    info: Option<GroupInfo>,
    child_groups: BTreeMap<String, u32>,
    child_vars: BTreeMap<String, u32>,
}

/// The namespace tree built from `read_group_info`/`read_var_info` replies
/// for every `gid`/`vid` in `[1, num_groups]`/`[1, num_vars]`.
pub struct Namespace {
    /// Index 0 is an unused sentinel slot, so `groups[gid]` is direct.
    groups: Vec<GroupNode>,
    /// Index 0 is an unused sentinel slot, so `vars[vid]` is direct.
    vars: Vec<Option<VariableInfo>>,
}

impl Namespace {
    /// Build a tree from the full set of group and variable records.
    /// `groups`/`vars` need not be sorted; this allocates arrays sized to
    /// the maximum id seen plus a reserved index 0.
    #[must_use]
    pub fn build(groups: Vec<GroupInfo>, vars: Vec<VariableInfo>) -> Self {
        let max_gid = groups.iter().map(|g| g.gid).max().unwrap_or(0);
        let max_vid = vars.iter().map(|v| v.vid).max().unwrap_or(0);

        let mut node_groups: Vec<GroupNode> = (0..=max_gid).map(|_| GroupNode::default()).collect();
        let mut node_vars: Vec<Option<VariableInfo>> = (0..=max_vid).map(|_| None).collect();

        for group in groups {
            let gid = group.gid;
            let key = group.key.clone();
            let pid = group.pid;
            node_groups[gid as usize].info = Some(group);
            if pid != gid && (pid as usize) < node_groups.len() {
                node_groups[pid as usize].child_groups.insert(key, gid);
            }
        }

        for var in vars {
            let vid = var.vid;
            let gid = var.gid;
            let key = var.key.clone();
            node_vars[vid as usize] = Some(var);
            if (gid as usize) < node_groups.len() {
                node_groups[gid as usize].child_vars.insert(key, vid);
            }
        }

        log::debug!(
            "namespace: built tree with {} groups, {} variables",
            node_groups.len().saturating_sub(1),
            node_vars.iter().filter(|v| v.is_some()).count()
        );

        Self { groups: node_groups, vars: node_vars }
    }

    fn parent_of(&self, gid: u32) -> u32 {
        self.groups
            .get(gid as usize)
            .and_then(|n| n.info.as_ref())
            .map_or(ROOT_GID, |info| info.pid)
    }

    /// Resolve a path to a group id. Absolute paths (leading `/`) start
    /// from [`ROOT_GID`]; relative paths start from `current_gid`.
    /// `..` ascends to the parent (a no-op at root). Returns
    /// [`NOT_FOUND`] on any unresolved segment.
    #[must_use]
    pub fn get_gid_from_path(&self, path: &str, current_gid: u32) -> u32 {
        let (mut gid, rest) = self.start(path, current_gid);
        for segment in rest.split('/') {
            if segment.is_empty() {
                continue;
            }
            if segment == ".." {
                gid = self.parent_of(gid);
                continue;
            }
            let Some(node) = self.groups.get(gid as usize) else {
                return NOT_FOUND;
            };
            match node.child_groups.get(segment) {
                Some(&child) => gid = child,
                None => return NOT_FOUND,
            }
        }
        gid
    }

    /// Resolve a path to a variable id. Identical traversal to
    /// [`Namespace::get_gid_from_path`], but the final segment is also
    /// checked against the current group's `child_vars`.
    #[must_use]
    pub fn get_vid_from_path(&self, path: &str, current_gid: u32) -> u32 {
        let (mut gid, rest) = self.start(path, current_gid);
        let mut vid = NOT_FOUND;
        for segment in rest.split('/') {
            if segment.is_empty() {
                continue;
            }
            if segment == ".." {
                gid = self.parent_of(gid);
                continue;
            }
            let Some(node) = self.groups.get(gid as usize) else {
                return NOT_FOUND;
            };
            let group_match = node.child_groups.get(segment).copied();
            let var_match = node.child_vars.get(segment).copied();
            if group_match.is_none() && var_match.is_none() {
                return NOT_FOUND;
            }
            if let Some(child) = group_match {
                gid = child;
            }
            if let Some(v) = var_match {
                vid = v;
            }
        }
        vid
    }

    fn start<'a>(&self, path: &'a str, current_gid: u32) -> (u32, &'a str) {
        if let Some(rest) = path.strip_prefix('/') {
            (ROOT_GID, rest)
        } else {
            (current_gid, path)
        }
    }

    /// Rebuild the canonical absolute path for `gid` by walking `pid`
    /// back-references to the root.
    #[must_use]
    pub fn get_path_from_gid(&self, mut gid: u32) -> String {
        let mut segments = Vec::new();
        while gid != ROOT_GID {
            let Some(info) = self.groups.get(gid as usize).and_then(|n| n.info.as_ref()) else {
                break;
            };
            segments.push(info.key.clone());
            gid = info.pid;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// List the child group keys (with a trailing `/`) and variable keys
    /// of `gid`.
    #[must_use]
    pub fn list(&self, gid: u32) -> Vec<String> {
        let Some(node) = self.groups.get(gid as usize) else {
            return Vec::new();
        };
        let mut out: Vec<String> = node.child_groups.keys().map(|k| format!("{k}/")).collect();
        out.extend(node.child_vars.keys().cloned());
        out
    }

    /// Complete a partial trailing key under `gid` by prefix. If nothing
    /// matches `prefix`, the full listing is returned (empty prefix is
    /// the common case and shows everything).
    #[must_use]
    pub fn complete(&self, gid: u32, prefix: &str) -> Vec<String> {
        let Some(node) = self.groups.get(gid as usize) else {
            return Vec::new();
        };
        let mut out: Vec<String> = node
            .child_groups
            .keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| format!("{k}/"))
            .collect();
        out.extend(node.child_vars.keys().filter(|k| k.starts_with(prefix)).cloned());

        if out.is_empty() {
            return self.list(gid);
        }
        out
    }

    #[must_use]
    pub fn group_info(&self, gid: u32) -> Option<&GroupInfo> {
        self.groups.get(gid as usize).and_then(|n| n.info.as_ref())
    }

    #[must_use]
    pub fn var_info(&self, vid: u32) -> Option<&VariableInfo> {
        self.vars.get(vid as usize).and_then(|v| v.as_ref())
    }
}
