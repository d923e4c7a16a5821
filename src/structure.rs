//! Read-only structural integrity check for a page's command list.
//!
//! The list stays flat on disk. This derives a block tree from it (openers,
//! their continuations and closers) and reports every place where the
//! pairing or indentation does not add up. Nothing is repaired.

use schemars::JsonSchema;
use serde::Serialize;

use crate::mz::codes::{self, CommandRole};
use crate::mz::EventCommand;

/// One block found in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub code: u32,
    pub name: String,
    pub indent: u32,
    /// Index of the opener.
    pub start: usize,
    /// Index of the closer, `None` when the block is never closed.
    pub end: Option<usize>,
    pub children: Vec<BlockNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructureIssue {
    /// The list is empty or does not end with code 0.
    MissingTerminator,
    /// An opener with no matching closer.
    UnclosedBlock { index: usize, code: u32 },
    /// A closer with no open block of its kind.
    UnmatchedCloser { index: usize, code: u32 },
    /// A continuation outside the block or header it belongs to.
    OrphanContinuation { index: usize, code: u32 },
    /// A closer or block continuation at a different indent than its opener.
    IndentMismatch {
        index: usize,
        code: u32,
        expected: u32,
        found: u32,
    },
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub ok: bool,
    pub command_count: usize,
    pub blocks: Vec<BlockNode>,
    pub issues: Vec<StructureIssue>,
}

fn node(cmd: &EventCommand, index: usize) -> BlockNode {
    BlockNode {
        code: cmd.code,
        name: codes::catalog_entry(cmd.code).map_or_else(|| format!("Code {}", cmd.code), |e| e.name.to_string()),
        indent: cmd.indent,
        start: index,
        end: None,
        children: Vec::new(),
    }
}

/// Attach a finished (or abandoned) block to its parent, or to the roots.
fn attach(stack: &mut [BlockNode], roots: &mut Vec<BlockNode>, done: BlockNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(done),
        None => roots.push(done),
    }
}

pub fn check_list(list: &[EventCommand]) -> StructureReport {
    let mut issues = Vec::new();
    let mut roots = Vec::new();
    let mut stack: Vec<BlockNode> = Vec::new();

    if !list.last().is_some_and(EventCommand::is_terminator) {
        issues.push(StructureIssue::MissingTerminator);
    }

    let mut prev: Option<&EventCommand> = None;
    for (index, cmd) in list.iter().enumerate() {
        let entry = codes::catalog_entry(cmd.code);
        match codes::role_of(cmd.code) {
            CommandRole::BlockOpener => stack.push(node(cmd, index)),
            CommandRole::BlockCloser => {
                let opener = entry.and_then(|e| e.partner);
                if stack.last().is_some_and(|top| Some(top.code) == opener) {
                    if let Some(mut done) = stack.pop() {
                        if done.indent != cmd.indent {
                            issues.push(StructureIssue::IndentMismatch {
                                index,
                                code: cmd.code,
                                expected: done.indent,
                                found: cmd.indent,
                            });
                        }
                        done.end = Some(index);
                        attach(&mut stack, &mut roots, done);
                    }
                } else {
                    issues.push(StructureIssue::UnmatchedCloser {
                        index,
                        code: cmd.code,
                    });
                }
            }
            CommandRole::Continuation => {
                let partner = entry.and_then(|e| e.partner);
                if codes::continues_block(cmd.code) {
                    match stack.last() {
                        Some(top) if Some(top.code) == partner => {
                            if top.indent != cmd.indent {
                                issues.push(StructureIssue::IndentMismatch {
                                    index,
                                    code: cmd.code,
                                    expected: top.indent,
                                    found: cmd.indent,
                                });
                            }
                        }
                        _ => issues.push(StructureIssue::OrphanContinuation {
                            index,
                            code: cmd.code,
                        }),
                    }
                } else {
                    // Header continuations (text lines, script lines) follow
                    // their header or a sibling line at the same indent.
                    let attached = prev.is_some_and(|p| {
                        (Some(p.code) == partner || p.code == cmd.code) && p.indent == cmd.indent
                    });
                    if !attached {
                        issues.push(StructureIssue::OrphanContinuation {
                            index,
                            code: cmd.code,
                        });
                    }
                }
            }
            CommandRole::Leaf | CommandRole::Terminator => {}
        }
        prev = Some(cmd);
    }

    while let Some(open) = stack.pop() {
        issues.push(StructureIssue::UnclosedBlock {
            index: open.start,
            code: open.code,
        });
        attach(&mut stack, &mut roots, open);
    }

    StructureReport {
        ok: issues.is_empty(),
        command_count: list.len(),
        blocks: roots,
        issues,
    }
}
