//! The per-file pass context.
//!
//! Everything that numbers or collects things during instrumentation
//! lives here and is created fresh for each file: the node and token ids
//! inside the [`SourceTree`], the temporary-name counter, and the event
//! registry. Two passes never share state, so files can be instrumented
//! in parallel.

use tracing::debug;

use cstep_cparse::ParseTree;
use cstep_cst::{describe, Handle, Replace, Rewriter, SourceTree};

use crate::error::InstrumentError;
use crate::event::{EventId, NotifyData, NotifyRegistry};
use crate::options::InstrumentOptions;
use crate::shapes::Notify;
use crate::visitor::InstrumentVisitor;

/// Hands out `temp0`, `temp1`, ... for one pass.
#[derive(Debug, Clone)]
pub struct TempAllocator {
    prefix: String,
    next: usize,
}

impl TempAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        TempAllocator {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn fresh(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }

    /// Number of names handed out so far.
    pub fn count(&self) -> usize {
        self.next
    }
}

/// Mutable state shared by the rules and the shapes of one pass.
#[derive(Debug, Clone)]
pub struct PassState {
    pub options: InstrumentOptions,
    pub temps: TempAllocator,
    pub events: NotifyRegistry,
}

impl PassState {
    pub fn new(options: InstrumentOptions) -> Self {
        PassState {
            temps: TempAllocator::new(options.temp_prefix.clone()),
            events: NotifyRegistry::new(),
            options,
        }
    }

    pub fn event(&mut self, data: NotifyData) -> EventId {
        self.events.push(data)
    }

    /// Assign the next reference to `group` and render its hook call.
    pub fn call(&mut self, group: &[EventId]) -> Result<String, InstrumentError> {
        self.events.call(group, &self.options)
    }
}

/// One file being instrumented.
#[derive(Debug)]
pub struct Pass {
    pub tree: SourceTree,
    pub state: PassState,
}

impl Pass {
    /// Build the source tree of `source`; fails if it does not round-trip.
    pub fn new(source: &str, parse: ParseTree, options: InstrumentOptions) -> Result<Self, InstrumentError> {
        let tree = SourceTree::build(source, parse)?;
        Ok(Pass {
            tree,
            state: PassState::new(options),
        })
    }

    /// Run the rules and return the modification forest, creating the
    /// pass's events along the way.
    pub fn plan(&mut self) -> Result<Vec<Replace<Notify>>, InstrumentError> {
        let modification = InstrumentVisitor::new(&self.tree, &mut self.state).visit_tree()?;
        let modifications: Vec<_> = modification.into_iter().collect();
        debug!(
            events = self.state.events.len(),
            temporaries = self.state.temps.count(),
            "planned instrumentation"
        );
        Ok(modifications)
    }

    /// Apply a planned forest, assigning every event its reference.
    pub fn apply(&mut self, modifications: &[Replace<Notify>]) -> Result<Handle, InstrumentError> {
        let root = self.tree.root();
        let mut rewriter: Rewriter<'_, Notify> = Rewriter::new(&mut self.tree, &mut self.state);
        rewriter.apply_all(root, modifications)
    }

    /// Human-readable dump of a planned forest.
    pub fn describe(&self, modifications: &[Replace<Notify>]) -> String {
        describe(&self.tree, modifications)
    }
}
