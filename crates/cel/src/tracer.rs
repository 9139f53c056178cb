//! Zero-cost trait-based evaluation tracing, grounded on the teacher's
//! `tracer.rs` (`VmTracer`/`NoopTracer`/`StderrTracer`/`ProfilingTracer`/
//! `RecordingTracer`). The interpreter is generic over `EvalTracer` the same
//! way the teacher's VM is generic over `VmTracer`, so the default
//! (`NoopTracer`) path compiles away entirely.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::ast::NodeId;
use crate::value::Value;

/// Hooks the interpreter calls at well-defined points (spec §4.4 "State
/// tracking"). All methods default to doing nothing.
pub trait EvalTracer {
    fn on_node(&self, _id: NodeId, _result: &Value) {}
    fn on_call(&self, _id: NodeId, _function: &str, _overload_id: &str) {}
    fn on_loop_step(&self, _comprehension_id: NodeId, _iteration: u64) {}
    fn on_absorb(&self, _id: NodeId, _side: &str) {}
    fn on_interrupt(&self, _id: NodeId) {}
}

/// The default: every hook is a no-op, so it optimizes away completely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Human-readable line-per-event trace to stderr, for `cel-cli --trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_node(&self, id: NodeId, result: &Value) {
        eprintln!("node {id} => {result}");
    }

    fn on_call(&self, id: NodeId, function: &str, overload_id: &str) {
        eprintln!("node {id}: call {function} via overload {overload_id}");
    }

    fn on_loop_step(&self, comprehension_id: NodeId, iteration: u64) {
        eprintln!("node {comprehension_id}: loop step {iteration}");
    }

    fn on_absorb(&self, id: NodeId, side: &str) {
        eprintln!("node {id}: short-circuit absorbed {side} side");
    }

    fn on_interrupt(&self, id: NodeId) {
        eprintln!("node {id}: interrupted");
    }
}

/// One recorded tracer event, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Node { id: NodeId, value: String },
    Call { id: NodeId, function: String, overload_id: String },
    LoopStep { comprehension_id: NodeId, iteration: u64 },
    Absorb { id: NodeId, side: String },
    Interrupt { id: NodeId },
}

/// Captures every event in order, and keeps the last value produced per node
/// id — this is the "interpreter may record per-node-id the last value it
/// produced" facility spec §4.4 calls for, made concrete.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: RefCell<Vec<TraceEvent>>,
    last_value: RefCell<HashMap<NodeId, String>>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn last_value_of(&self, id: NodeId) -> Option<String> {
        self.last_value.borrow().get(&id).cloned()
    }
}

impl EvalTracer for RecordingTracer {
    fn on_node(&self, id: NodeId, result: &Value) {
        let rendered = result.to_string();
        self.last_value.borrow_mut().insert(id, rendered.clone());
        self.events.borrow_mut().push(TraceEvent::Node { id, value: rendered });
    }

    fn on_call(&self, id: NodeId, function: &str, overload_id: &str) {
        self.events.borrow_mut().push(TraceEvent::Call {
            id,
            function: function.to_string(),
            overload_id: overload_id.to_string(),
        });
    }

    fn on_loop_step(&self, comprehension_id: NodeId, iteration: u64) {
        self.events.borrow_mut().push(TraceEvent::LoopStep { comprehension_id, iteration });
    }

    fn on_absorb(&self, id: NodeId, side: &str) {
        self.events.borrow_mut().push(TraceEvent::Absorb { id, side: side.to_string() });
    }

    fn on_interrupt(&self, id: NodeId) {
        self.events.borrow_mut().push(TraceEvent::Interrupt { id });
    }
}

/// Aggregate counters: how many times each node id was dispatched, and how
/// many times each (function, overload_id) pair was selected.
#[derive(Debug, Clone, Default)]
pub struct ProfilingReport {
    pub node_dispatch_counts: HashMap<NodeId, u64>,
    pub overload_selection_counts: HashMap<(String, String), u64>,
}

/// Counts node dispatch and overload-selection frequency without retaining
/// full event history (cheaper than [`RecordingTracer`] for long-running
/// evaluations under profiling).
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    report: RefCell<ProfilingReport>,
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        self.report.borrow().clone()
    }
}

impl EvalTracer for ProfilingTracer {
    fn on_node(&self, id: NodeId, _result: &Value) {
        *self.report.borrow_mut().node_dispatch_counts.entry(id).or_insert(0) += 1;
    }

    fn on_call(&self, _id: NodeId, function: &str, overload_id: &str) {
        *self
            .report
            .borrow_mut()
            .overload_selection_counts
            .entry((function.to_string(), overload_id.to_string()))
            .or_insert(0) += 1;
    }
}
