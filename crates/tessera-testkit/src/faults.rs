//! Fault plans for failing selected collaborator calls

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// How often an operation should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Every call fails
    Always,
    /// The next `n` calls fail, then the operation recovers
    Times(u32),
}

/// Per-operation faults, plus faults keyed on a call argument (tuple id, path)
#[derive(Debug)]
pub struct FaultPlan<Op> {
    by_op: HashMap<Op, FaultMode>,
    by_key: HashSet<String>,
}

impl<Op> Default for FaultPlan<Op> {
    fn default() -> Self {
        Self {
            by_op: HashMap::new(),
            by_key: HashSet::new(),
        }
    }
}

impl<Op: Copy + Eq + Hash> FaultPlan<Op> {
    pub fn set(&mut self, op: Op, mode: FaultMode) {
        self.by_op.insert(op, mode);
    }

    pub fn fail_key(&mut self, key: impl Into<String>) {
        self.by_key.insert(key.into());
    }

    pub fn clear(&mut self) {
        self.by_op.clear();
        self.by_key.clear();
    }

    /// Decide whether this call fails, consuming one `Times` charge if so
    pub fn should_fail(&mut self, op: Op, key: Option<&str>) -> bool {
        if key.is_some_and(|k| self.by_key.contains(k)) {
            return true;
        }
        match self.by_op.get_mut(&op) {
            Some(FaultMode::Always) => true,
            Some(FaultMode::Times(n)) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Op {
        A,
        B,
    }

    #[test]
    fn test_times_fault_recovers() {
        let mut plan = FaultPlan::default();
        plan.set(Op::A, FaultMode::Times(2));
        assert!(plan.should_fail(Op::A, None));
        assert!(plan.should_fail(Op::A, None));
        assert!(!plan.should_fail(Op::A, None));
        assert!(!plan.should_fail(Op::B, None));
    }

    #[test]
    fn test_keyed_fault() {
        let mut plan = FaultPlan::default();
        plan.fail_key("t-2");
        assert!(plan.should_fail(Op::B, Some("t-2")));
        assert!(!plan.should_fail(Op::B, Some("t-1")));
        plan.clear();
        assert!(!plan.should_fail(Op::B, Some("t-2")));
    }
}
