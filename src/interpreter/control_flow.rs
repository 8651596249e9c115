use crate::value::Value;

/// Signal threaded through statement execution in place of unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Normal,
    Breaking,
    Continuing,
    Returning,
}

/// Caller state saved by `enter_function`.
#[derive(Debug, Clone)]
pub struct FlowSnapshot {
    flow: FlowState,
    return_value: Value,
    loop_depth: usize,
    switch_depth: usize,
}

#[derive(Debug, Clone)]
pub struct ControlContext {
    pub flow: FlowState,
    return_value: Value,
    loop_depth: usize,
    switch_depth: usize,
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlContext {
    pub fn new() -> Self {
        Self {
            flow: FlowState::Normal,
            return_value: Value::None,
            loop_depth: 0,
            switch_depth: 0,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.flow == FlowState::Normal
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    pub fn enter_switch(&mut self) {
        self.switch_depth += 1;
    }

    pub fn exit_switch(&mut self) {
        self.switch_depth = self.switch_depth.saturating_sub(1);
    }

    pub fn can_break(&self) -> bool {
        self.loop_depth > 0 || self.switch_depth > 0
    }

    pub fn can_continue(&self) -> bool {
        self.loop_depth > 0
    }

    pub fn set_return(&mut self, value: Value) {
        self.return_value = value;
        self.flow = FlowState::Returning;
    }

    /// The returned value, or None if the body fell off the end.
    pub fn take_return_value(&mut self) -> Value {
        if self.flow == FlowState::Returning {
            std::mem::replace(&mut self.return_value, Value::None)
        } else {
            Value::None
        }
    }

    /// Save the caller's state and reset for a fresh call.
    pub fn enter_function(&mut self) -> FlowSnapshot {
        let snapshot = FlowSnapshot {
            flow: self.flow,
            return_value: std::mem::replace(&mut self.return_value, Value::None),
            loop_depth: self.loop_depth,
            switch_depth: self.switch_depth,
        };
        self.flow = FlowState::Normal;
        self.loop_depth = 0;
        self.switch_depth = 0;
        snapshot
    }

    pub fn restore(&mut self, snapshot: FlowSnapshot) {
        self.flow = snapshot.flow;
        self.return_value = snapshot.return_value;
        self.loop_depth = snapshot.loop_depth;
        self.switch_depth = snapshot.switch_depth;
    }
}
