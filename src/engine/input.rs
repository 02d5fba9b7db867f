use bitflags::bitflags;

bitflags! {
    /// Per-tick input snapshot supplied by the input system.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MovementInput: u8 {
        const MOVE_LEFT  = 1 << 0;
        const MOVE_RIGHT = 1 << 1;
        /// Edge-triggered: set only on the tick the jump key went down.
        const JUMP       = 1 << 2;
        /// Forwarded to ability systems; the core ignores it.
        const DASH       = 1 << 3;
    }
}

impl MovementInput {
    /// -1, 0 or +1. Opposing keys cancel.
    pub fn horizontal_axis(self) -> f32 {
        let right = self.contains(Self::MOVE_RIGHT) as i32;
        let left = self.contains(Self::MOVE_LEFT) as i32;
        (right - left) as f32
    }

    pub fn has_direction(self) -> bool {
        self.horizontal_axis() != 0.0
    }

    pub fn jump_pressed(self) -> bool {
        self.contains(Self::JUMP)
    }

    pub fn dash_pressed(self) -> bool {
        self.contains(Self::DASH)
    }
}

/// One span of a scripted input timeline: `input` is held for ticks in
/// `[start, end)`. Edge-triggered bits (jump, dash) fire only on `start`.
#[derive(Clone, Copy, Debug)]
pub struct ScriptedSpan {
    pub start: u64,
    pub end: u64,
    pub input: MovementInput,
}

/// Deterministic input source used by the headless runner and tests.
#[derive(Clone, Debug, Default)]
pub struct InputScript {
    spans: Vec<ScriptedSpan>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, start: u64, end: u64, input: MovementInput) -> Self {
        self.spans.push(ScriptedSpan { start, end, input });
        self
    }

    pub fn press(self, tick: u64, input: MovementInput) -> Self {
        self.hold(tick, tick + 1, input)
    }

    pub fn at(&self, tick: u64) -> MovementInput {
        let edge = MovementInput::JUMP | MovementInput::DASH;
        self.spans
            .iter()
            .filter(|s| tick >= s.start && tick < s.end)
            .fold(MovementInput::empty(), |acc, s| {
                let held = s.input - edge;
                let pressed = if tick == s.start { s.input & edge } else { MovementInput::empty() };
                acc | held | pressed
            })
    }
}
