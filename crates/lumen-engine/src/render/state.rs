//! Per-frame pipeline state and the ping-pong blur schedule.

/// Where a blur iteration reads from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlurSource {
    /// The bright-pass output. It lives in ping-pong buffer 0.
    BrightOutput,
    PingPong(usize),
}

impl BlurSource {
    /// Ping-pong buffer index backing this source.
    pub fn index(self) -> usize {
        match self {
            BlurSource::BrightOutput => 0,
            BlurSource::PingPong(i) => i,
        }
    }
}

/// One blur iteration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlurStep {
    pub iteration: u32,
    pub horizontal: bool,
    pub read: BlurSource,
    pub write: usize,
}

/// Alternating state carried through the blur stage of one frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PipelineState {
    pub horizontal: bool,
    pub first_iteration: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            horizontal: true,
            first_iteration: true,
        }
    }
}

impl PipelineState {
    /// Resets to the start-of-frame state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Ping-pong buffer holding the blurred result once the loop has run.
    pub fn final_index(&self) -> usize {
        usize::from(!self.horizontal)
    }

    fn advance(&mut self, iteration: u32) -> BlurStep {
        let read = if self.first_iteration {
            BlurSource::BrightOutput
        } else {
            BlurSource::PingPong(usize::from(!self.horizontal))
        };
        let step = BlurStep {
            iteration,
            horizontal: self.horizontal,
            read,
            write: usize::from(self.horizontal),
        };
        self.horizontal = !self.horizontal;
        self.first_iteration = false;
        step
    }
}

/// Iterator over the blur iterations of one frame.
///
/// Iteration 0 reads the bright-pass output; every later iteration reads the
/// buffer the previous one wrote. Reads and writes never alias.
#[derive(Debug, Clone)]
pub struct BlurSchedule {
    state: PipelineState,
    next: u32,
    iterations: u32,
}

impl BlurSchedule {
    pub fn new(iterations: u32) -> Self {
        Self::resume(PipelineState::default(), iterations)
    }

    /// Runs the schedule over an existing state, which is reset first.
    pub fn resume(mut state: PipelineState, iterations: u32) -> Self {
        state.reset();
        Self {
            state,
            next: 0,
            iterations,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Buffer holding the result after the schedule has been driven to the end.
    pub fn final_index(&self) -> usize {
        self.state.final_index()
    }

    /// Final buffer for `iterations` without stepping through them.
    pub fn final_index_for(iterations: u32) -> usize {
        let mut schedule = Self::new(iterations);
        schedule.by_ref().for_each(drop);
        schedule.final_index()
    }
}

impl Iterator for BlurSchedule {
    type Item = BlurStep;

    fn next(&mut self) -> Option<BlurStep> {
        if self.next >= self.iterations {
            return None;
        }
        let step = self.state.advance(self.next);
        self.next += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.iterations - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BlurSchedule {}
