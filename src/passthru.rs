use jack_bridge::{ProcessHandler, ProcessScope, ProcessStatus};

/// Copies input `i` to output `i` with a fixed gain; extra outputs are silenced
pub struct Passthru {
    gain: f32,
}

impl Passthru {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }
}

impl ProcessHandler for Passthru {
    fn process(&mut self, scope: &mut ProcessScope<'_>) -> ProcessStatus {
        for i in 0..scope.output_count() {
            let input = scope.input(i);
            let Some(output) = scope.output(i) else {
                return ProcessStatus::Failed;
            };
            match input {
                Some(input) => apply_gain(input, output, self.gain),
                None => output.fill(0.0),
            }
        }
        ProcessStatus::Continue
    }
}

pub fn apply_gain(input: &[f32], output: &mut [f32], gain: f32) {
    for (out, sample) in output.iter_mut().zip(input) {
        *out = sample * gain;
    }
}
