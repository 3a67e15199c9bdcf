//! Dry signal to both outputs

use crate::effect::{Effect, ProcessContext};

/// Copies the input unchanged to both output channels. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl Effect for PassThrough {
    fn process(&mut self, _ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            *l = x;
            *r = x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_input_to_both_channels() {
        let ctx = ProcessContext { sample_rate: 44100, buffer_size: 4 };
        let input = [0.1, -0.2, 0.3, -0.4];
        let mut left = [0.0; 4];
        let mut right = [9.0; 4];

        PassThrough.process(&ctx, &input, &mut left, &mut right);

        assert_eq!(left, input);
        assert_eq!(right, input);
    }
}
