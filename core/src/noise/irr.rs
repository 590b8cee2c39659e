// Instantaneous Randomized Response
//
// PRR bit 0 → reported as 1 with probability p
// PRR bit 1 → reported as 1 with probability q
// Fresh randomness on every call; never cached.

use super::source::NoiseMaskSource;

pub fn compute_irr<S>(prr: u32, source: &mut S, p_prob: f64, q_prob: f64, num_bits: u32) -> u32
where
    S: NoiseMaskSource + ?Sized,
{
    let p_mask = source.generate_p_mask(p_prob, num_bits);
    let q_mask = source.generate_q_mask(q_prob, num_bits);
    (p_mask & !prr) | (q_mask & prr)
}
