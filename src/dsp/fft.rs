use std::f32::consts::PI;

use crate::dsp::complex::Complex;

/// Recursive radix-2 Cooley-Tukey FFT. `buf.len()` must be a power of two.
pub fn fft_in_place(buf: &mut [Complex]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }

    let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
    let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);
    for (i, &sample) in buf.iter().enumerate() {
        if i % 2 == 0 {
            even.push(sample);
        } else {
            odd.push(sample);
        }
    }

    fft_in_place(&mut even);
    fft_in_place(&mut odd);

    // P(ω)  = Pₑ(ω²) + ωPₒ(ω²)
    // P(-ω) = Pₑ(ω²) - ωPₒ(ω²)
    // where ω = e^(-i2πk/n), and -ω^j = ω^(j + n/2)
    for j in 0..n / 2 {
        let theta = (2.0 * PI * j as f32) / n as f32;
        let omega = Complex::from_polar(1.0, -theta);

        buf[j] = even[j] + (omega * odd[j]);
        buf[j + n / 2] = even[j] - (omega * odd[j]);
    }
}

pub fn to_complex_buffer(samples: &[f32]) -> Vec<Complex> {
    samples.iter().map(|&s| Complex::new(s, 0.0)).collect()
}
