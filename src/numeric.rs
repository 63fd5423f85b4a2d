// Fixed-width positional numeric codec: a batch of numbers <-> a
// concatenation of fixed-width base-B digit groups.

use crate::alphabet::{Alphabet, Base};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Float,
}

/// Parameters describing how a batch of numbers is encoded: the numeric
/// domain, decimal precision, sign, fixed width and alphabet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericParams {
    pub kind: NumericKind,
    pub precision: u32,
    pub signed: bool,
    pub width: u32,
    pub base: Base,
}

impl NumericParams {
    /// Bias added to signed values before encoding so the encoded domain is
    /// non-negative: `floor(B^w / 2)`.
    pub fn bias(&self) -> i128 {
        if self.signed {
            self.domain_size() / 2
        } else {
            0
        }
    }

    /// `B^w`, the number of distinct states the width can represent.
    pub fn domain_size(&self) -> i128 {
        (self.base.as_u32() as i128).pow(self.width)
    }

    /// Minimum `w` such that `base^w > bound`. `bound` is a real-valued
    /// magnitude (already scaled by precision and sign doubling, where
    /// applicable), so the comparison is done in floating point to avoid
    /// truncating a bound that should round up.
    pub fn min_width(base: Base, bound: f64) -> u32 {
        let base_f = base.as_u32() as f64;
        let mut w = 1u32;
        let mut cap = base_f;
        while cap <= bound {
            cap *= base_f;
            w += 1;
        }
        w
    }
}

/// Encodes/decodes a vector of numbers as fixed-width base-B digit groups.
pub struct NumericCodec {
    alphabet: Alphabet,
    params: NumericParams,
}

impl NumericCodec {
    pub fn new(params: NumericParams) -> Self {
        Self {
            alphabet: Alphabet::new(params.base),
            params,
        }
    }

    pub fn params(&self) -> &NumericParams {
        &self.params
    }

    /// Produces exactly `values.len() * width` characters.
    pub fn encode(&self, values: &[f64]) -> Result<String> {
        let w = self.params.width as usize;
        let mut out = String::with_capacity(values.len() * w);
        for value in values {
            let code = self.encode_one(*value)?;
            self.push_digits(code, &mut out);
        }
        Ok(out)
    }

    fn encode_one(&self, value: f64) -> Result<i128> {
        let scale = 10f64.powi(self.params.precision as i32);
        let scaled = match self.params.kind {
            NumericKind::Float => value * scale,
            NumericKind::Int => value,
        };
        let biased = scaled + self.params.bias() as f64;
        // half-away-from-zero on the non-negative, post-bias integer
        let rounded = (biased + 0.5).floor() as i128;
        let domain = self.params.domain_size();
        if rounded < 0 || rounded >= domain {
            return Err(Error::OutOfRange {
                field: "value",
                value: format!("{value}"),
                min: format!("{}", -self.params.bias() as f64 / scale),
                max: format!("{}", (domain - self.params.bias()) as f64 / scale),
            });
        }
        Ok(rounded)
    }

    fn push_digits(&self, mut code: i128, out: &mut String) {
        let base = self.params.base.as_u32() as i128;
        let w = self.params.width;
        for i in 0..w {
            let place = base.pow(w - 1 - i);
            let digit = code / place;
            code %= place;
            out.push(self.alphabet.forward(digit as u32) as char);
        }
    }

    /// `string.len()` must be a multiple of `width`.
    pub fn decode(&self, s: &str) -> Result<Vec<f64>> {
        let bytes = s.as_bytes();
        let w = self.params.width as usize;
        if w == 0 || bytes.len() % w != 0 {
            return Err(Error::MalformedInput {
                field: "data",
                len: bytes.len(),
                width: w,
            });
        }
        let n = bytes.len() / w;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(self.decode_one(&bytes[i * w..(i + 1) * w], i * w)?);
        }
        Ok(out)
    }

    fn decode_one(&self, group: &[u8], base_offset: usize) -> Result<f64> {
        let base = self.params.base.as_u32() as i128;
        let mut code: i128 = 0;
        for (i, byte) in group.iter().enumerate() {
            let digit = self.alphabet.inverse(*byte, base_offset + i)? as i128;
            let place_exp = (group.len() - 1 - i) as u32;
            code += digit * base.pow(place_exp);
        }
        code -= self.params.bias();
        let value = match self.params.kind {
            NumericKind::Int => code as f64,
            NumericKind::Float => code as f64 / 10f64.powi(self.params.precision as i32),
        };
        Ok(value)
    }
}
