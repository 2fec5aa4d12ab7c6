use crate::{Error, Result};

/// The maximum number of operands allowed during parsing.
const MAX_OPERANDS_LEN: usize = 48;

/// An arguments stack for interpreting charstrings.
#[derive(Debug, Default)]
pub struct ArgumentsStack {
    data: Vec<f64>,
}

impl ArgumentsStack {
    /// Create a new argument stack.
    pub fn new() -> Self {
        Self { data: Vec::with_capacity(MAX_OPERANDS_LEN) }
    }

    /// The current length of the arguments stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Push a new number onto the stack.
    #[inline]
    pub fn push(&mut self, n: f64) -> Result<()> {
        if self.len() == MAX_OPERANDS_LEN {
            Err(Error::MalformedFont)
        } else {
            self.data.push(n);
            Ok(())
        }
    }

    /// Pop a number from the stack.
    #[inline]
    pub fn pop(&mut self) -> Result<f64> {
        self.data.pop().ok_or(Error::MalformedFont)
    }

    /// Remove the number at the bottom of the stack.
    #[inline]
    pub fn shift(&mut self) -> Option<f64> {
        (!self.data.is_empty()).then(|| self.data.remove(0))
    }

    /// The number `depth` entries below the top.
    #[inline]
    pub fn peek(&self, depth: usize) -> Result<f64> {
        let index = self.len().checked_sub(depth + 1).ok_or(Error::MalformedFont)?;
        Ok(self.data[index])
    }

    /// Rotate the top `n` numbers by `j` positions towards the top.
    pub fn roll(&mut self, n: usize, j: isize) -> Result<()> {
        let start = self.len().checked_sub(n).ok_or(Error::MalformedFont)?;
        let top = &mut self.data[start..];
        if n > 0 {
            let shift = j.rem_euclid(n as isize) as usize;
            top.rotate_right(shift);
        }
        Ok(())
    }

    /// Remove all numbers from the stack.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
