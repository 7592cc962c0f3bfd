use std::io::{self, BufRead, Write};

/// Answers yes/no questions before the run starts. The stdin implementation
/// is swapped out for a canned one in tests.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} (y/N): ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        line.trim().eq_ignore_ascii_case("y")
    }
}

#[cfg(test)]
pub struct FixedConfirm(pub bool);

#[cfg(test)]
impl Confirm for FixedConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
