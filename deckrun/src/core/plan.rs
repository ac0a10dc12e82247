//! Parameter sweeps: variable bindings and the lazy Cartesian job planner.

use serde::Serialize;

use crate::core::deck::Deck;
use crate::core::error::BindError;
use crate::core::target::FieldTarget;
use crate::core::values::tokens;

/// One swept field and its candidate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub target: FieldTarget,
    pub values: Vec<String>,
    /// Candidates are file paths staged under the field's unit.
    pub file_role: bool,
}

impl Binding {
    /// Resolve `target` against the deck and take the file role from the
    /// field.
    pub fn new(deck: &Deck, target: FieldTarget, values: Vec<String>) -> Result<Self, BindError> {
        let field = deck.resolve(&target)?;
        if values.is_empty() {
            return Err(BindError::NoCandidates { target });
        }
        let file_role = field.is_input_file();
        Ok(Self {
            target,
            values,
            file_role,
        })
    }
}

/// Ordered set of bindings with distinct targets.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    bindings: Vec<Binding>,
}

impl Sweep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: Binding) -> Result<(), BindError> {
        if binding.values.is_empty() {
            return Err(BindError::NoCandidates {
                target: binding.target,
            });
        }
        if self.bindings.iter().any(|b| b.target == binding.target) {
            return Err(BindError::Duplicate {
                target: binding.target,
            });
        }
        self.bindings.push(binding);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Binding> {
        (index < self.bindings.len()).then(|| self.bindings.remove(index))
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of jobs the sweep expands to (0 with no bindings).
    pub fn total_jobs(&self) -> usize {
        job_count(&self.bindings)
    }

    pub fn plans(&self) -> Plans<'_> {
        plan(&self.bindings)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub target: FieldTarget,
    pub value: String,
    pub file_role: bool,
}

/// One combination of candidate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPlan {
    /// One-based ordinal within the sweep.
    pub id: usize,
    pub assignments: Vec<Assignment>,
    pub dir_name: String,
}

impl JobPlan {
    /// `field=value` pairs for progress output.
    pub fn describe(&self) -> String {
        self.assignments
            .iter()
            .map(|a| format!("{}={}", a.target.field, a.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lazy Cartesian product; the first binding varies slowest.
#[derive(Debug, Clone)]
pub struct Plans<'a> {
    bindings: &'a [Binding],
    counters: Vec<usize>,
    next_id: usize,
    remaining: usize,
}

pub fn plan(bindings: &[Binding]) -> Plans<'_> {
    Plans {
        bindings,
        counters: vec![0; bindings.len()],
        next_id: 1,
        remaining: job_count(bindings),
    }
}

fn job_count(bindings: &[Binding]) -> usize {
    if bindings.is_empty() {
        return 0;
    }
    bindings
        .iter()
        .try_fold(1usize, |acc, b| acc.checked_mul(b.values.len()))
        .unwrap_or(usize::MAX)
}

impl Iterator for Plans<'_> {
    type Item = JobPlan;

    fn next(&mut self) -> Option<JobPlan> {
        if self.remaining == 0 {
            return None;
        }
        let assignments: Vec<Assignment> = self
            .bindings
            .iter()
            .zip(&self.counters)
            .map(|(binding, &i)| Assignment {
                target: binding.target.clone(),
                value: binding.values[i].clone(),
                file_role: binding.file_role,
            })
            .collect();
        let id = self.next_id;
        let plan = JobPlan {
            id,
            dir_name: dir_name(id, &assignments),
            assignments,
        };

        self.next_id += 1;
        self.remaining -= 1;
        for (counter, binding) in self.counters.iter_mut().zip(self.bindings).rev() {
            *counter += 1;
            if *counter < binding.values.len() {
                break;
            }
            *counter = 0;
        }
        Some(plan)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Plans<'_> {}

/// `Run_<id>_<field>_<value>...`
pub fn dir_name(id: usize, assignments: &[Assignment]) -> String {
    let mut parts = vec![format!("Run_{id}")];
    for assignment in assignments {
        parts.push(format!(
            "{}_{}",
            assignment.target.field,
            sanitize(&assignment.value)
        ));
    }
    parts.join("_")
}

/// Last path component, `.` → `p`, anything else outside `[A-Za-z0-9_+-]`
/// → `_`.
pub fn sanitize(value: &str) -> String {
    let base = value
        .trim()
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("");
    base.chars()
        .map(|c| match c {
            '.' => 'p',
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-') => c,
            _ => '_',
        })
        .collect()
}

/// Candidate list from free text: whitespace, commas and newlines separate.
pub fn parse_candidates(raw: &str) -> Vec<String> {
    tokens(raw).into_iter().map(str::to_string).collect()
}
