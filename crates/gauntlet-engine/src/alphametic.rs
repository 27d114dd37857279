// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closed-form solver for canvas-rendered alphametic puzzles.
//!
//! Recognizes expressions of the shape `SEND + MORE = MONEY` in a canvas
//! snapshot and searches digit assignments column-wise with carry
//! propagation. The answer is the decimal value of the result word.
//!
//! This path exists to avoid spending backend budget on a puzzle family
//! solvable exactly. It must never guess: a solution is only accepted when
//! it matches the stage's published digest, or -- without a digest -- when it
//! is the puzzle's unique solution. Everything else falls through to the
//! backend path as "not applicable".

use std::sync::LazyLock;

use gauntlet_core::types::CanvasSnapshot;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+(?:\s*\+\s*[A-Z]+)+)\s*=\s*([A-Z]+)").unwrap());

/// Digit symbols available for assignment.
const DIGITS: usize = 10;

/// Search nodes before the solver gives up as "not applicable".
const NODE_BUDGET: u64 = 2_000_000;

/// Distinct assignments collected before the search stops.
const SOLUTION_CAP: usize = 16;

/// A parsed alphametic: two or more addend words and a result word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub addends: Vec<String>,
    pub sum: String,
}

/// Extract the first alphametic expression from free text.
pub fn parse_expression(text: &str) -> Option<Puzzle> {
    let caps = EXPRESSION.captures(text)?;
    let addends: Vec<String> = caps[1].split('+').map(|w| w.trim().to_string()).collect();
    if addends.len() < 2 {
        return None;
    }
    Some(Puzzle {
        addends,
        sum: caps[2].to_string(),
    })
}

/// Attempt a closed-form solution for the canvas snapshot.
///
/// Returns `None` whenever the snapshot does not contain a recognizable
/// puzzle or no assignment passes validation -- never a guess.
pub fn solve_canvas(canvas: &CanvasSnapshot) -> Option<String> {
    let expression = canvas.expression.as_deref()?;
    try_solve(expression, canvas.expected_digest.as_deref())
}

/// Solve an alphametic expression, validating against `expected_digest`
/// (a lowercase hex SHA-256 prefix of the answer string) when present.
pub fn try_solve(expression: &str, expected_digest: Option<&str>) -> Option<String> {
    let puzzle = parse_expression(expression)?;
    let (values, budget_exceeded) = enumerate_solutions(&puzzle)?;

    match expected_digest.map(|d| d.trim().to_lowercase()) {
        Some(digest) if !digest.is_empty() => {
            // Content-addressed check: accept the first assignment whose
            // answer hashes to the published signature.
            values.into_iter().map(|v| v.to_string()).find(|answer| {
                hex::encode(Sha256::digest(answer.as_bytes())).starts_with(&digest)
            })
        }
        _ => {
            // Without a signature only a provably unique solution is safe.
            if budget_exceeded || values.len() != 1 {
                debug!(
                    solutions = values.len(),
                    budget_exceeded, "alphametic not uniquely solvable"
                );
                return None;
            }
            Some(values[0].to_string())
        }
    }
}

/// Enumerate assignments up to the solution cap.
///
/// Returns the result-word values found and whether the node budget ran out.
/// `None` means the puzzle shape is out of range (too many letters, addend
/// longer than the sum).
fn enumerate_solutions(puzzle: &Puzzle) -> Option<(Vec<u64>, bool)> {
    let mut letters: Vec<char> = Vec::new();
    let letter_id = |c: char, letters: &mut Vec<char>| -> usize {
        match letters.iter().position(|&l| l == c) {
            Some(id) => id,
            None => {
                letters.push(c);
                letters.len() - 1
            }
        }
    };

    let mut addends: Vec<Vec<usize>> = Vec::new();
    for word in &puzzle.addends {
        if word.len() > puzzle.sum.len() {
            return None;
        }
        // Reversed: index 0 is the units column.
        addends.push(
            word.chars()
                .rev()
                .map(|c| letter_id(c, &mut letters))
                .collect(),
        );
    }
    let sum: Vec<usize> = puzzle
        .sum
        .chars()
        .rev()
        .map(|c| letter_id(c, &mut letters))
        .collect();

    if letters.len() > DIGITS {
        return None;
    }

    let mut leading = vec![false; letters.len()];
    for word in puzzle.addends.iter().chain(std::iter::once(&puzzle.sum)) {
        if word.len() > 1 {
            if let Some(first) = word.chars().next() {
                let id = letters.iter().position(|&l| l == first).unwrap_or(0);
                leading[id] = true;
            }
        }
    }

    let mut search = Search {
        addends,
        sum,
        leading,
        assignment: vec![None; letters.len()],
        used: [false; DIGITS],
        nodes: 0,
        budget_exceeded: false,
        solutions: Vec::new(),
    };
    search.run(0, 0, 0);

    Some((search.solutions, search.budget_exceeded))
}

struct Search {
    addends: Vec<Vec<usize>>,
    sum: Vec<usize>,
    leading: Vec<bool>,
    assignment: Vec<Option<u8>>,
    used: [bool; DIGITS],
    nodes: u64,
    budget_exceeded: bool,
    solutions: Vec<u64>,
}

impl Search {
    /// Column-wise depth-first search with carry propagation.
    ///
    /// `partial` accumulates the carry-in plus the digits of the addends
    /// already resolved for column `col`; `row` walks the addends and then
    /// fixes the sum digit.
    fn run(&mut self, col: usize, row: usize, partial: u32) {
        if self.budget_exceeded || self.solutions.len() >= SOLUTION_CAP {
            return;
        }
        self.nodes += 1;
        if self.nodes > NODE_BUDGET {
            self.budget_exceeded = true;
            return;
        }

        if col == self.sum.len() {
            if partial == 0 {
                self.record_solution();
            }
            return;
        }

        if row < self.addends.len() {
            if col >= self.addends[row].len() {
                self.run(col, row + 1, partial);
                return;
            }
            let li = self.addends[row][col];
            if let Some(d) = self.assignment[li] {
                self.run(col, row + 1, partial + u32::from(d));
                return;
            }
            for d in 0..DIGITS as u8 {
                if self.used[d as usize] || (d == 0 && self.leading[li]) {
                    continue;
                }
                self.assignment[li] = Some(d);
                self.used[d as usize] = true;
                self.run(col, row + 1, partial + u32::from(d));
                self.assignment[li] = None;
                self.used[d as usize] = false;
            }
            return;
        }

        // All addends resolved for this column: the sum digit is forced.
        let digit = (partial % 10) as u8;
        let carry = partial / 10;
        let li = self.sum[col];
        match self.assignment[li] {
            Some(d) if d == digit => self.run(col + 1, 0, carry),
            Some(_) => {}
            None => {
                if self.used[digit as usize] || (digit == 0 && self.leading[li]) {
                    return;
                }
                self.assignment[li] = Some(digit);
                self.used[digit as usize] = true;
                self.run(col + 1, 0, carry);
                self.assignment[li] = None;
                self.used[digit as usize] = false;
            }
        }
    }

    fn record_solution(&mut self) {
        let mut value: u64 = 0;
        for &li in self.sum.iter().rev() {
            let digit = self.assignment[li].unwrap_or(0);
            value = value * 10 + u64::from(digit);
        }
        self.solutions.push(value);
    }
}
