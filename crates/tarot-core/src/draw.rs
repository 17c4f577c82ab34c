//! Validation and resolution of user-entered draw numbers.

use std::collections::HashSet;

use crate::card::Card;
use crate::deck::Deck;
use crate::error::DrawError;

/// Validate one submission of draw numbers against a deck of `deck_size` cards.
///
/// Slots are checked in order and the first failure wins: an empty slot, then
/// a value that is not plain ASCII digits in `1..=deck_size`, then a value
/// already seen earlier in the submission. Nothing is resolved unless every
/// slot passes.
pub fn validate_numbers<S: AsRef<str>>(
    inputs: &[S],
    required: usize,
    deck_size: usize,
) -> Result<Vec<usize>, DrawError> {
    if inputs.len() != required {
        return Err(DrawError::WrongCount {
            expected: required,
            got: inputs.len(),
        });
    }

    let mut seen = HashSet::with_capacity(inputs.len());
    let mut numbers = Vec::with_capacity(inputs.len());
    for (i, raw) in inputs.iter().enumerate() {
        let position = i + 1;
        let text = raw.as_ref().trim();
        if text.is_empty() {
            return Err(DrawError::MissingNumber { position });
        }
        let digits_only = text.bytes().all(|b| b.is_ascii_digit());
        let number = match text.parse::<usize>() {
            Ok(n) if digits_only && (1..=deck_size).contains(&n) => n,
            _ => {
                return Err(DrawError::InvalidNumber {
                    input: text.to_string(),
                    position,
                });
            }
        };
        if !seen.insert(number) {
            return Err(DrawError::DuplicateNumber { number });
        }
        numbers.push(number);
    }
    Ok(numbers)
}

/// Validate `inputs` and resolve each number against `deck`.
pub fn draw<'d, S: AsRef<str>>(
    deck: &'d Deck,
    inputs: &[S],
    required: usize,
) -> Result<Vec<(usize, &'d Card)>, DrawError> {
    let numbers = validate_numbers(inputs, required, deck.len())?;
    let mut drawn = Vec::with_capacity(numbers.len());
    for (i, number) in numbers.into_iter().enumerate() {
        let card = deck.resolve(number).ok_or_else(|| DrawError::InvalidNumber {
            input: number.to_string(),
            position: i + 1,
        })?;
        drawn.push((number, card));
    }
    Ok(drawn)
}
