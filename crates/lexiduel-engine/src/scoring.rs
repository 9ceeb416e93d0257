//! Word scoring and the round penalty rule.
//!
//! Scoring fails closed: anything that can't be positively validated is
//! worth 0 points. The only soft edge is the dictionary — a word that
//! starts with the right letter but isn't in the dictionary (or couldn't
//! be checked) is marked for manual validation, so players have recourse
//! against an incomplete word list.

use lexiduel_protocol::CategoryId;
use tracing::warn;

use crate::Dictionary;

/// The verdict for one submitted word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordScore {
    /// Whether the word counts.
    pub is_valid: bool,
    /// Points awarded (0 unless valid).
    pub points: u32,
    /// Whether the player may contest this verdict by vote.
    pub needs_manual_validation: bool,
}

impl WordScore {
    fn rejected() -> Self {
        Self {
            is_valid: false,
            points: 0,
            needs_manual_validation: false,
        }
    }
}

/// Scores one word against the round letter and the dictionary.
///
/// - Empty (or whitespace-only) words are invalid, no recourse.
/// - A word not starting with the round letter (case-insensitive) is
///   invalid, no recourse — the player could see that themselves.
/// - Otherwise the dictionary decides: a hit is worth
///   `points_per_word`; a miss *or a lookup failure* is invalid but
///   contestable.
pub async fn score_word<D: Dictionary>(
    dictionary: &D,
    word: &str,
    letter: char,
    category_id: CategoryId,
    points_per_word: u32,
) -> WordScore {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return WordScore::rejected();
    }
    if !trimmed
        .to_lowercase()
        .starts_with(letter.to_ascii_lowercase())
    {
        return WordScore::rejected();
    }

    match dictionary.validate_word(trimmed, category_id).await {
        Ok(true) => WordScore {
            is_valid: true,
            points: points_per_word,
            needs_manual_validation: false,
        },
        Ok(false) => WordScore {
            is_valid: false,
            points: 0,
            needs_manual_validation: true,
        },
        Err(e) => {
            warn!(
                word = %trimmed,
                %category_id,
                error = %e,
                "dictionary lookup failed, deferring to manual validation"
            );
            WordScore {
                is_valid: false,
                points: 0,
                needs_manual_validation: true,
            }
        }
    }
}

/// Applies the early-stop penalty to a raw round score.
///
/// The penalty punishes gaming the clock: ending the round voluntarily
/// with every category filled while at least one word is invalid costs
/// a flat `penalty`, floored at 0. Rounds ended by the timer, by the
/// opponent finishing, or by a mutually accepted end request record
/// `stopped_early = false` and are never penalized.
///
/// Returns the final score and whether the penalty was applied.
pub fn finalize_round_score(
    raw_score: u32,
    stopped_early: bool,
    all_categories_answered: bool,
    any_invalid: bool,
    penalty: u32,
) -> (u32, bool) {
    if stopped_early && all_categories_answered && any_invalid {
        (raw_score.saturating_sub(penalty), true)
    } else {
        (raw_score, false)
    }
}
