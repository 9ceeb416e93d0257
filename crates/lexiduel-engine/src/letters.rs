//! Letter rotation — each round draws a letter the room hasn't used.
//!
//! The draw is uniform over the unused pool. When the full alphabet has
//! been exhausted the pool resets and the draw covers all 26 again, so
//! a long match keeps making progress at the cost of one repeat per
//! 26-round cycle.

use lexiduel_protocol::Room;
use rand::Rng;

/// The round-letter alphabet.
pub const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N',
    'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Draws the next round's letter and records it in the room's used set.
///
/// The caller persists the mutated room. Only the host draws (round
/// creation is host-only), so two clients never race this.
pub fn next_letter(room: &mut Room) -> char {
    let mut unused: Vec<char> = ALPHABET
        .iter()
        .copied()
        .filter(|c| !room.used_letters.contains(c))
        .collect();

    if unused.is_empty() {
        room.used_letters.clear();
        unused = ALPHABET.to_vec();
    }

    let pick = unused[rand::rng().random_range(0..unused.len())];
    room.used_letters.push(pick);
    pick
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexiduel_protocol::{RoomId, RoomStatus};

    fn empty_room() -> Room {
        Room {
            id: RoomId(1),
            code: "ABCD".into(),
            letter: None,
            status: RoomStatus::Playing,
            max_players: 2,
            used_letters: Vec::new(),
            current_round_number: 0,
            created_at: 0,
            started_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn test_no_repeats_until_alphabet_exhausted() {
        let mut room = empty_room();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..26 {
            let letter = next_letter(&mut room);
            assert!(seen.insert(letter), "letter {letter} repeated early");
            assert!(ALPHABET.contains(&letter));
        }
        assert_eq!(room.used_letters.len(), 26);
    }

    #[test]
    fn test_exhausted_pool_resets_to_single_letter() {
        let mut room = empty_room();
        for _ in 0..26 {
            next_letter(&mut room);
        }

        // The 27th draw must reuse a letter and leave the used set
        // containing exactly that one.
        let letter = next_letter(&mut room);
        assert_eq!(room.used_letters, vec![letter]);
    }

    #[test]
    fn test_draw_avoids_preexisting_used_letters() {
        let mut room = empty_room();
        room.used_letters = ALPHABET[..25].to_vec();

        // Only 'Z' remains.
        assert_eq!(next_letter(&mut room), 'Z');
    }
}
