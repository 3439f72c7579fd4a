//! Player-facing Spanish copy.

use rand::Rng;

use crate::state::{games::Round, sampling::pick};

/// Learn mode reached the last card of the category.
pub const END_OF_CATEGORY: &str = "¡Llegaste al final de la categoría!";
/// Placeholder shown in place of a hidden picture.
pub const IMAGE_HIDDEN: &str = "Imagen oculta - ¡Lee la palabra!";
/// The selected category is not in the catalog.
pub const UNKNOWN_CATEGORY: &str = "No encontramos esa categoría";
/// Not enough words to build a round.
pub const ROUND_UNAVAILABLE: &str = "No hay palabras para jugar";

/// The host has no speech recognition.
pub const VOICE_UNSUPPORTED: &str = "Tu navegador no soporta comandos de voz.";
/// Recognition ended without a usable transcript.
pub const VOICE_NOT_HEARD: &str = "No te escuché bien, inténtalo de nuevo";
/// The spoken word matched the card.
pub const VOICE_MATCH: &str = "⭐ ¡Muy bien! ¡Perfecto!";

/// Right answer in a choice round.
pub const CORRECT: &str = "¡Correcto! 🎉";
/// A memory pair was matched.
pub const PAIR_FOUND: &str = "¡Par encontrado! 🎉";
/// Every memory pair is matched.
pub const BOARD_COMPLETE: &str = "¡Completaste el juego! 🌟";
/// Syllables or letters spell the whole word.
pub const WORD_COMPLETE: &str = "¡Palabra Completa! 🌟";
/// Spelling tile that does not fit the next slot.
pub const WRONG_LETTER: &str = "Esa no es. ¡Intenta otra!";
/// Classification into the wrong group.
pub const WRONG_BUCKET: &str = "No pertenece ahí. Intenta de nuevo";

/// Star counter was zeroed.
pub const STARS_RESET: &str = "⭐ Estrellas reiniciadas";
/// Question asked before zeroing the stars.
pub const CONFIRM_RESET: &str = "¿Estás seguro de que quieres reiniciar todas las estrellas?";

/// Spoken after a right answer.
pub const SAY_WELL_DONE: &str = "¡Muy bien!";
/// Spoken after a wrong answer. Also the fallback encouragement.
pub const SAY_TRY_AGAIN: &str = "Oh, no. Inténtalo de nuevo";
/// Spoken when the memory board is cleared.
pub const SAY_BOARD_COMPLETE: &str = "¡Excelente! Completaste el juego";
/// Spoken in place of the victory clip.
pub const SAY_VICTORY: &str = "¡Excelente!";
/// Spoken when a memory round starts.
pub const SAY_FIND_PAIRS: &str = "Encuentra los pares";

const VOICE_MISSES: &[&str] = &[
    "💛 Casi, inténtalo otra vez",
    "🤔 Muy cerca, escucha otra vez",
    "💪 Sigue intentando, tú puedes",
    "🌟 Casi lo tienes, otra vez",
];

const CHOICE_MISSES: &[&str] = &[
    "😅 Casi, pero no es esa",
    "🤔 Inténtalo otra vez",
    "💪 Sigue intentando",
    "🌟 Casi lo tienes, otra vez",
    "🎯 Muy cerca, pero no es esa",
];

const MEMORY_MISSES: &[&str] = &[
    "😅 No hacen par, inténtalo otra vez",
    "🤔 Casi, pero no es ese par",
    "💪 Sigue intentando",
];

const SYLLABLE_MISSES: &[&str] = &[
    "😅 Casi, pero no es ese orden",
    "🤔 Inténtalo otra vez",
    "💪 Sigue intentando",
    "🌟 Casi lo tienes, otra vez",
];

/// Which encouragement pool a miss draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissKind {
    /// Spoken practice in learn mode.
    Voice,
    /// Find-the-word and listen-and-choose.
    Choice,
    /// Memory pair mismatch.
    Memory,
    /// Wrong syllable order.
    Syllables,
}

/// Uniform pick of an encouragement message for a miss.
pub fn encouragement<R: Rng + ?Sized>(rng: &mut R, kind: MissKind) -> &'static str {
    let pool = match kind {
        MissKind::Voice => VOICE_MISSES,
        MissKind::Choice => CHOICE_MISSES,
        MissKind::Memory => MEMORY_MISSES,
        MissKind::Syllables => SYLLABLE_MISSES,
    };
    pick(rng, pool).copied().unwrap_or(SAY_TRY_AGAIN)
}

/// On-screen instruction for a round.
pub fn instruction(round: &Round) -> String {
    match round {
        Round::FindWord(choice) => format!("🧩 ¿Dónde está {}?", choice.target().word),
        Round::ListenChoose(_) => "👂 Escucha y toca la imagen correcta".to_string(),
        Round::Memory(_) => "🧠 Encuentra los pares de cartas".to_string(),
        Round::SyllableOrder(syllables) => {
            format!("🔤 Ordena las sílabas de {}", syllables.target().word)
        }
        Round::Spelling(_) => "✍️ Completa la palabra".to_string(),
        Round::Classification(_) => "📂 ¿A qué grupo pertenece?".to_string(),
    }
}

/// Sentence spoken when a round starts, if any is spoken right away.
pub fn spoken_instruction(round: &Round) -> Option<String> {
    match round {
        Round::FindWord(choice) => Some(format!("¿Dónde está {}?", choice.target().word)),
        Round::ListenChoose(_) => None,
        Round::Memory(_) => Some(SAY_FIND_PAIRS.to_string()),
        Round::SyllableOrder(syllables) => Some(format!(
            "Ordena las sílabas de {}",
            syllables.target().word
        )),
        Round::Spelling(spelling) => {
            Some(format!("Completa la palabra {}", spelling.target().word))
        }
        Round::Classification(classification) => Some(format!(
            "¿A qué grupo pertenece {}?",
            classification.target().word
        )),
    }
}

/// Delayed prompt of listen-and-choose.
pub fn listen_prompt(word: &str) -> String {
    format!("Toca... {word}")
}

/// Success toast after classifying into `label`.
pub fn classified(label: &str) -> String {
    format!("¡Correcto! Es {label}")
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn encouragement_comes_from_matching_pool() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert!(MEMORY_MISSES.contains(&encouragement(&mut rng, MissKind::Memory)));
            assert!(VOICE_MISSES.contains(&encouragement(&mut rng, MissKind::Voice)));
        }
    }

    #[test]
    fn listen_prompt_names_the_word() {
        assert_eq!(listen_prompt("GATO"), "Toca... GATO");
        assert_eq!(classified("Frutas"), "¡Correcto! Es Frutas");
    }
}
